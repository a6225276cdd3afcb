//! sitemapper CLI
//!
//! Local entry point for serving the content map, pre-building partitions,
//! and driving the remote site audit.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sha2::{Digest, Sha256};
use sitemapper::{
    audit::{AuditCoordinator, HttpAuditClient, IgnoreRegistry, report},
    content::StaticRepository,
    error::{AppError, Result},
    hooks::CacheInvalidator,
    map::{MapCache, MapEngine, MapOutcome, MapQuery},
    models::{Config, JobState},
    sources,
    store::{LocalStore, SettingsStore},
};

/// sitemapper - Content map generator and audit coordinator
#[derive(Parser, Debug)]
#[command(
    name = "sitemapper",
    version,
    about = "Generates content maps and coordinates remote site audits"
)]
struct Cli {
    /// Path to storage directory containing config and state
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the content map over HTTP
    #[cfg(feature = "serve")]
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
    },

    /// Render every partition to files
    Build {
        /// Output directory (default: {storage_dir}/maps)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Drop cached partitions and regenerate from scratch
        #[arg(long)]
        force: bool,
    },

    /// Drive the remote site audit
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },

    /// Manage suppressed audit issues
    Ignore {
        #[command(subcommand)]
        action: IgnoreAction,
    },

    /// Validate configuration files
    Validate,

    /// Show current state info
    Info,
}

#[derive(Subcommand, Debug)]
enum AuditAction {
    /// Queue a new audit run
    Start,
    /// Poll the running audit and show its state
    Status,
    /// Clear local tracking without notifying the service
    Stop,
}

#[derive(Subcommand, Debug)]
enum IgnoreAction {
    /// Suppress an issue id
    Add { id: String },
    /// Unsuppress an issue id
    Remove { id: String },
    /// List suppressed issue ids
    List,
    /// Drop all suppressions
    Clear,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

struct App {
    store: Arc<LocalStore>,
    cache: MapCache,
    engine: Arc<MapEngine>,
    coordinator: AuditCoordinator,
    ignores: IgnoreRegistry,
}

impl App {
    async fn assemble(config: &Config, storage_dir: &PathBuf) -> Result<Self> {
        let store = Arc::new(LocalStore::open(storage_dir.join("state")).await?);

        let content_path = storage_dir.join("content.json");
        let repo = if content_path.exists() {
            Arc::new(StaticRepository::load(&content_path)?)
        } else {
            log::warn!(
                "No content found at {}; the map will be empty",
                content_path.display()
            );
            Arc::new(StaticRepository::default())
        };

        let cache = MapCache::new(Arc::clone(&store) as Arc<dyn SettingsStore>);
        let source_list = sources::assemble(config, repo)?;
        let engine = Arc::new(MapEngine::new(config, source_list, cache.clone())?);

        let api = Arc::new(HttpAuditClient::new(&config.remote)?);
        let mut coordinator = AuditCoordinator::new(
            Arc::clone(&store) as Arc<dyn SettingsStore>,
            Arc::clone(&api) as Arc<dyn sitemapper::audit::AuditApi>,
            config.audit.stale_after_secs,
        );
        coordinator.add_observer(Arc::new(CacheInvalidator::new(cache.clone())));

        let ignores = IgnoreRegistry::new(Arc::clone(&store) as Arc<dyn SettingsStore>, api);

        Ok(Self {
            store,
            cache,
            engine,
            coordinator,
            ignores,
        })
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        config.validate()?;
        log::info!("✓ Config OK");
        return Ok(());
    }

    let app = App::assemble(&config, &cli.storage_dir).await?;

    match cli.command {
        Command::Validate => unreachable!("handled above"),

        #[cfg(feature = "serve")]
        Command::Serve { addr } => {
            sitemapper::serve::serve(app.engine, &addr).await?;
        }

        Command::Build { out_dir, force } => {
            let out_dir = out_dir.unwrap_or_else(|| cli.storage_dir.join("maps"));
            std::fs::create_dir_all(&out_dir)?;

            if force {
                app.cache.invalidate_all().await?;
            }

            let write = |name: String, outcome: MapOutcome| -> Result<bool> {
                match outcome {
                    MapOutcome::Document { body, .. } => {
                        std::fs::write(out_dir.join(&name), body)?;
                        log::info!("Wrote {}", name);
                        Ok(true)
                    }
                    MapOutcome::NotFound => Ok(false),
                    MapOutcome::Redirect(location) => {
                        log::warn!(
                            "Native map generator at {} answers map requests; nothing to build",
                            location
                        );
                        Ok(false)
                    }
                }
            };

            let index = app.engine.handle(&MapQuery::index()).await?;
            if !write("sitemap-index.xml".to_string(), index)? {
                return Ok(());
            }

            for summary in app.engine.partitions().await? {
                for page in 1..=summary.pages {
                    let name = if page == 1 {
                        format!("sitemap-{}.xml", summary.kind)
                    } else {
                        format!("sitemap-{}-{}.xml", summary.kind, page)
                    };
                    let outcome = app
                        .engine
                        .handle(&MapQuery::partition(summary.kind.clone(), page))
                        .await?;
                    write(name, outcome)?;
                }
            }

            log::info!("Build complete!");
        }

        Command::Audit { action } => match action {
            AuditAction::Start => match app.coordinator.start().await {
                Ok(outcome) => log::info!("Audit start: {:?}", outcome),
                Err(e @ AppError::Cooldown { .. }) => {
                    log::error!("{}", e);
                    return Err(e);
                }
                Err(e) => return Err(e),
            },
            AuditAction::Status => {
                let snapshot = app.coordinator.poll().await?;
                log::info!("State: {:?}", snapshot.state);
                if snapshot.state == JobState::InProgress {
                    log::info!("Progress: {}%", snapshot.progress_percent);
                }
                if let Some(result) = &snapshot.result {
                    if let Some(message) = &result.message {
                        log::info!("{}", message);
                    }
                    for line in report::summary_lines(result) {
                        log::info!("{}", line);
                    }
                }
            }
            AuditAction::Stop => {
                app.coordinator.stop().await?;
                log::info!("Audit tracking cleared");
            }
        },

        Command::Ignore { action } => match action {
            IgnoreAction::Add { id } => {
                if app.ignores.set_ignore(&id).await? {
                    log::info!("Ignoring {}", id);
                } else {
                    log::error!("Invalid issue id: {:?}", id);
                }
            }
            IgnoreAction::Remove { id } => {
                if app.ignores.unset_ignore(&id).await? {
                    log::info!("No longer ignoring {}", id);
                } else {
                    log::error!("Invalid issue id: {:?}", id);
                }
            }
            IgnoreAction::List => {
                let ids = app.ignores.all().await?;
                if ids.is_empty() {
                    log::info!("No ignored issues");
                }
                for id in ids {
                    log::info!("{}", id);
                }
            }
            IgnoreAction::Clear => {
                app.ignores.clear().await?;
                log::info!("Ignore list cleared");
            }
        },

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());

            let snapshot = app.coordinator.status().await?;
            log::info!("Audit state: {:?}", snapshot.state);
            if let Some(last_run) = snapshot.last_run_at {
                log::info!("Last audit: {}", last_run);
            }

            let keys = app.cache.cached_keys().await?;
            if keys.is_empty() {
                log::info!("No cached partitions");
            }
            for key in keys {
                if let Some(body) = app.store.get(&key).await? {
                    let digest = hex::encode(Sha256::digest(&body));
                    log::info!("{} ({} bytes, sha256 {})", key, body.len(), &digest[..12]);
                }
            }
        }
    }

    Ok(())
}
