// src/audit/coordinator.rs

//! Audit job coordinator.
//!
//! Client-side state machine for a fire-and-forget remote audit. All state
//! lives in the settings store so any later process (or HTTP request) can
//! resume tracking: the remote service holds no authority over what the
//! operator sees between polls.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::audit::remote::{AuditApi, StartReply};
use crate::audit::report;
use crate::error::{AppError, Result};
use crate::hooks::AuditObserver;
use crate::models::{AuditJob, AuditResult, AuditTrigger, JobState};
use crate::store::{self, SettingsStore};

const JOB_KEY: &str = "audit/job";

/// Outcome of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new remote run was queued
    Started,

    /// A run is already tracked as in progress; starting again is a no-op
    AlreadyRunning,
}

/// Read-only view of the tracked job.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub state: JobState,
    pub progress_percent: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub result: Option<AuditResult>,
}

impl From<AuditJob> for JobSnapshot {
    fn from(job: AuditJob) -> Self {
        Self {
            state: job.state(),
            progress_percent: job.progress_percent,
            started_at: job.started_at,
            last_run_at: job.last_run_at,
            result: job.result,
        }
    }
}

/// Tracks the lifecycle of the remotely executed audit.
pub struct AuditCoordinator {
    store: Arc<dyn SettingsStore>,
    api: Arc<dyn AuditApi>,
    observers: Vec<Arc<dyn AuditObserver>>,
    stale_after_secs: u64,
}

impl AuditCoordinator {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        api: Arc<dyn AuditApi>,
        stale_after_secs: u64,
    ) -> Self {
        Self {
            store,
            api,
            observers: Vec::new(),
            stale_after_secs,
        }
    }

    /// Register an observer. Observers run in registration order.
    pub fn add_observer(&mut self, observer: Arc<dyn AuditObserver>) {
        self.observers.push(observer);
    }

    async fn load_job(&self) -> Result<AuditJob> {
        Ok(store::read_json(self.store.as_ref(), JOB_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn save_job(&self, job: &AuditJob) -> Result<()> {
        store::write_json(self.store.as_ref(), JOB_KEY, job).await
    }

    /// Current state without touching the remote service.
    pub async fn status(&self) -> Result<JobSnapshot> {
        Ok(self.load_job().await?.into())
    }

    /// Start a new audit run.
    ///
    /// Idempotent while a run is in progress. Rejected with a cooldown error
    /// while the cooldown window is open, leaving persisted state unchanged.
    pub async fn start(&self) -> Result<StartOutcome> {
        let job = self.load_job().await?;
        if job.in_progress {
            return Ok(StartOutcome::AlreadyRunning);
        }

        let now = Utc::now();
        if let Some(remaining) = job.cooldown_remaining(now) {
            return Err(AppError::cooldown(remaining));
        }

        // Re-read the persisted flag right before the remote call; two
        // racing starts can still interleave in the narrow window between
        // this check and the save, which the contract accepts.
        let mut job = self.load_job().await?;
        if job.in_progress {
            return Ok(StartOutcome::AlreadyRunning);
        }

        match self.api.start().await? {
            StartReply::Cooldown { retry_after_secs } => {
                job.cooldown_secs = retry_after_secs;
                job.last_run_at = Some(now);
                self.save_job(&job).await?;
                Err(AppError::cooldown(retry_after_secs))
            }
            StartReply::Queued => {
                job.result = None;
                job.started = true;
                job.in_progress = true;
                job.progress_percent = 0;
                job.started_at = Some(now);
                self.save_job(&job).await?;
                log::info!("Audit queued remotely");
                Ok(StartOutcome::Started)
            }
        }
    }

    /// Check on the running audit.
    ///
    /// Always triggered by an external request (page load, scheduled check,
    /// CLI call); nothing ever blocks waiting on the remote job inline.
    /// Transient remote failures leave the tracked state untouched and are
    /// retried on the next natural poll.
    pub async fn poll(&self) -> Result<JobSnapshot> {
        let mut job = self.load_job().await?;
        if !job.in_progress {
            return Ok(job.into());
        }

        let now = Utc::now();
        if job.is_stale(now, self.stale_after_secs) {
            log::warn!(
                "Audit exceeded the staleness window of {}s; forcing completion",
                self.stale_after_secs
            );
            let result = report::timeout_result(
                job.started_at,
                now,
                job.progress_percent,
                self.stale_after_secs,
            );
            return self.finish(job, result, AuditTrigger::Timeout, now).await;
        }

        match self.api.status().await {
            Ok(progress) if progress.complete => self.complete_from_remote(job, now).await,
            Ok(progress) => {
                job.progress_percent = progress.progress_percent.min(100);
                self.save_job(&job).await?;
                Ok(job.into())
            }
            Err(AppError::ApiHandled { status, message }) => {
                // The service dealt with it on its side; stop tracking but
                // keep whatever result the previous run produced.
                job.in_progress = false;
                self.save_job(&job).await?;
                Err(AppError::ApiHandled { status, message })
            }
            Err(e) => {
                log::warn!("Audit status check failed, will retry: {}", e);
                Ok(job.into())
            }
        }
    }

    /// Clear local tracking without notifying the remote side.
    pub async fn stop(&self) -> Result<JobSnapshot> {
        let mut job = self.load_job().await?;
        job.started = false;
        job.in_progress = false;
        job.progress_percent = 0;
        job.started_at = None;
        self.save_job(&job).await?;
        log::info!("Audit tracking stopped locally");
        Ok(job.into())
    }

    async fn complete_from_remote(&self, job: AuditJob, now: DateTime<Utc>) -> Result<JobSnapshot> {
        let issues = match self.api.result().await {
            Ok(issues) => issues,
            Err(AppError::ApiHandled { status, message }) => {
                let mut job = job;
                job.in_progress = false;
                self.save_job(&job).await?;
                return Err(AppError::ApiHandled { status, message });
            }
            Err(e) => {
                log::warn!("Audit result fetch failed, will retry: {}", e);
                return Ok(job.into());
            }
        };

        let result = report::completed_result(issues, job.started_at, now);
        let snapshot = self.finish(job, result, AuditTrigger::Remote, now).await?;

        // Email dispatch happens remotely; asking for it is best-effort.
        if let Err(e) = self.api.request_emails().await {
            log::warn!("Report email request failed: {}", e);
        }

        Ok(snapshot)
    }

    async fn finish(
        &self,
        mut job: AuditJob,
        result: AuditResult,
        trigger: AuditTrigger,
        now: DateTime<Utc>,
    ) -> Result<JobSnapshot> {
        job.in_progress = false;
        job.progress_percent = result.progress_percent;
        job.last_run_at = Some(now);
        job.result = Some(result.clone());
        self.save_job(&job).await?;

        log::info!(
            "Audit finished ({:?}) with {} issues",
            trigger,
            result.issue_count()
        );
        for observer in &self.observers {
            observer.audit_done(&result, trigger).await;
        }

        Ok(job.into())
    }
}
