// src/error.rs

//! Unified error handling for the content map and audit subsystems.

use thiserror::Error;

use crate::utils::time::humanize_secs;

/// Result type alias for sitemapper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Settings store error
    #[error("Store error: {0}")]
    Store(String),

    /// Transient failure talking to the remote audit service
    #[error("Remote error during {context}: {message}")]
    Remote { context: String, message: String },

    /// Error the remote audit service handled and reported itself
    #[error("Audit service error ({status}): {message}")]
    ApiHandled { status: u16, message: String },

    /// An audit cannot start until the cooldown elapses
    #[error("{message}")]
    Cooldown { remaining_secs: u64, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a settings store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a transient remote error with context.
    pub fn remote(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Remote {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an API-side handled error.
    pub fn api_handled(status: u16, message: impl Into<String>) -> Self {
        Self::ApiHandled {
            status,
            message: message.into(),
        }
    }

    /// Create a cooldown rejection with a humanized remaining time.
    pub fn cooldown(remaining_secs: u64) -> Self {
        Self::Cooldown {
            remaining_secs,
            message: format!(
                "An audit was run recently. Please wait {} before starting another one.",
                humanize_secs(remaining_secs)
            ),
        }
    }
}
