//! Error types for delaywatch.
//!
//! Library modules return [`DelayError`]; the binary wraps it with `anyhow`.

use std::path::PathBuf;

/// Top-level error type for poll cycle operations.
#[derive(Debug, thiserror::Error)]
pub enum DelayError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Subscription list could not be read or decoded.
    #[error("subscriptions error at {path:?}: {message}")]
    Subscriptions { path: PathBuf, message: String },

    /// Messaging provider rejected or failed a send.
    #[error("notify error: {0}")]
    Notify(String),
}

pub type Result<T> = std::result::Result<T, DelayError>;

impl DelayError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn subscriptions(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Subscriptions {
            path: path.into(),
            message: msg.into(),
        }
    }
}
