//! Error types for telemetry and benchmark operations

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Telemetry Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid frame sample: duration must be positive (got {duration_nanos}ns)")]
    InvalidSample { duration_nanos: u64 },

    // ─────────────────────────────────────────────────────────────
    // Benchmark Errors
    // ─────────────────────────────────────────────────────────────
    #[error("A benchmark is already running; start request ignored")]
    ConcurrentStartRejected,

    #[error("Benchmark collaborator unavailable: {what}")]
    SourceUnavailable { what: String },

    #[error("Benchmark task failed: {message}")]
    TaskJoin { message: String },

    // ─────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Result store error: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn source_unavailable(what: impl Into<String>) -> Self {
        Self::SourceUnavailable { what: what.into() }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn task_join(message: impl Into<String>) -> Self {
        Self::TaskJoin {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidSample { .. }
                | Error::ConcurrentStartRejected
                | Error::SourceUnavailable { .. }
                | Error::Store { .. }
                | Error::ChannelClosed
        )
    }

    /// Check if this error should trigger application exit
    ///
    /// Nothing in the telemetry core is fatal; only a broken task runtime is.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::TaskJoin { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }
}
