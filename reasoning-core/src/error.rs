//! Error taxonomy for the reasoning core.
//!
//! Every fallible internal operation returns `Result<T, OrchestratorError>`.
//! Only the dispatcher boundary (see `dispatcher`) converts an `Err` into
//! a `ResponseEnvelope` with `success = false`.

use thiserror::Error;

/// Whether a backend failure should be retried by the retry wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCategory {
    /// Network blip, 5xx, connection reset: retry.
    Transient,
    /// Rate limited: retry with backoff.
    RateLimit,
    /// 4xx other than 429, auth failure: do not retry.
    Permanent,
}

impl RetryCategory {
    pub fn is_retriable(&self) -> bool {
        matches!(self, RetryCategory::Transient | RetryCategory::RateLimit)
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("backend call failed: {0}")]
    Backend(String),

    #[error("backend rate limited: {0}")]
    RateLimit(String),

    #[error("backend returned a permanent error: {0}")]
    PermanentBackend(String),

    #[error("failed to parse model output as {expected}: {detail}")]
    Parse { expected: String, detail: String },

    #[error("strategy failed: {0}")]
    Strategy(String),

    #[error("pipeline produced no usable result: {0}")]
    Pipeline(String),

    #[error("store I/O error on {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OrchestratorError {
    pub fn retry_category(&self) -> Option<RetryCategory> {
        match self {
            OrchestratorError::Backend(_) => Some(RetryCategory::Transient),
            OrchestratorError::RateLimit(_) => Some(RetryCategory::RateLimit),
            OrchestratorError::PermanentBackend(_) => Some(RetryCategory::Permanent),
            _ => None,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.retry_category().is_some_and(|c| c.is_retriable())
    }
}
