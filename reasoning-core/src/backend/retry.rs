//! Exponential-backoff retry wrapper around any [`Backend`] call.

use tracing::warn;

use super::{Backend, BackendParams, BackendResponse};
use crate::config::RetryConfig;
use crate::error::OrchestratorError;

/// Marker trait so call sites read `call_with_retry(&backend, ...)` rather than
/// threading the retry config through every `Backend` impl.
pub trait RetryableBackend: Backend {}
impl<T: Backend + ?Sized> RetryableBackend for T {}

/// Runs `backend.call(...)`, retrying on transient/rate-limit failures per `retry`.
/// Preserves the *last* error; if every attempt fails, propagates it.
pub async fn call_with_retry(
    backend: &(dyn Backend + Send + Sync),
    prompt: &str,
    system_prompt: &str,
    params: &BackendParams,
    retry: &RetryConfig,
) -> Result<BackendResponse, OrchestratorError> {
    let mut last_err = None;

    for attempt in 0..retry.max_attempts {
        match backend.call(prompt, system_prompt, params).await {
            Ok(response) => return Ok(response),
            Err(err) => {
                let retriable = err.is_retriable();
                if !retriable || attempt + 1 >= retry.max_attempts {
                    return Err(err);
                }
                let wait = retry.wait_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts = retry.max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    backend = backend.name(),
                    "retrying backend call after transient failure"
                );
                tokio::time::sleep(wait).await;
                last_err = Some(err);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| OrchestratorError::Backend("retry loop exhausted".into())))
}
