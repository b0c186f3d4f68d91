//! LOW regime: a single, efficiency-biased call (§4.4.1).

use super::{backend_failure, ReasoningResult};
use crate::backend::{call_with_retry, Backend, BackendParams};
use crate::complexity::ComplexityRegime;
use crate::config::RetryConfig;

const APPROACH: &str = "efficient_direct";

pub async fn execute(
    backend: &(dyn Backend + Send + Sync),
    prompt: &str,
    system_prompt: &str,
    base_params: &BackendParams,
    retry: &RetryConfig,
) -> ReasoningResult {
    let efficient_prompt = format!(
        "Answer directly and concisely. Do not over-analyze a simple question: \
         the first reasonable answer is usually correct.\n\nQuestion: {prompt}"
    );

    match call_with_retry(backend, &efficient_prompt, system_prompt, base_params, retry).await {
        Ok(response) if response.is_error() => {
            backend_failure(ComplexityRegime::Low, APPROACH, crate::error::OrchestratorError::Backend(
                response.error.unwrap_or_default(),
            ))
        }
        Ok(response) => ReasoningResult {
            solution: response.text,
            error: None,
            complexity_regime: ComplexityRegime::Low,
            reasoning_approach: APPROACH.to_string(),
            decomposition: None,
            sub_solutions: None,
        },
        Err(e) => backend_failure(ComplexityRegime::Low, APPROACH, e),
    }
}
