//! MEDIUM regime: a single call carrying an explicit 5-step structure (§4.4.2).

use super::{backend_failure, ReasoningResult};
use crate::backend::{call_with_retry, Backend, BackendParams};
use crate::complexity::ComplexityRegime;
use crate::config::RetryConfig;
use crate::error::OrchestratorError;

const APPROACH: &str = "structured_progressive";

pub async fn execute(
    backend: &(dyn Backend + Send + Sync),
    prompt: &str,
    system_prompt: &str,
    base_params: &BackendParams,
    retry: &RetryConfig,
) -> ReasoningResult {
    let structured_prompt = format!(
        "Work through this problem in five explicit stages, verifying each before moving on:\n\
         1. Identify the core elements of the problem.\n\
         2. Gather the relevant background needed to address them.\n\
         3. Build a step-by-step strategy.\n\
         4. Execute each step of that strategy.\n\
         5. Integrate the results into one final answer.\n\n\
         Problem: {prompt}"
    );

    match call_with_retry(backend, &structured_prompt, system_prompt, base_params, retry).await {
        Ok(response) if response.is_error() => backend_failure(
            ComplexityRegime::Medium,
            APPROACH,
            OrchestratorError::Backend(response.error.unwrap_or_default()),
        ),
        Ok(response) => ReasoningResult {
            solution: response.text,
            error: None,
            complexity_regime: ComplexityRegime::Medium,
            reasoning_approach: APPROACH.to_string(),
            decomposition: None,
            sub_solutions: None,
        },
        Err(e) => backend_failure(ComplexityRegime::Medium, APPROACH, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendResponse, MockBackend};

    #[tokio::test]
    async fn returns_staged_solution() {
        let backend = MockBackend::scripted(vec![Ok(BackendResponse::ok("staged answer"))]);
        let result = execute(&backend, "plan a trip", "", &BackendParams::default(), &RetryConfig::default()).await;
        assert_eq!(result.solution, "staged answer");
        assert_eq!(result.reasoning_approach, "structured_progressive");
    }
}
