//! Regime-specific reasoning strategies (C5) and their dispatcher.

mod high;
mod low;
mod medium;

use serde::{Deserialize, Serialize};

use crate::backend::{Backend, BackendParams};
use crate::complexity::ComplexityRegime;
use crate::config::{ConcurrencyConfig, RetryConfig};
use crate::error::OrchestratorError;

/// Uniform output of any reasoning strategy, regardless of regime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningResult {
    pub solution: String,
    pub error: Option<String>,
    pub complexity_regime: ComplexityRegime,
    pub reasoning_approach: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decomposition: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_solutions: Option<Vec<SubSolution>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubSolution {
    pub sub_problem: String,
    pub solution: String,
    pub error: Option<String>,
}

impl ReasoningResult {
    fn error(regime: ComplexityRegime, approach: &str, message: impl Into<String>) -> Self {
        Self {
            solution: String::new(),
            error: Some(message.into()),
            complexity_regime: regime,
            reasoning_approach: approach.to_string(),
            decomposition: None,
            sub_solutions: None,
        }
    }
}

/// Dispatches to the strategy matching `regime` (§4.4 reasoner).
#[allow(clippy::too_many_arguments)]
pub async fn execute_reasoning(
    backend: &(dyn Backend + Send + Sync),
    prompt: &str,
    system_prompt: &str,
    base_params: &BackendParams,
    regime: ComplexityRegime,
    retry: &RetryConfig,
    concurrency: &ConcurrencyConfig,
) -> ReasoningResult {
    match regime {
        ComplexityRegime::Low => low::execute(backend, prompt, system_prompt, base_params, retry).await,
        ComplexityRegime::Medium => {
            medium::execute(backend, prompt, system_prompt, base_params, retry).await
        }
        ComplexityRegime::High => {
            high::execute(backend, prompt, system_prompt, base_params, retry, concurrency).await
        }
    }
}

pub(crate) fn backend_failure(
    regime: ComplexityRegime,
    approach: &str,
    err: OrchestratorError,
) -> ReasoningResult {
    ReasoningResult::error(regime, approach, err.to_string())
}
