//! HIGH regime: decompose, solve sub-problems in parallel, integrate (§4.4.3).

use regex::Regex;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::{backend_failure, medium, ReasoningResult, SubSolution};
use crate::backend::{call_with_retry, Backend, BackendParams};
use crate::complexity::ComplexityRegime;
use crate::config::{ConcurrencyConfig, RetryConfig};
use crate::error::OrchestratorError;

const APPROACH: &str = "decomposition_parallel_solve_integration";

pub async fn execute(
    backend: &(dyn Backend + Send + Sync),
    prompt: &str,
    system_prompt: &str,
    base_params: &BackendParams,
    retry: &RetryConfig,
    concurrency: &ConcurrencyConfig,
) -> ReasoningResult {
    let sub_problems = match decompose(backend, prompt, system_prompt, base_params, retry).await {
        Ok(sub_problems) => sub_problems,
        Err(e) => return backend_failure(ComplexityRegime::High, APPROACH, e),
    };

    if sub_problems.is_empty() {
        // Falls back to the medium strategy but relabels the outcome as the
        // high-regime approach that chose to degrade, mirroring the source fallback.
        let mut fallback = medium::execute(backend, prompt, system_prompt, base_params, retry).await;
        fallback.complexity_regime = ComplexityRegime::High;
        return fallback;
    }

    let sub_solutions =
        solve_decomposed(backend, &sub_problems, prompt, system_prompt, base_params, retry, concurrency).await;

    let valid: Vec<&SubSolution> = sub_solutions.iter().filter(|s| s.error.is_none()).collect();
    if valid.is_empty() {
        return backend_failure(
            ComplexityRegime::High,
            APPROACH,
            OrchestratorError::Strategy("no sub-problem could be solved".into()),
        );
    }

    match integrate(backend, &valid, system_prompt, base_params, retry).await {
        Ok(solution) => ReasoningResult {
            solution,
            error: None,
            complexity_regime: ComplexityRegime::High,
            reasoning_approach: APPROACH.to_string(),
            decomposition: Some(sub_problems),
            sub_solutions: Some(sub_solutions),
        },
        Err(e) => backend_failure(ComplexityRegime::High, APPROACH, e),
    }
}

async fn decompose(
    backend: &(dyn Backend + Send + Sync),
    prompt: &str,
    system_prompt: &str,
    base_params: &BackendParams,
    retry: &RetryConfig,
) -> Result<Vec<String>, OrchestratorError> {
    let decompose_prompt = format!(
        "Decompose the following complex problem into a small number of independent \
         sub-problems. Output a JSON object of the form {{\"sub_problems\": [\"...\"]}}.\n\n\
         Problem: {prompt}"
    );

    let response = call_with_retry(backend, &decompose_prompt, system_prompt, base_params, retry).await?;
    if response.is_error() {
        return Err(OrchestratorError::Backend(response.error.unwrap_or_default()));
    }
    Ok(extract_sub_problems(&response.text))
}

/// Accepts a bare JSON array, a `{"sub_problems": [...]}` object, or falls back to
/// parsing bulleted/numbered lines. Returns an empty vec rather than erroring.
fn extract_sub_problems(text: &str) -> Vec<String> {
    if let Some(array) = try_parse_json_array(text) {
        return array;
    }
    parse_bulleted_list(text)
}

fn try_parse_json_array(text: &str) -> Option<Vec<String>> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        if let Some(list) = value_to_list(&value) {
            return Some(list);
        }
    }

    let object_re = Regex::new(r"(?s)\{.*\}").unwrap();
    if let Some(m) = object_re.find(text) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(m.as_str()) {
            if let Some(list) = value_to_list(&value) {
                return Some(list);
            }
        }
    }

    let array_re = Regex::new(r"(?s)\[.*\]").unwrap();
    if let Some(m) = array_re.find(text) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(m.as_str()) {
            if let Some(list) = value_to_list(&value) {
                return Some(list);
            }
        }
    }

    None
}

fn value_to_list(value: &serde_json::Value) -> Option<Vec<String>> {
    let array = if let Some(array) = value.as_array() {
        array
    } else {
        value.get("sub_problems")?.as_array()?
    };
    Some(
        array
            .iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
    )
}

fn parse_bulleted_list(text: &str) -> Vec<String> {
    let bullet_re = Regex::new(r"^\s*(?:[-*]|\d+\.)\s+(.+)$").unwrap();
    text.lines()
        .filter_map(|line| bullet_re.captures(line).map(|c| c[1].trim().to_string()))
        .filter(|s| !s.is_empty())
        .collect()
}

async fn solve_decomposed(
    backend: &(dyn Backend + Send + Sync),
    sub_problems: &[String],
    original_prompt: &str,
    system_prompt: &str,
    base_params: &BackendParams,
    retry: &RetryConfig,
    concurrency: &ConcurrencyConfig,
) -> Vec<SubSolution> {
    let semaphore = Arc::new(Semaphore::new(concurrency.high_strategy_subproblems));

    let futures = sub_problems.iter().map(|sub_problem| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            let sub_prompt = format!(
                "Original problem (for context): {original_prompt}\n\n\
                 Solve only this sub-problem: {sub_problem}"
            );
            match call_with_retry(backend, &sub_prompt, system_prompt, base_params, retry).await {
                Ok(response) if response.is_error() => SubSolution {
                    sub_problem: sub_problem.clone(),
                    solution: String::new(),
                    error: response.error,
                },
                Ok(response) => SubSolution {
                    sub_problem: sub_problem.clone(),
                    solution: response.text,
                    error: None,
                },
                Err(e) => SubSolution {
                    sub_problem: sub_problem.clone(),
                    solution: String::new(),
                    error: Some(e.to_string()),
                },
            }
        }
    });

    futures::future::join_all(futures).await
}

/// Folds each valid sub-solution into a running integrated result, then polishes once.
async fn integrate(
    backend: &(dyn Backend + Send + Sync),
    valid: &[&SubSolution],
    system_prompt: &str,
    base_params: &BackendParams,
    retry: &RetryConfig,
) -> Result<String, OrchestratorError> {
    let mut integrated = valid[0].solution.clone();

    for sub in &valid[1..] {
        let merge_prompt = format!(
            "Previous Integrated Result:\n{integrated}\n\n\
             New Information:\n{}\n\n\
             Integrate the New Information into the Previous Integrated Result, \
             producing one coherent result.",
            sub.solution
        );
        let response = call_with_retry(backend, &merge_prompt, system_prompt, base_params, retry).await?;
        if response.is_error() {
            return Err(OrchestratorError::Backend(response.error.unwrap_or_default()));
        }
        integrated = response.text;
    }

    let polish_prompt = format!(
        "Polish the following into a single well-formed final answer, removing any \
         seams from its having been assembled from parts:\n\n{integrated}"
    );
    let response = call_with_retry(backend, &polish_prompt, system_prompt, base_params, retry).await?;
    if response.is_error() {
        return Err(OrchestratorError::Backend(response.error.unwrap_or_default()));
    }
    Ok(response.text)
}
