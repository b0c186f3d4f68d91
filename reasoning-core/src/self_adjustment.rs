//! The self-adjustment loop (C6): run a strategy, judge it, escalate at most once.

use regex::Regex;

use crate::backend::{call_with_retry, Backend, BackendParams};
use crate::complexity::ComplexityRegime;
use crate::config::{ConcurrencyConfig, RetryConfig};
use crate::envelope::AdjustmentRecord;
use crate::strategies::{execute_reasoning, ReasoningResult};

const MAX_ADJUSTMENT_ATTEMPTS: u32 = 2;

pub struct SelfAdjustmentOutcome {
    pub result: ReasoningResult,
    pub initial_regime: ComplexityRegime,
    pub final_regime: ComplexityRegime,
    pub adjustments: Vec<AdjustmentRecord>,
}

enum Evaluation {
    Sufficient,
    Insufficient {
        reason: String,
        next_regime: Option<ComplexityRegime>,
    },
}

#[allow(clippy::too_many_arguments)]
pub async fn run_reasoning_loop(
    backend: &(dyn Backend + Send + Sync),
    prompt: &str,
    system_prompt: &str,
    base_params: &BackendParams,
    initial_regime: ComplexityRegime,
    enable_adjustment: bool,
    retry: &RetryConfig,
    concurrency: &ConcurrencyConfig,
) -> SelfAdjustmentOutcome {
    let mut current_regime = initial_regime;
    let mut current_prompt = prompt.to_string();
    let mut adjustments = Vec::new();
    let mut last_result: Option<ReasoningResult> = None;

    for attempt in 0..MAX_ADJUSTMENT_ATTEMPTS {
        let result = execute_reasoning(
            backend,
            &current_prompt,
            system_prompt,
            base_params,
            current_regime,
            retry,
            concurrency,
        )
        .await;

        if result.error.is_some() {
            return SelfAdjustmentOutcome {
                result,
                initial_regime,
                final_regime: current_regime,
                adjustments,
            };
        }

        let is_last_attempt = attempt + 1 >= MAX_ADJUSTMENT_ATTEMPTS;
        if !enable_adjustment || is_last_attempt {
            last_result = Some(result);
            break;
        }

        match evaluate(
            backend,
            &current_prompt,
            &result.solution,
            current_regime,
            system_prompt,
            base_params,
            retry,
        )
        .await
        {
            Evaluation::Sufficient => {
                last_result = Some(result);
                break;
            }
            Evaluation::Insufficient { reason, next_regime } => {
                let escalate_to = next_regime.filter(|r| *r > current_regime);
                match escalate_to {
                    Some(next) => {
                        adjustments.push(AdjustmentRecord {
                            from_regime: current_regime.to_string(),
                            to_regime: next.to_string(),
                            reason: reason.clone(),
                        });
                        current_prompt = format!(
                            "{prompt}\n\n(Revisit this with more care: {reason})",
                            prompt = prompt
                        );
                        current_regime = next;
                        last_result = Some(result);
                    }
                    None => {
                        last_result = Some(result);
                        break;
                    }
                }
            }
        }
    }

    SelfAdjustmentOutcome {
        result: last_result.expect("loop always runs at least once"),
        initial_regime,
        final_regime: current_regime,
        adjustments,
    }
}

async fn evaluate(
    backend: &(dyn Backend + Send + Sync),
    prompt: &str,
    solution: &str,
    current_regime: ComplexityRegime,
    system_prompt: &str,
    base_params: &BackendParams,
    retry: &RetryConfig,
) -> Evaluation {
    if solution.trim().is_empty() {
        return Evaluation::Insufficient {
            reason: "solution was empty".to_string(),
            next_regime: None,
        };
    }

    if current_regime == ComplexityRegime::Low {
        let probe = format!(
            "Is the following question trivial, answerable correctly with no multi-step \
             reasoning? Answer only yes or no.\n\nQuestion: {prompt}"
        );
        if let Ok(response) = call_with_retry(backend, &probe, system_prompt, base_params, retry).await {
            let answer = response.text.trim().to_lowercase();
            if answer.starts_with("yes") && solution.len() < 200 {
                return Evaluation::Sufficient;
            }
        }
    }

    let evaluator_prompt = format!(
        "Judge whether the following solution fully and sufficiently answers its problem. \
         If it is sufficient, respond with exactly: sufficient\n\
         If it is not, respond with exactly: insufficient: <reason>, next_regime: <low|medium|high>\n\n\
         Solution:\n{solution}"
    );

    let response = match call_with_retry(backend, &evaluator_prompt, system_prompt, base_params, retry).await {
        Ok(r) => r,
        Err(_) => return Evaluation::Sufficient,
    };

    parse_evaluation(&response.text)
}

fn parse_evaluation(text: &str) -> Evaluation {
    let lower = text.to_lowercase();
    if lower.trim().starts_with("sufficient") && !lower.contains("insufficient") {
        return Evaluation::Sufficient;
    }

    let reason_re = Regex::new(r":\s*([^,]+)").unwrap();
    let regime_re = Regex::new(r"next_regime:\s*(\w+)").unwrap();

    let reason = reason_re
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| "no reason given".to_string());

    let next_regime = regime_re
        .captures(&lower)
        .and_then(|c| c[1].parse::<ComplexityRegime>().ok());

    Evaluation::Insufficient { reason, next_regime }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendResponse, MockBackend};

    #[tokio::test]
    async fn stops_immediately_on_backend_error() {
        let backend = MockBackend::scripted(vec![Err(crate::error::OrchestratorError::PermanentBackend("x".into()))]);
        let outcome = run_reasoning_loop(
            &backend,
            "p",
            "",
            &BackendParams::default(),
            ComplexityRegime::Low,
            true,
            &RetryConfig::default(),
            &ConcurrencyConfig::default(),
        )
        .await;
        assert!(outcome.result.error.is_some());
        assert!(outcome.adjustments.is_empty());
    }

    #[tokio::test]
    async fn disabled_adjustment_skips_evaluation_entirely() {
        let backend = MockBackend::scripted(vec![Ok(BackendResponse::ok("a direct answer"))]);
        let outcome = run_reasoning_loop(
            &backend,
            "p",
            "",
            &BackendParams::default(),
            ComplexityRegime::Low,
            false,
            &RetryConfig::default(),
            &ConcurrencyConfig::default(),
        )
        .await;
        assert_eq!(outcome.final_regime, ComplexityRegime::Low);
        assert!(outcome.adjustments.is_empty());
    }

    #[tokio::test]
    async fn escalates_once_then_accepts() {
        let backend = MockBackend::scripted(vec![
            Ok(BackendResponse::ok("shallow answer")),
            // LOW's trivial-question probe: "no" falls through to the generic evaluator.
            Ok(BackendResponse::ok("no")),
            Ok(BackendResponse::ok(
                "insufficient: missing depth, next_regime: medium",
            )),
            Ok(BackendResponse::ok("a deeper, structured answer")),
        ]);
        let outcome = run_reasoning_loop(
            &backend,
            "p",
            "",
            &BackendParams::default(),
            ComplexityRegime::Low,
            true,
            &RetryConfig::default(),
            &ConcurrencyConfig::default(),
        )
        .await;
        assert_eq!(outcome.initial_regime, ComplexityRegime::Low);
        assert_eq!(outcome.final_regime, ComplexityRegime::Medium);
        assert_eq!(outcome.adjustments.len(), 1);
        assert_eq!(outcome.adjustments[0].to_regime, "medium");
    }

    #[test]
    fn parses_insufficient_with_next_regime() {
        let eval = parse_evaluation("insufficient: too shallow, next_regime: medium");
        match eval {
            Evaluation::Insufficient { reason, next_regime } => {
                assert_eq!(reason, "too shallow");
                assert_eq!(next_regime, Some(ComplexityRegime::Medium));
            }
            _ => panic!("expected insufficient"),
        }
    }

    #[test]
    fn parses_sufficient() {
        assert!(matches!(parse_evaluation("sufficient"), Evaluation::Sufficient));
    }
}
