//! Finalization (C7): record the learner outcome, optionally refine, assemble the envelope.

use crate::backend::{call_with_retry, Backend, BackendParams};
use crate::complexity::{ComplexityLearner, ComplexityRegime};
use crate::config::RetryConfig;
use crate::envelope::{ResponseEnvelope, ThoughtProcess, V2Improvements};
use crate::self_adjustment::SelfAdjustmentOutcome;
use crate::strategies::ReasoningResult;

/// `reasoning_approach` tags that let the overthinking/collapse-prevention flags
/// be derived from the strategy that actually ran, rather than threaded separately.
const EFFICIENT_DIRECT: &str = "efficient_direct";
const DECOMPOSITION_PARALLEL_SOLVE_INTEGRATION: &str = "decomposition_parallel_solve_integration";

#[allow(clippy::too_many_arguments)]
pub async fn finalize_and_learn(
    backend: &(dyn Backend + Send + Sync),
    learner: Option<&ComplexityLearner>,
    base_params: &BackendParams,
    original_prompt: &str,
    system_prompt: &str,
    complexity_score: f64,
    outcome: SelfAdjustmentOutcome,
    retry: &RetryConfig,
    rag_enabled: bool,
    rag_source: Option<String>,
    real_time_adjustment_active: bool,
    is_edge_optimized: bool,
    learned_suggestion_used: bool,
) -> ResponseEnvelope {
    let SelfAdjustmentOutcome {
        result,
        initial_regime,
        final_regime,
        adjustments,
    } = outcome;

    if let Some(err) = &result.error {
        return ResponseEnvelope::failure(err.clone());
    }

    if final_regime != initial_regime {
        if let Some(learner) = learner {
            learner.record(original_prompt, final_regime);
        }
    }

    let (final_solution, refined, refinement_reason) =
        refine_if_warranted(backend, &result, final_regime, system_prompt, base_params, retry).await;

    let mut thought_process = ThoughtProcess {
        initial_complexity_score: Some(complexity_score),
        initial_regime: Some(initial_regime.to_string()),
        final_regime: Some(final_regime.to_string()),
        reasoning_approach: Some(result.reasoning_approach.clone()),
        adjustments: if adjustments.is_empty() {
            None
        } else {
            Some(adjustments)
        },
        ..Default::default()
    };
    if let Some(decomposition) = &result.decomposition {
        thought_process.insert("decomposition", decomposition);
    }
    if let Some(sub_solutions) = &result.sub_solutions {
        thought_process.insert("sub_solutions", sub_solutions);
    }
    if refined {
        thought_process.insert("refined", true);
        if let Some(reason) = &refinement_reason {
            thought_process.insert("refinement_reason", reason);
        }
    }

    let v2_improvements = V2Improvements {
        regime: final_regime.to_string(),
        reasoning_approach: result.reasoning_approach.clone(),
        overthinking_prevention: (result.reasoning_approach == EFFICIENT_DIRECT).then_some(true),
        collapse_prevention: (result.reasoning_approach == DECOMPOSITION_PARALLEL_SOLVE_INTEGRATION)
            .then_some(true),
        rag_enabled,
        rag_source,
        real_time_adjustment_active,
        learned_suggestion_used,
        is_edge_optimized,
    };

    ResponseEnvelope::success(final_solution, thought_process).with_v2_improvements(v2_improvements)
}

/// LOW regime and empty solutions are never refined; everything else gets one
/// pass through the backend asking it to tighten or correct its own answer.
/// Returns the final text, whether it changed, and the reason when it did.
async fn refine_if_warranted(
    backend: &(dyn Backend + Send + Sync),
    result: &ReasoningResult,
    regime: ComplexityRegime,
    system_prompt: &str,
    base_params: &BackendParams,
    retry: &RetryConfig,
) -> (String, bool, Option<String>) {
    if regime == ComplexityRegime::Low || result.solution.trim().is_empty() {
        return (result.solution.clone(), false, None);
    }

    let refinement_prompt = format!(
        "Review the following solution once more. If it is already correct and complete, \
         return it unchanged. Otherwise, return a corrected version.\n\n{}",
        result.solution
    );

    match call_with_retry(backend, &refinement_prompt, system_prompt, base_params, retry).await {
        Ok(response) if !response.is_error() && !response.text.trim().is_empty() => {
            let refined = response.text != result.solution;
            let reason = if refined {
                Some("refinement pass altered the solution".to_string())
            } else {
                None
            };
            (response.text, refined, reason)
        }
        _ => (result.solution.clone(), false, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendResponse, MockBackend};
    use crate::config::ConcurrencyConfig;
    use crate::self_adjustment::run_reasoning_loop;

    async fn outcome_for(backend: &(dyn Backend + Send + Sync), regime: ComplexityRegime) -> SelfAdjustmentOutcome {
        run_reasoning_loop(
            backend,
            "p",
            "",
            &BackendParams::default(),
            regime,
            false,
            &RetryConfig::default(),
            &ConcurrencyConfig::default(),
        )
        .await
    }

    #[tokio::test]
    async fn low_regime_is_never_refined() {
        let backend = MockBackend::scripted(vec![Ok(BackendResponse::ok("42"))]);
        let outcome = outcome_for(&backend, ComplexityRegime::Low).await;
        let envelope = finalize_and_learn(
            &backend,
            None,
            &BackendParams::default(),
            "what is 6*7",
            "",
            10.0,
            outcome,
            &RetryConfig::default(),
            false,
            None,
            false,
            false,
            false,
        )
        .await;
        assert_eq!(envelope.final_solution, "42");
        assert!(!envelope.thought_process.extra.contains_key("refined"));

        let improvements = envelope.v2_improvements.unwrap();
        assert_eq!(improvements.regime, "low");
        assert_eq!(improvements.overthinking_prevention, Some(true));
        assert!(improvements.collapse_prevention.is_none());
    }

    #[tokio::test]
    async fn medium_regime_refinement_records_no_change_when_identical() {
        let backend = MockBackend::scripted(vec![
            Ok(BackendResponse::ok("a staged answer")),
            Ok(BackendResponse::ok("a staged answer")),
        ]);
        let outcome = outcome_for(&backend, ComplexityRegime::Medium).await;
        let envelope = finalize_and_learn(
            &backend,
            None,
            &BackendParams::default(),
            "p",
            "",
            50.0,
            outcome,
            &RetryConfig::default(),
            true,
            Some("[doc] context".to_string()),
            false,
            false,
            false,
        )
        .await;
        assert!(!envelope.thought_process.extra.contains_key("refined"));

        let improvements = envelope.v2_improvements.unwrap();
        assert_eq!(improvements.regime, "medium");
        assert!(improvements.rag_enabled);
        assert_eq!(improvements.rag_source.as_deref(), Some("[doc] context"));
    }

    #[tokio::test]
    async fn escalated_regime_is_recorded_to_learner() {
        let dir = tempfile::tempdir().unwrap();
        let learner = ComplexityLearner::new(dir.path().join("l.json"));
        let backend = MockBackend::scripted(vec![
            Ok(BackendResponse::ok("shallow")),
            Ok(BackendResponse::ok("no")),
            Ok(BackendResponse::ok("insufficient: weak, next_regime: medium")),
            Ok(BackendResponse::ok("better answer")),
            Ok(BackendResponse::ok("better answer")),
        ]);
        let outcome = run_reasoning_loop(
            &backend,
            "needs escalation",
            "",
            &BackendParams::default(),
            ComplexityRegime::Low,
            true,
            &RetryConfig::default(),
            &ConcurrencyConfig::default(),
        )
        .await;
        let _ = finalize_and_learn(
            &backend,
            Some(&learner),
            &BackendParams::default(),
            "needs escalation",
            "",
            20.0,
            outcome,
            &RetryConfig::default(),
            false,
            None,
            true,
            false,
            false,
        )
        .await;
        assert_eq!(learner.suggest("needs escalation"), Some(ComplexityRegime::Medium));
    }
}
