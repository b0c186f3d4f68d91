//! End-to-end scenarios exercising the dispatcher over a scripted backend.

use std::sync::Arc;

use reasoning_core::backend::{BackendResponse, MockBackend};
use reasoning_core::complexity::ComplexityLearner;
use reasoning_core::config::OrchestratorConfig;
use reasoning_core::rag::NoopRag;
use reasoning_core::strategy_hub::ThinkingStrategyHub;
use reasoning_core::{solve, ExecuteOptions, Mode, OrchestratorError, PipelineContext};

fn ctx(backend: MockBackend) -> PipelineContext {
    let dir = tempfile::tempdir().unwrap();
    PipelineContext {
        backend: Arc::new(backend),
        config: Arc::new(OrchestratorConfig::default()),
        learner: Arc::new(ComplexityLearner::new(dir.path().join("learner.json"))),
        strategy_hub: Arc::new(ThinkingStrategyHub::new(dir.path().join("hub.json"))),
        rag: Arc::new(NoopRag),
    }
}

/// S1: a trivial question is answered once, self-evaluation confirms it is
/// sufficient, and no refinement call occurs.
#[tokio::test]
async fn s1_low_accepted_without_escalation() {
    let backend = MockBackend::scripted(vec![
        Ok(BackendResponse::ok("2.")),
        Ok(BackendResponse::ok("yes")),
    ]);
    let context = ctx(backend);
    let mut opts = ExecuteOptions::default();
    opts.force_regime = Some(reasoning_core::ComplexityRegime::Low);
    let envelope = solve(&context, "What is 1+1?", "", Mode::Adaptive, opts).await;

    assert!(envelope.success);
    assert_eq!(envelope.final_solution, "2.");
    assert_eq!(envelope.thought_process.final_regime.as_deref(), Some("low"));

    let improvements = envelope.v2_improvements.unwrap();
    assert_eq!(improvements.regime, "low");
    assert_eq!(improvements.overthinking_prevention, Some(true));
}

/// S2: LOW is judged insufficient, escalates to MEDIUM, is accepted, and is learned.
#[tokio::test]
async fn s2_escalates_low_to_medium_and_learns() {
    let backend = MockBackend::scripted(vec![
        Ok(BackendResponse::ok("Attention lets models weigh inputs.")),
        // LOW's trivial-question probe: "no" falls through to the generic evaluator.
        Ok(BackendResponse::ok("no")),
        Ok(BackendResponse::ok("insufficient: shallow, next_regime: medium")),
        Ok(BackendResponse::ok(
            "Attention computes a weighted combination of value vectors using query/key similarity across stages.",
        )),
        Ok(BackendResponse::ok(
            "Attention computes a weighted combination of value vectors using query/key similarity across stages.",
        )),
    ]);
    let context = ctx(backend);
    let mut opts = ExecuteOptions::default();
    opts.real_time_adjustment = true;
    opts.force_regime = Some(reasoning_core::ComplexityRegime::Low);

    let envelope = solve(&context, "Explain attention in transformers", "", Mode::Adaptive, opts).await;

    assert!(envelope.success);
    assert_eq!(envelope.thought_process.final_regime.as_deref(), Some("medium"));
    assert_eq!(
        context.learner.suggest("Explain attention in transformers"),
        Some(reasoning_core::ComplexityRegime::Medium)
    );
}

/// S3: HIGH decomposes into three sub-problems, solves and integrates them.
#[tokio::test]
async fn s3_high_decompose_integrate() {
    let backend = MockBackend::scripted(vec![
        Ok(BackendResponse::ok(r#"{"sub_problems": ["a", "b", "c"]}"#)),
        Ok(BackendResponse::ok("A")),
        Ok(BackendResponse::ok("B")),
        Ok(BackendResponse::ok("C")),
        Ok(BackendResponse::ok("AB")),
        Ok(BackendResponse::ok("ABC")),
        Ok(BackendResponse::ok("ABC*")),
    ]);
    let context = ctx(backend);
    let mut opts = ExecuteOptions::default();
    opts.force_regime = Some(reasoning_core::ComplexityRegime::High);
    opts.real_time_adjustment = false;

    let envelope = solve(&context, "a genuinely hard problem", "", Mode::Adaptive, opts).await;

    assert!(envelope.success);
    assert_eq!(envelope.final_solution, "ABC*");
}

/// S4: Parallel picks the medium-length, medium-regime candidate.
#[tokio::test]
async fn s4_parallel_prefers_medium() {
    let low_answer = "x".repeat(80);
    let medium_answer = "x".repeat(500);
    let high_answer = "x".repeat(2500);

    let backend = MockBackend::scripted(vec![
        Ok(BackendResponse::ok(low_answer)),
        Ok(BackendResponse::ok(medium_answer.clone())),
        Ok(BackendResponse::ok(medium_answer.clone())),
        Ok(BackendResponse::ok("no bullets or json here")),
        Ok(BackendResponse::ok(high_answer.clone())),
        Ok(BackendResponse::ok(high_answer)),
    ]);
    let context = ctx(backend);

    let envelope = solve(&context, "prompt", "", Mode::Parallel, ExecuteOptions::default()).await;

    assert!(envelope.success);
    assert_eq!(envelope.final_solution, medium_answer);
    assert_eq!(envelope.thought_process.final_regime.as_deref(), Some("medium"));
}

/// S5: Speculative discovers a draft model, gathers three drafts, and merges them.
#[tokio::test]
async fn s5_speculative_merge() {
    use async_trait::async_trait;
    use reasoning_core::backend::{Backend, BackendParams, Capabilities, RegistryModel};

    struct RegistryBackend {
        inner: MockBackend,
    }

    #[async_trait]
    impl Backend for RegistryBackend {
        fn name(&self) -> &str {
            "registry"
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities::default()
        }
        async fn call(
            &self,
            prompt: &str,
            system_prompt: &str,
            params: &BackendParams,
        ) -> Result<BackendResponse, OrchestratorError> {
            self.inner.call(prompt, system_prompt, params).await
        }
        async fn list_models(&self) -> Result<Vec<RegistryModel>, OrchestratorError> {
            Ok(vec![RegistryModel {
                name: "phi3:instruct".to_string(),
                size_bytes: 1,
            }])
        }
    }

    let backend = RegistryBackend {
        inner: MockBackend::scripted(vec![
            Ok(BackendResponse::ok("D1")),
            Ok(BackendResponse::ok("D2")),
            Ok(BackendResponse::ok("D3")),
            Ok(BackendResponse::ok("MERGED")),
        ]),
    };

    let dir = tempfile::tempdir().unwrap();
    let context = PipelineContext {
        backend: Arc::new(backend),
        config: Arc::new(OrchestratorConfig::default()),
        learner: Arc::new(ComplexityLearner::new(dir.path().join("learner.json"))),
        strategy_hub: Arc::new(ThinkingStrategyHub::new(dir.path().join("hub.json"))),
        rag: Arc::new(NoopRag),
    };

    let envelope = solve(&context, "p", "", Mode::SpeculativeThought, ExecuteOptions::default()).await;

    assert!(envelope.success);
    assert_eq!(envelope.final_solution, "MERGED");
}

/// S6: Self-Discover synthesises a new planning strategy, runs it, and persists its performance.
/// The hub store is pre-seeded without a `planning` entry so discovery is actually triggered.
#[tokio::test]
async fn s6_self_discover_synthesises_and_persists() {
    let backend = MockBackend::scripted(vec![
        Ok(BackendResponse::ok("planning")),
        Ok(BackendResponse::ok("DECOMPOSE, PLAN_STEP_BY_STEP, VALIDATE_AND_REFINE")),
        Ok(BackendResponse::ok("decomposed")),
        Ok(BackendResponse::ok("planned")),
        Ok(BackendResponse::ok("validated final plan")),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let hub_path = dir.path().join("hub.json");
    std::fs::write(&hub_path, r#"{"general_default": {"id": "general_default", "name": "General default", "problem_class": "general", "steps": ["DECOMPOSE", "SYNTHESIZE"], "performance_metrics": {"success_rate": 0.0, "execution_count": 0.0}, "version": 1}}"#).unwrap();

    let context = PipelineContext {
        backend: Arc::new(backend),
        config: Arc::new(OrchestratorConfig::default()),
        learner: Arc::new(ComplexityLearner::new(dir.path().join("learner.json"))),
        strategy_hub: Arc::new(ThinkingStrategyHub::new(hub_path)),
        rag: Arc::new(NoopRag),
    };

    let envelope = solve(&context, "launch a new product", "", Mode::SelfDiscover, ExecuteOptions::default()).await;

    assert!(envelope.success);
    assert_eq!(envelope.final_solution, "validated final plan");

    let persisted = context.strategy_hub.get_best_strategy("planning").unwrap();
    assert_eq!(
        persisted.steps,
        vec!["DECOMPOSE".to_string(), "PLAN_STEP_BY_STEP".to_string(), "VALIDATE_AND_REFINE".to_string()]
    );
    assert_eq!(persisted.performance_metrics.execution_count, 1.0);
    assert_eq!(persisted.performance_metrics.success_rate, 1.0);
}
