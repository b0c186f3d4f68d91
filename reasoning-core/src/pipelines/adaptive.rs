//! The Adaptive pipeline (C8): the baseline mode every other pipeline builds on.

use tracing::instrument;

use super::{ExecuteOptions, PipelineContext};
use crate::envelope::ResponseEnvelope;
use crate::finalization::finalize_and_learn;
use crate::rag::augment_with_source;
use crate::self_adjustment::run_reasoning_loop;

pub struct AdaptivePipeline {
    ctx: PipelineContext,
}

impl AdaptivePipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, prompt, system_prompt, opts))]
    pub async fn execute(
        &self,
        prompt: &str,
        system_prompt: &str,
        opts: &ExecuteOptions,
    ) -> ResponseEnvelope {
        let edge = opts.edge;
        let rag_enabled = (opts.use_rag || opts.use_wikipedia) && !edge;
        let (prompt, mut rag_source) = if rag_enabled {
            augment_with_source(self.ctx.rag.as_ref(), prompt).await
        } else {
            (prompt.to_string(), None)
        };
        // Wikipedia's retrieval internals are out of scope for this crate (see DESIGN.md);
        // when requested it still takes precedence for the recorded source (§4.7).
        if opts.use_wikipedia && !edge {
            rag_source = Some("wikipedia".to_string());
        }

        let force_regime = if edge { None } else { opts.force_regime };

        let (score, analyzed_regime, learned_suggestion_used) = self.ctx.analyzer().analyze(&prompt, edge);
        let initial_regime = force_regime.unwrap_or(analyzed_regime);

        let real_time_adjustment_active = opts.real_time_adjustment && !edge;

        let outcome = run_reasoning_loop(
            self.ctx.backend.as_ref(),
            &prompt,
            system_prompt,
            &opts.base_params,
            initial_regime,
            real_time_adjustment_active,
            &self.ctx.config.retry,
            &self.ctx.config.concurrency,
        )
        .await;

        finalize_and_learn(
            self.ctx.backend.as_ref(),
            Some(self.ctx.learner.as_ref()),
            &opts.base_params,
            &prompt,
            system_prompt,
            score,
            outcome,
            &self.ctx.config.retry,
            rag_enabled,
            rag_source,
            real_time_adjustment_active,
            edge,
            learned_suggestion_used,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendResponse, MockBackend};
    use crate::complexity::ComplexityLearner;
    use crate::config::OrchestratorConfig;
    use crate::rag::NoopRag;
    use crate::strategy_hub::ThinkingStrategyHub;
    use std::sync::Arc;

    fn ctx_with(backend: MockBackend) -> PipelineContext {
        let dir = tempfile::tempdir().unwrap();
        PipelineContext {
            backend: Arc::new(backend),
            config: Arc::new(OrchestratorConfig::default()),
            learner: Arc::new(ComplexityLearner::new(dir.path().join("l.json"))),
            strategy_hub: Arc::new(ThinkingStrategyHub::new(dir.path().join("h.json"))),
            rag: Arc::new(NoopRag),
        }
    }

    #[tokio::test]
    async fn simple_prompt_resolves_through_low_regime() {
        let backend = MockBackend::scripted(vec![Ok(BackendResponse::ok("42"))]);
        let pipeline = AdaptivePipeline::new(ctx_with(backend));
        let opts = ExecuteOptions {
            real_time_adjustment: false,
            ..Default::default()
        };
        let envelope = pipeline.execute("what is 6*7", "", &opts).await;
        assert!(envelope.success);
        assert_eq!(envelope.final_solution, "42");
        assert_eq!(envelope.thought_process.final_regime.as_deref(), Some("low"));
    }

    #[tokio::test]
    async fn default_options_run_self_adjustment() {
        let backend = MockBackend::scripted(vec![
            Ok(BackendResponse::ok("42")),
            Ok(BackendResponse::ok("yes")),
        ]);
        let pipeline = AdaptivePipeline::new(ctx_with(backend));
        let envelope = pipeline.execute("what is 6*7", "", &ExecuteOptions::default()).await;
        assert!(envelope.success);
        assert_eq!(envelope.final_solution, "42");
        assert!(envelope.v2_improvements.unwrap().real_time_adjustment_active);
    }

    #[tokio::test]
    async fn forced_regime_bypasses_analysis() {
        let backend = MockBackend::scripted(vec![
            Ok(BackendResponse::ok("staged answer")),
            Ok(BackendResponse::ok("staged answer")),
        ]);
        let pipeline = AdaptivePipeline::new(ctx_with(backend));
        let opts = ExecuteOptions {
            force_regime: Some(crate::complexity::ComplexityRegime::Medium),
            real_time_adjustment: false,
            ..Default::default()
        };
        let envelope = pipeline.execute("p", "", &opts).await;
        assert_eq!(envelope.thought_process.initial_regime.as_deref(), Some("medium"));
    }

    #[tokio::test]
    async fn edge_mode_forces_low_and_skips_adjustment() {
        let backend = MockBackend::scripted(vec![Ok(BackendResponse::ok("quick reply"))]);
        let pipeline = AdaptivePipeline::new(ctx_with(backend));
        let opts = ExecuteOptions {
            edge: true,
            real_time_adjustment: true,
            ..Default::default()
        };
        let envelope = pipeline.execute("edge prompt", "", &opts).await;
        assert_eq!(envelope.thought_process.initial_regime.as_deref(), Some("low"));
        assert_eq!(envelope.thought_process.initial_complexity_score, Some(10.0));
    }
}
