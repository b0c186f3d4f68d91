//! The Quantum-inspired pipeline (C10): fan out over N perspectives, collapse by synthesis.

use serde::Serialize;
use tracing::instrument;

use super::{ExecuteOptions, PipelineContext};
use crate::backend::{call_with_retry, BackendParams};
use crate::envelope::{ResponseEnvelope, ThoughtProcess};
use crate::error::OrchestratorError;
use crate::rag::augment;

const PERSPECTIVES: &[&str] = &[
    "an optimistic futurist",
    "a sceptical risk analyst",
    "a pragmatic engineer",
    "an ethicist",
    "a historian",
];

#[derive(Debug, Clone, Serialize)]
struct Hypothesis {
    perspective: String,
    content: String,
}

pub struct QuantumPipeline {
    ctx: PipelineContext,
}

impl QuantumPipeline {
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
        let prompt = if opts.use_rag {
            augment(self.ctx.rag.as_ref(), prompt).await
        } else {
            prompt.to_string()
        };

        let base_temperature = opts.base_params.temperature.unwrap_or(0.7);
        let superposition_temperature = (base_temperature + 0.1) * 1.1;

        let futures = PERSPECTIVES.iter().map(|perspective| {
            let prompt = prompt.clone();
            let params = opts
                .base_params
                .clone()
                .with_temperature(superposition_temperature)
                .sanitized();
            async move {
                let superposed_prompt = format!(
                    "Answer the following as {perspective} would:\n\n{prompt}"
                );
                let result = call_with_retry(
                    self.ctx.backend.as_ref(),
                    &superposed_prompt,
                    system_prompt,
                    &params,
                    &self.ctx.config.retry,
                )
                .await;
                (perspective.to_string(), result)
            }
        });

        let results = futures::future::join_all(futures).await;

        let hypotheses: Vec<Hypothesis> = results
            .into_iter()
            .filter_map(|(perspective, result)| match result {
                Ok(response) if !response.is_error() && !response.text.trim().is_empty() => {
                    Some(Hypothesis {
                        perspective,
                        content: response.text,
                    })
                }
                _ => None,
            })
            .collect();

        if hypotheses.is_empty() {
            return ResponseEnvelope::failure("no perspective produced a usable hypothesis");
        }

        match self.collapse(&hypotheses, prompt.as_str(), system_prompt, opts).await {
            Ok(synthesized) => {
                let mut thought_process = ThoughtProcess {
                    reasoning_approach: Some("quantum_superposition_collapse".to_string()),
                    ..Default::default()
                };
                thought_process.insert("hypotheses_generated", &hypotheses);
                thought_process.insert("quantum_superposition", true);
                thought_process.insert("collapse_method", "expert_synthesis");
                ResponseEnvelope::success(synthesized, thought_process)
            }
            Err(e) => ResponseEnvelope::failure(e.to_string()),
        }
    }

    async fn collapse(
        &self,
        hypotheses: &[Hypothesis],
        prompt: &str,
        system_prompt: &str,
        opts: &ExecuteOptions,
    ) -> Result<String, OrchestratorError> {
        let base_temperature = opts.base_params.temperature.unwrap_or(0.7);
        let collapse_temperature = base_temperature * 0.5;

        let joined: String = hypotheses
            .iter()
            .map(|h| format!("[{}]\n{}", h.perspective, h.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let synthesis_prompt = format!(
            "As the master synthesiser, collapse the following perspectives on the question \
             \"{prompt}\" into one coherent, decisive answer:\n\n{joined}"
        );

        let params: BackendParams = opts
            .base_params
            .clone()
            .with_temperature(collapse_temperature)
            .sanitized();

        let response = call_with_retry(
            self.ctx.backend.as_ref(),
            &synthesis_prompt,
            system_prompt,
            &params,
            &self.ctx.config.retry,
        )
        .await?;

        if response.is_error() {
            return Err(OrchestratorError::Backend(response.error.unwrap_or_default()));
        }
        Ok(response.text)
    }
}
