//! The Speculative pipeline (C11): lightweight drafts, verified and merged by the main backend.

use tracing::instrument;

use super::{AdaptivePipeline, ExecuteOptions, PipelineContext};
use crate::backend::RegistryModel;
use crate::envelope::{ResponseEnvelope, ThoughtProcess};
use crate::error::OrchestratorError;
use crate::rag::augment;

const DRAFT_PERSPECTIVES: &[&str] = &[
    "a logical, analytical perspective",
    "a creative, divergent perspective",
    "a critical, sceptical perspective",
];

const NAME_HINTS: &[(&str, u32)] = &[
    ("phi", 2),
    ("gemma:2b", 2),
    ("tiny", 2),
    ("2b", 2),
    ("3b", 2),
    ("instruct", 1),
];

pub struct SpeculativePipeline {
    ctx: PipelineContext,
}

impl SpeculativePipeline {
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

        let draft_model = match self.ctx.backend.list_models().await {
            Ok(models) => select_lightweight_model(&models),
            Err(_) => None,
        };

        let Some(draft_model) = draft_model else {
            let adaptive = AdaptivePipeline::new(self.ctx.clone());
            return adaptive.execute(&prompt, system_prompt, opts).await;
        };

        let draft_params = opts
            .base_params
            .clone()
            .with_model(draft_model.name.clone())
            .with_temperature(0.8)
            .sanitized();

        let futures = DRAFT_PERSPECTIVES.iter().map(|perspective| {
            let prompt = prompt.clone();
            let params = draft_params.clone();
            async move {
                let draft_prompt = format!("From {perspective}, draft an answer to:\n\n{prompt}");
                self.ctx
                    .backend
                    .call(&draft_prompt, system_prompt, &params)
                    .await
            }
        });

        let results = futures::future::join_all(futures).await;
        let drafts: Vec<String> = results
            .into_iter()
            .filter_map(|r| match r {
                Ok(response) if !response.is_error() && !response.text.trim().is_empty() => {
                    Some(response.text)
                }
                _ => None,
            })
            .collect();

        if drafts.is_empty() {
            return ResponseEnvelope::failure("no draft was usable");
        }

        match self.verify_and_integrate(&drafts, system_prompt, opts).await {
            Ok(merged) => {
                let mut thought_process = ThoughtProcess {
                    reasoning_approach: Some("speculative_draft_verify_integrate".to_string()),
                    ..Default::default()
                };
                thought_process.insert("drafts_generated", drafts.len());
                thought_process.insert("draft_generator_model", &draft_model.name);
                thought_process.insert("verifier_integrator_model", self.ctx.backend.name());
                ResponseEnvelope::success(merged, thought_process)
            }
            Err(e) => ResponseEnvelope::failure(e.to_string()),
        }
    }

    async fn verify_and_integrate(
        &self,
        drafts: &[String],
        system_prompt: &str,
        opts: &ExecuteOptions,
    ) -> Result<String, OrchestratorError> {
        let joined = drafts
            .iter()
            .enumerate()
            .map(|(i, d)| format!("Draft {}:\n{}", i + 1, d))
            .collect::<Vec<_>>()
            .join("\n\n");

        let verify_prompt = format!(
            "The following drafts were produced independently. Verify them against each other \
             and integrate them into one final, correct answer:\n\n{joined}"
        );

        let response = self
            .ctx
            .backend
            .call(&verify_prompt, system_prompt, &opts.base_params)
            .await?;
        if response.is_error() {
            return Err(OrchestratorError::Backend(response.error.unwrap_or_default()));
        }
        Ok(response.text)
    }
}

/// Prefers names that hint at a small/instruct model, then smaller byte size.
fn select_lightweight_model(models: &[RegistryModel]) -> Option<RegistryModel> {
    models
        .iter()
        .map(|m| (m, name_score(&m.name)))
        .max_by(|(a, a_score), (b, b_score)| {
            a_score
                .cmp(b_score)
                .then(b.size_bytes.cmp(&a.size_bytes))
        })
        .map(|(m, _)| m.clone())
}

fn name_score(name: &str) -> u32 {
    let lower = name.to_lowercase();
    NAME_HINTS
        .iter()
        .filter(|(hint, _)| lower.contains(hint))
        .map(|(_, score)| *score)
        .sum()
}
