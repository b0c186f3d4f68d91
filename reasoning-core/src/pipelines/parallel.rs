//! The Parallel pipeline (C9): fan out across all three regimes, keep the best.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::instrument;

use super::{AdaptivePipeline, ExecuteOptions, PipelineContext};
use crate::complexity::ComplexityRegime;
use crate::envelope::{ResponseEnvelope, ThoughtProcess};
use crate::rag::augment;

#[derive(Debug, Clone, Serialize)]
struct Candidate {
    regime: String,
    approach: Option<String>,
    length: usize,
}

pub struct ParallelPipeline {
    ctx: PipelineContext,
}

impl ParallelPipeline {
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

        let semaphore = Arc::new(Semaphore::new(self.ctx.config.concurrency.parallel_pipeline_fanout));
        let adaptive = Arc::new(AdaptivePipeline::new(self.ctx.clone()));

        let regimes = [ComplexityRegime::Low, ComplexityRegime::Medium, ComplexityRegime::High];
        let futures = regimes.iter().map(|regime| {
            let semaphore = Arc::clone(&semaphore);
            let adaptive = Arc::clone(&adaptive);
            let prompt = prompt.clone();
            let system_prompt = system_prompt.to_string();
            let opts = ExecuteOptions {
                force_regime: Some(*regime),
                real_time_adjustment: false,
                use_rag: false,
                ..opts.clone()
            };
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                adaptive.execute(&prompt, &system_prompt, &opts).await
            }
        });

        let results = futures::future::join_all(futures).await;

        let valid: Vec<&ResponseEnvelope> = results
            .iter()
            .filter(|r| r.success && r.error.is_none() && !r.final_solution.trim().is_empty())
            .collect();

        if valid.is_empty() {
            return ResponseEnvelope::failure("no regime produced a usable solution");
        }

        let all_candidates: Vec<Candidate> = valid
            .iter()
            .map(|r| Candidate {
                regime: r.thought_process.final_regime.clone().unwrap_or_default(),
                approach: r.thought_process.reasoning_approach.clone(),
                length: r.final_solution.chars().count(),
            })
            .collect();

        // Deterministic tie-break: first candidate wins ties, matching the fixed
        // LOW/MEDIUM/HIGH fan-out order (`Iterator::max_by_key` would keep the last).
        let best = {
            let mut best = valid[0];
            let mut best_score = score(best);
            for candidate in &valid[1..] {
                let candidate_score = score(candidate);
                if candidate_score > best_score {
                    best = candidate;
                    best_score = candidate_score;
                }
            }
            best
        };

        let mut thought_process = ThoughtProcess {
            final_regime: best.thought_process.final_regime.clone(),
            reasoning_approach: best.thought_process.reasoning_approach.clone(),
            ..Default::default()
        };
        thought_process.insert("all_candidates", &all_candidates);

        ResponseEnvelope::success(best.final_solution.clone(), thought_process)
    }
}

/// Length-banded score plus a regime bonus favouring the middle ground (§4.8/§9).
fn score(envelope: &ResponseEnvelope) -> u32 {
    let length = envelope.final_solution.chars().count();
    let length_score = if (100..=1000).contains(&length) {
        3
    } else if (50..=2000).contains(&length) {
        2
    } else {
        1
    };
    let regime_bonus = match envelope.thought_process.final_regime.as_deref() {
        Some("medium") => 2,
        Some("low") | Some("high") => 1,
        _ => 0,
    };
    length_score + regime_bonus
}
