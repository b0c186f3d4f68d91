//! The Self-Discover pipeline (C12): classify, select or synthesise a strategy, run it.

use tracing::instrument;

use super::{ExecuteOptions, PipelineContext};
use crate::envelope::{ResponseEnvelope, ThoughtProcess};
use crate::error::OrchestratorError;
use crate::rag::augment;
use crate::strategy_hub::{atomic_module_prompt, is_known_module, Strategy, ATOMIC_REASONING_MODULES};

const PROBLEM_CLASSES: &[&str] = &["planning", "analysis", "synthesis", "general"];

pub struct SelfDiscoverPipeline {
    ctx: PipelineContext,
}

impl SelfDiscoverPipeline {
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

        let problem_class = self.classify(&prompt, system_prompt, opts).await;

        let strategy = match self.ctx.strategy_hub.get_best_strategy(&problem_class) {
            Some(strategy) if strategy.problem_class == problem_class => strategy,
            _ => match self.discover_strategy(&prompt, &problem_class, system_prompt, opts).await {
                Ok(strategy) => strategy,
                Err(e) => return ResponseEnvelope::failure(e.to_string()),
            },
        };

        match self.run_strategy(&strategy, &prompt, system_prompt, opts).await {
            Ok(final_result) => {
                let success = !final_result.trim().is_empty() && !final_result.to_lowercase().contains("error");
                self.ctx.strategy_hub.update_strategy_performance(&strategy.id, success);

                if !success {
                    return ResponseEnvelope::failure("strategy execution produced no usable result");
                }

                let mut thought_process = ThoughtProcess {
                    reasoning_approach: Some(format!("self_discover:{}", strategy.id)),
                    ..Default::default()
                };
                thought_process.insert("problem_class", &problem_class);
                thought_process.insert("strategy_steps", &strategy.steps);
                ResponseEnvelope::success(final_result, thought_process)
            }
            Err(e) => {
                self.ctx.strategy_hub.update_strategy_performance(&strategy.id, false);
                ResponseEnvelope::failure(e.to_string())
            }
        }
    }

    async fn classify(&self, prompt: &str, system_prompt: &str, opts: &ExecuteOptions) -> String {
        let classify_prompt = format!(
            "Classify the following problem as exactly one of: planning, analysis, synthesis, general. \
             Respond with only the single word.\n\nProblem: {prompt}"
        );
        let response = self
            .ctx
            .backend
            .call(&classify_prompt, system_prompt, &opts.base_params)
            .await;
        match response {
            Ok(r) if !r.is_error() => {
                let word = r.text.trim().to_lowercase();
                PROBLEM_CLASSES
                    .iter()
                    .find(|c| word.contains(*c))
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "general".to_string())
            }
            _ => "general".to_string(),
        }
    }

    async fn discover_strategy(
        &self,
        prompt: &str,
        problem_class: &str,
        system_prompt: &str,
        opts: &ExecuteOptions,
    ) -> Result<Strategy, OrchestratorError> {
        let module_names: Vec<&str> = ATOMIC_REASONING_MODULES.iter().map(|(n, _)| *n).collect();
        let discovery_prompt = format!(
            "Choose an ordered, comma-separated list of steps from exactly this set: {}. \
             Pick whichever steps best solve this problem:\n\n{prompt}",
            module_names.join(", ")
        );

        let response = self
            .ctx
            .backend
            .call(&discovery_prompt, system_prompt, &opts.base_params)
            .await?;

        let steps: Vec<String> = if response.is_error() {
            Vec::new()
        } else {
            response
                .text
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| is_known_module(s))
                .collect()
        };

        let steps = if steps.is_empty() {
            vec!["DECOMPOSE".to_string(), "SYNTHESIZE".to_string()]
        } else {
            steps
        };

        let new_id = format!("strat_{}", chrono::Utc::now().timestamp());
        let strategy = Strategy {
            id: new_id,
            name: format!("Discovered strategy for {problem_class}"),
            problem_class: problem_class.to_string(),
            steps,
            performance_metrics: Default::default(),
            version: 1,
        };
        self.ctx.strategy_hub.add_strategy(strategy.clone());
        Ok(strategy)
    }

    async fn run_strategy(
        &self,
        strategy: &Strategy,
        prompt: &str,
        system_prompt: &str,
        opts: &ExecuteOptions,
    ) -> Result<String, OrchestratorError> {
        let mut current_input = prompt.to_string();
        for step in &strategy.steps {
            let step_prompt = atomic_module_prompt(step, &current_input)
                .ok_or_else(|| OrchestratorError::Strategy(format!("unknown atomic module: {step}")))?;
            let response = self
                .ctx
                .backend
                .call(&step_prompt, system_prompt, &opts.base_params)
                .await?;
            if response.is_error() {
                return Err(OrchestratorError::Backend(response.error.unwrap_or_default()));
            }
            current_input = response.text;
        }
        Ok(current_input)
    }
}
