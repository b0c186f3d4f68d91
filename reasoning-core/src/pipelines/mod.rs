//! Execution modes (C8-C12): the thirteen ways a prompt can be solved (C13).

mod adaptive;
mod parallel;
mod quantum;
mod self_discover;
mod speculative;

pub use adaptive::AdaptivePipeline;
pub use parallel::ParallelPipeline;
pub use quantum::QuantumPipeline;
pub use self_discover::SelfDiscoverPipeline;
pub use speculative::SpeculativePipeline;

use std::sync::Arc;

use crate::backend::{Backend, BackendParams};
use crate::complexity::{ComplexityAnalyzer, ComplexityLearner, ComplexityRegime};
use crate::config::OrchestratorConfig;
use crate::rag::RagHook;
use crate::strategy_hub::ThinkingStrategyHub;

/// Options common to every mode's entry point.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub force_regime: Option<ComplexityRegime>,
    pub use_rag: bool,
    pub use_wikipedia: bool,
    pub knowledge_base_path: Option<String>,
    pub edge: bool,
    pub real_time_adjustment: bool,
    pub base_params: BackendParams,
}

impl Default for ExecuteOptions {
    /// Self-adjustment runs by default (§6 item 4); callers opt out explicitly.
    fn default() -> Self {
        Self {
            force_regime: None,
            use_rag: false,
            use_wikipedia: false,
            knowledge_base_path: None,
            edge: false,
            real_time_adjustment: true,
            base_params: BackendParams::default(),
        }
    }
}

/// Shared, cheaply-clonable handle to everything a pipeline needs, so each
/// mode can be constructed independently of how the caller wires dependencies.
#[derive(Clone)]
pub struct PipelineContext {
    pub backend: Arc<dyn Backend + Send + Sync>,
    pub config: Arc<OrchestratorConfig>,
    pub learner: Arc<ComplexityLearner>,
    pub strategy_hub: Arc<ThinkingStrategyHub>,
    pub rag: Arc<dyn RagHook>,
}

impl PipelineContext {
    pub fn analyzer(&self) -> ComplexityAnalyzer<'_> {
        ComplexityAnalyzer::new(self.config.thresholds).with_learner(&self.learner)
    }
}
