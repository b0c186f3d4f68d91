//! The dispatcher (C13): the single public entry point, routing a mode to a pipeline.

use crate::complexity::ComplexityRegime;
use crate::envelope::ResponseEnvelope;
use crate::pipelines::{
    AdaptivePipeline, ExecuteOptions, ParallelPipeline, PipelineContext, QuantumPipeline,
    SelfDiscoverPipeline, SpeculativePipeline,
};

/// The closed set of modes a caller may request (§4.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Simple,
    Chat,
    Reasoning,
    Efficient,
    Balanced,
    Decomposed,
    Adaptive,
    PaperOptimized,
    Parallel,
    QuantumInspired,
    Edge,
    SpeculativeThought,
    SelfDiscover,
}

impl std::str::FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Mode::Simple),
            "chat" => Ok(Mode::Chat),
            "reasoning" => Ok(Mode::Reasoning),
            "efficient" => Ok(Mode::Efficient),
            "balanced" => Ok(Mode::Balanced),
            "decomposed" => Ok(Mode::Decomposed),
            "adaptive" => Ok(Mode::Adaptive),
            "paper_optimized" => Ok(Mode::PaperOptimized),
            "parallel" => Ok(Mode::Parallel),
            "quantum_inspired" => Ok(Mode::QuantumInspired),
            "edge" => Ok(Mode::Edge),
            "speculative_thought" => Ok(Mode::SpeculativeThought),
            "self_discover" => Ok(Mode::SelfDiscover),
            _ => Err(()),
        }
    }
}

impl Mode {
    /// Every mode outside the small set with a dedicated pipeline routes to Adaptive,
    /// forcing LOW for `edge` and leaving the rest to complexity analysis.
    fn adaptive_force_regime(self) -> Option<ComplexityRegime> {
        match self {
            Mode::Edge => Some(ComplexityRegime::Low),
            _ => None,
        }
    }
}

/// Routes `prompt` through the pipeline named by `mode`, returning an envelope
/// for every outcome -- this function never returns `Err`.
pub async fn solve(
    ctx: &PipelineContext,
    prompt: &str,
    system_prompt: &str,
    mode: Mode,
    mut opts: ExecuteOptions,
) -> ResponseEnvelope {
    match mode {
        Mode::Parallel => ParallelPipeline::new(ctx.clone()).execute(prompt, system_prompt, &opts).await,
        Mode::QuantumInspired => QuantumPipeline::new(ctx.clone()).execute(prompt, system_prompt, &opts).await,
        Mode::SpeculativeThought => {
            SpeculativePipeline::new(ctx.clone()).execute(prompt, system_prompt, &opts).await
        }
        Mode::SelfDiscover => {
            SelfDiscoverPipeline::new(ctx.clone()).execute(prompt, system_prompt, &opts).await
        }
        other => {
            opts.edge = other == Mode::Edge || opts.edge;
            if opts.force_regime.is_none() {
                opts.force_regime = other.adaptive_force_regime();
            }
            AdaptivePipeline::new(ctx.clone()).execute(prompt, system_prompt, &opts).await
        }
    }
}
