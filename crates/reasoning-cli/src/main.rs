//! Command-line front end for the reasoning orchestrator.

use std::io::Read as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reasoning_core::backend::OpenAiCompatibleBackend;
use reasoning_core::complexity::ComplexityLearner;
use reasoning_core::rag::{KnowledgeBaseRag, NoopRag, RagHook};
use reasoning_core::strategy_hub::ThinkingStrategyHub;
use reasoning_core::{solve, ExecuteOptions, Mode, OrchestratorConfig, PipelineContext};

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

/// Solve a single prompt through the complexity-adaptive reasoning orchestrator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The prompt to solve. Read from stdin when omitted.
    prompt: Option<String>,

    /// Reasoning mode to use.
    #[arg(long, default_value = "adaptive")]
    mode: String,

    /// Optional system prompt.
    #[arg(long, default_value = "")]
    system_prompt: String,

    /// Force a specific complexity regime, skipping analysis.
    #[arg(long)]
    force_regime: Option<String>,

    /// Disable the self-adjustment loop (on by default).
    #[arg(long, default_value_t = false)]
    no_adjustment: bool,

    /// Enable retrieval-augmented context.
    #[arg(long, default_value_t = false)]
    use_rag: bool,

    /// Enable Wikipedia as the retrieval source; takes precedence over a
    /// local knowledge base when both are set.
    #[arg(long, default_value_t = false)]
    use_wikipedia: bool,

    /// Directory of documents backing a local knowledge-base RAG hook.
    #[arg(long)]
    knowledge_base: Option<PathBuf>,

    /// How to print the result.
    #[arg(long, value_enum, default_value = "pretty")]
    output: OutputFormat,
}

fn read_prompt(args: &Args) -> Result<String> {
    match &args.prompt {
        Some(p) => Ok(p.clone()),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read prompt from stdin")?;
            Ok(buf.trim().to_string())
        }
    }
}

fn load_knowledge_base(path: &std::path::Path) -> Vec<(String, String)> {
    let mut docs = Vec::new();
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            if let Ok(content) = std::fs::read_to_string(entry.path()) {
                docs.push((entry.file_name().to_string_lossy().to_string(), content));
            }
        }
    }
    docs
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let prompt = read_prompt(&args)?;

    let config = OrchestratorConfig::from_env();
    config.validate().context("invalid configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mode: Mode = args
        .mode
        .parse()
        .map_err(|_| anyhow::anyhow!("unrecognised mode: {}", args.mode))?;

    let force_regime = args
        .force_regime
        .as_ref()
        .map(|s| s.parse().map_err(|_| anyhow::anyhow!("unrecognised regime: {s}")))
        .transpose()?;

    let backend = OpenAiCompatibleBackend::new(config.backend.clone());
    let learner = ComplexityLearner::new(&config.learner_store_path);
    let strategy_hub = ThinkingStrategyHub::new(&config.strategy_store_path);

    let rag: Arc<dyn RagHook> = match &args.knowledge_base {
        Some(path) => Arc::new(KnowledgeBaseRag::new(load_knowledge_base(path))),
        None => Arc::new(NoopRag),
    };

    let ctx = PipelineContext {
        backend: Arc::new(backend),
        config: Arc::new(config),
        learner: Arc::new(learner),
        strategy_hub: Arc::new(strategy_hub),
        rag,
    };

    let opts = ExecuteOptions {
        force_regime,
        use_rag: args.use_rag,
        use_wikipedia: args.use_wikipedia,
        knowledge_base_path: args.knowledge_base.as_ref().map(|p| p.display().to_string()),
        real_time_adjustment: !args.no_adjustment,
        ..Default::default()
    };

    let envelope = solve(&ctx, &prompt, &args.system_prompt, mode, opts).await;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&envelope)?),
        OutputFormat::Pretty => {
            if envelope.success {
                println!("{}", envelope.final_solution);
            } else {
                eprintln!("error: {}", envelope.error.unwrap_or_default());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
