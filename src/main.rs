use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod embedding;
mod error;
mod evaluation;
mod heuristics;
mod models;
mod output;
mod prompts;
mod providers;
mod runner;
mod scoring;
mod sentiment;
mod similarity;
mod store;
mod themes;
mod tracker;

use crate::config::Config;
use crate::embedding::{CachedEmbedder, Embedder, LocalEmbedder, OfflineEmbedder};
use crate::evaluation::Evaluator;
use crate::models::ConversationTurn;
use crate::output::OutputFormat;
use crate::prompts::PromptHistory;
use crate::providers::{ProviderRegistry, build_prompt};
use crate::runner::{BatchOptions, Runner};
use crate::scoring::DimensionScorer;
use crate::similarity::SimilarityScorer;
use crate::store::MemoryStore;
use crate::tracker::PromptQualityTracker;

const DEFAULT_PROMPT_ID: &str = "maya";

/// Maya persona evaluation CLI - chat with the persona and score its responses
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output format: plain or json
    #[arg(short, long, global = true, default_value = "plain")]
    output: OutputFormat,

    /// Verbose output - show progress for each scenario and API request
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate every scenario of a run file and record the scores
    Evaluate {
        /// Path to the TOML run file
        run_file: PathBuf,
        /// Prompt id the overall scores are recorded under
        #[arg(long, default_value = DEFAULT_PROMPT_ID)]
        prompt_id: String,
    },
    /// Send a single message to the persona
    Chat {
        run_file: PathBuf,
        #[arg(short, long)]
        message: String,
        /// Provider identifier
        #[arg(long, default_value = "gemini")]
        model: String,
        /// JSON file with prior turns: [{"role": "user", "content": "..."}]
        #[arg(long)]
        history: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_PROMPT_ID)]
        prompt_id: String,
    },
    /// Report the rolling quality of a prompt
    Quality {
        run_file: PathBuf,
        #[arg(long, default_value = DEFAULT_PROMPT_ID)]
        prompt_id: String,
    },
    /// Record an externally obtained score for a prompt
    Record {
        run_file: PathBuf,
        #[arg(long, default_value = DEFAULT_PROMPT_ID)]
        prompt_id: String,
        #[arg(long)]
        score: f64,
    },
    /// Append a new version of a prompt
    Version {
        run_file: PathBuf,
        #[arg(long, default_value = DEFAULT_PROMPT_ID)]
        prompt_id: String,
        /// File containing the new prompt text
        #[arg(long)]
        prompt_file: PathBuf,
        #[arg(long, default_value = "manual improvement")]
        reason: String,
        #[arg(long)]
        improved_from: Option<String>,
    },
    /// List the versions of a prompt
    History {
        run_file: PathBuf,
        #[arg(long, default_value = DEFAULT_PROMPT_ID)]
        prompt_id: String,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("maya_eval={},warn", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Prompt state loaded for one invocation
struct State {
    store: Arc<MemoryStore>,
    path: Option<PathBuf>,
}

impl State {
    fn load(config: &Config) -> Result<Self> {
        let store = match &config.tracker.state_path {
            Some(path) => MemoryStore::load_or_default(path)?,
            None => MemoryStore::new(),
        };
        Ok(Self {
            store: Arc::new(store),
            path: config.tracker.state_path.clone(),
        })
    }

    fn tracker(&self, config: &Config) -> Arc<PromptQualityTracker> {
        Arc::new(PromptQualityTracker::new(self.store.clone(), &config.tracker))
    }

    fn history(&self) -> PromptHistory {
        PromptHistory::new(self.store.clone())
    }

    fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.store.save(path),
            None => {
                debug!("No tracker.state_path configured, state is not persisted");
                Ok(())
            }
        }
    }
}

async fn build_embedder(config: &Config) -> Arc<dyn Embedder> {
    match LocalEmbedder::new(&config.embedding).await {
        Ok(embedder) => Arc::new(CachedEmbedder::new(embedder)),
        Err(e) => {
            warn!("Embedding model unavailable, semantic scores will be 0: {}", e);
            Arc::new(OfflineEmbedder::new(e.to_string()))
        }
    }
}

fn system_prompt(config: &Config, state: &State, prompt_id: &str) -> String {
    state
        .history()
        .current(prompt_id)
        .unwrap_or_else(|| config.system_prompt.clone())
}

fn load_history(path: &Path) -> Result<Vec<ConversationTurn>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse history file: {}", path.display()))
}

async fn evaluate(config: &Config, prompt_id: &str, format: OutputFormat) -> Result<()> {
    let state = State::load(config)?;
    let tracker = state.tracker(config);
    let system_prompt = system_prompt(config, &state, prompt_id);

    let embedder = build_embedder(config).await;
    let scorer = DimensionScorer::new(SimilarityScorer::new(embedder), config.scoring);
    let providers = ProviderRegistry::from_config(&config.providers);
    debug!("Registered providers: {:?}", providers.ids());
    let runner = Runner::new(
        providers,
        Evaluator::new(scorer),
        tracker.clone(),
    );

    let options = BatchOptions {
        system_prompt: &system_prompt,
        conversation_context: &config.conversation_context,
        prompt_id: Some(prompt_id),
    };
    let batch = runner
        .run_batch(&config.scenarios, &options)
        .await
        .context("Evaluation request rejected")?;

    output::print_batch(&batch, format);
    output::print_quality(&tracker.quality(prompt_id), format);

    if let Some(storage_path) = &config.storage_path {
        runner::store_results(&batch, storage_path)?;
    }
    state.save()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    debug!("maya-eval v{} starting", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Evaluate { run_file, prompt_id } => {
            let config = Config::from_file(&run_file)?;
            evaluate(&config, &prompt_id, args.output).await
        }
        Command::Chat {
            run_file,
            message,
            model,
            history,
            prompt_id,
        } => {
            let config = Config::from_file(&run_file)?;
            let state = State::load(&config)?;
            let turns = match history {
                Some(path) => load_history(&path)?,
                None => Vec::new(),
            };

            let prompt = build_prompt(&system_prompt(&config, &state, &prompt_id), &turns, &message);
            let response = ProviderRegistry::from_config(&config.providers)
                .dispatch(&model, &prompt)
                .await
                .context("Failed to generate response")?;

            output::print_chat(&response, args.output);
            Ok(())
        }
        Command::Quality { run_file, prompt_id } => {
            let config = Config::from_file(&run_file)?;
            let state = State::load(&config)?;
            output::print_quality(&state.tracker(&config).quality(&prompt_id), args.output);
            Ok(())
        }
        Command::Record {
            run_file,
            prompt_id,
            score,
        } => {
            let config = Config::from_file(&run_file)?;
            let state = State::load(&config)?;
            let ack = state.tracker(&config).record_score(&prompt_id, score)?;
            output::print_ack(&ack, args.output);
            state.save()
        }
        Command::Version {
            run_file,
            prompt_id,
            prompt_file,
            reason,
            improved_from,
        } => {
            let config = Config::from_file(&run_file)?;
            let state = State::load(&config)?;
            let prompt_text = std::fs::read_to_string(&prompt_file)
                .with_context(|| format!("Failed to read prompt file: {}", prompt_file.display()))?;

            state
                .history()
                .record_version(&prompt_id, prompt_text.trim(), &reason, improved_from)?;
            output::print_history(&prompt_id, &state.history().history(&prompt_id), args.output);
            state.save()
        }
        Command::History { run_file, prompt_id } => {
            let config = Config::from_file(&run_file)?;
            let state = State::load(&config)?;
            output::print_history(&prompt_id, &state.history().history(&prompt_id), args.output);
            Ok(())
        }
    }
}
