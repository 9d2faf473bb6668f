use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ats_engine::llm_client::anthropic::MODEL;
use ats_engine::models::Severity;
use ats_engine::{
    AnthropicClient, AtsEngine, Config, DocumentKind, HashEmbedder, LanguageModelClient,
    LocalClient, LruEmbeddingCache, ScoreReport, ScoringConfig,
};

#[derive(Parser)]
#[command(
    name = "ats-score",
    version,
    about = "Score a resume against a job description"
)]
struct Cli {
    /// JSON file with scoring options; missing fields use defaults
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a resume against a job description
    Score {
        /// Path to the resume (plain text)
        resume: PathBuf,

        /// Path to the job description (plain text)
        job: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Parse one document and print the extracted structure as JSON
    Parse {
        /// Path to a resume or job description (plain text)
        input_file: PathBuf,

        #[arg(short, long, value_enum)]
        kind: KindArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Resume,
    JobDescription,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Resume => DocumentKind::Resume,
            KindArg::JobDescription => DocumentKind::JobDescription,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;

    // Logs go to stderr so JSON on stdout stays clean
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("ats_engine={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut scoring = load_scoring_config(cli.config.as_deref())?;
    let engine = build_engine(&config, &mut scoring)?;
    info!("ats-score v{} using {}", env!("CARGO_PKG_VERSION"), engine.client_name());

    match cli.command {
        Commands::Score {
            resume,
            job,
            output,
        } => {
            let resume_text = read_text(&resume)?;
            let job_text = read_text(&job)?;
            let report = engine.score(&resume_text, &job_text, &scoring).await?;
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => print_summary(&report),
            }
        }
        Commands::Parse { input_file, kind } => {
            let text = read_text(&input_file)?;
            let parsed = engine.parse(&text, kind.into(), &scoring).await?;
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
    }

    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_scoring_config(path: Option<&Path>) -> Result<ScoringConfig> {
    let Some(path) = path else {
        return Ok(ScoringConfig::default());
    };
    let raw = read_text(path)?;
    let scoring: ScoringConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid scoring config in {}", path.display()))?;
    scoring.validate()?;
    Ok(scoring)
}

/// Anthropic when a key is configured, otherwise the offline client with
/// model calls switched off.
fn build_engine(config: &Config, scoring: &mut ScoringConfig) -> Result<AtsEngine> {
    let embedder = HashEmbedder::new(config.embedding_dimension);
    let client: Arc<dyn LanguageModelClient> = match &config.anthropic_api_key {
        Some(key) => {
            info!("LLM client initialized (model: {MODEL})");
            Arc::new(
                AnthropicClient::new(
                    key.clone(),
                    Duration::from_millis(scoring.provider_timeout_ms),
                    embedder,
                )
                .context("failed to build Anthropic client")?,
            )
        }
        None => {
            info!("ANTHROPIC_API_KEY not set, running rules-only with local embeddings");
            scoring.model_extraction = false;
            scoring.refine_weights = false;
            scoring.suggest_edits = false;
            Arc::new(LocalClient::new(embedder))
        }
    };

    let cache = Arc::new(LruEmbeddingCache::new(config.embedding_cache_capacity));
    Ok(AtsEngine::new(client).with_cache(cache))
}

fn print_summary(report: &ScoreReport) {
    let breakdown = report.breakdown();
    println!("Overall score: {:.1}/100", report.overall_score());
    println!(
        "  weighted {:.1}, penalty {:.1}, {} of {} requirements matched",
        breakdown.weighted_score,
        breakdown.penalty,
        breakdown.matched_count,
        breakdown.total_requirements
    );
    println!("Resume quality: {}/100", report.quality().score);

    let missing = report.missing_keywords();
    if !missing.is_empty() {
        println!("Missing: {}", missing.join(", "));
    }

    println!();
    for item in report.feedback() {
        let tag = match item.severity {
            Severity::Critical => "critical",
            Severity::Suggestion => "suggest",
            Severity::Info => "info",
        };
        println!("[{tag:>8}] {}", item.message);
    }

    let edits = report.suggested_edits();
    if !edits.is_empty() {
        println!();
        println!("Suggested edits:");
        for edit in edits {
            println!("  - {}", edit.original);
            println!("  + {}", edit.upgraded);
            println!("    {}", edit.reason);
        }
    }
}
