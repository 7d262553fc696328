//! Command-line entry point: one subcommand per verb (spec.md §6), plus a
//! `completion` subcommand, following the teacher's `memory-cli/src/main.rs`
//! shape (global `--config`/`--format`/`--verbose`, a `Commands` enum, one
//! `handle_*` function per subcommand).

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use memory_core::{AskMode, AugmentOperation, Configuration, PanParams, TellContentType, TemporalRange, Tilt, VerbResult, Zoom};
use memory_cli::bootstrap::{build_verbs_service, save_json_snapshot};
use memory_cli::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "memory-cli")]
#[command(about = "Command-line interface for the semantic memory engine")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file path (TOML, spec.md §6).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Store a new interaction, document, or concept.
    Tell {
        content: String,
        #[arg(long, default_value = "interaction")]
        content_type: String,
        #[arg(long)]
        lazy: bool,
    },
    /// Ask a question, optionally routed through the enhancement pipelines.
    Ask {
        question: String,
        #[arg(long, default_value = "standard")]
        mode: String,
        #[arg(long)]
        use_hyde: bool,
        #[arg(long)]
        use_wikipedia: bool,
        #[arg(long)]
        use_wikidata: bool,
        #[arg(long)]
        use_web_search: bool,
    },
    /// Run one of the ten augment operations over an existing target.
    Augment { target: String, operation: AugmentOperation },
    /// Change the ZPT zoom level.
    Zoom {
        level: Zoom,
        #[arg(long)]
        query: Option<String>,
    },
    /// Replace the ZPT pan filters.
    Pan {
        #[arg(long = "domain")]
        domains: Vec<String>,
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        #[arg(long)]
        temporal_start: Option<String>,
        #[arg(long)]
        temporal_end: Option<String>,
    },
    /// Change the ZPT tilt style.
    Tilt {
        style: Tilt,
        #[arg(long)]
        query: Option<String>,
    },
    /// Read-only retrieval over the current store.
    Recall { query: String },
    /// Inspect session, store, or a single interaction.
    Inspect {
        #[arg(default_value = "session")]
        kind: String,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        include_recommendations: bool,
    },
    /// Generate a shell completion script.
    Completion {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Commands::Completion { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "memory-cli", &mut std::io::stdout());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Configuration::from_toml(&std::fs::read_to_string(path)?)?,
        None => Configuration::default(),
    };
    config.validate()?;

    let wired = build_verbs_service(&config)?;
    let now_ms = chrono::Utc::now().timestamp_millis();

    let result: VerbResult = match cli.command {
        Commands::Tell { content, content_type, lazy } => {
            let content_type = parse_enum::<TellContentType>(&content_type)?;
            wired.verbs.tell(&content, content_type, lazy, now_ms).await
        }
        Commands::Ask { question, mode, use_hyde, use_wikipedia, use_wikidata, use_web_search } => {
            let mode = parse_enum::<AskMode>(&mode)?;
            wired.verbs.ask(&question, mode, use_hyde, use_wikipedia, use_wikidata, use_web_search, now_ms).await
        }
        Commands::Augment { target, operation } => wired.verbs.augment(&target, operation, now_ms).await,
        Commands::Zoom { level, query } => wired.verbs.zoom(level, query.as_deref(), now_ms).await,
        Commands::Pan { domains, keywords, temporal_start, temporal_end } => {
            let temporal = match (temporal_start, temporal_end) {
                (Some(start), Some(end)) => Some(TemporalRange { start, end }),
                _ => None,
            };
            let domains = (!domains.is_empty()).then_some(domains);
            let keywords = (!keywords.is_empty()).then_some(keywords);
            wired.verbs.pan(PanParams { domains, keywords, temporal }, now_ms).await
        }
        Commands::Tilt { style, query } => wired.verbs.tilt(style, query.as_deref(), now_ms).await,
        Commands::Recall { query } => wired.verbs.recall(&query, now_ms).await,
        Commands::Inspect { kind, target, include_recommendations } => {
            wired.verbs.inspect(&kind, target.as_deref(), include_recommendations)
        }
        Commands::Completion { .. } => unreachable!("handled above"),
    };

    cli.format.print(&serde_json::to_value(&result)?);
    save_json_snapshot(&config, &wired.store)?;
    Ok(())
}

/// Parse one of the lowercase-tagged enums (`AskMode`, `TellContentType`)
/// that don't implement `FromStr` in `memory_core`, by routing through the
/// same serde representation the verb API itself uses.
fn parse_enum<T: serde::de::DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_lowercase()))
        .map_err(|_| anyhow::anyhow!("invalid value: {raw}"))
}
