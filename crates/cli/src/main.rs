//! Labor-law question answering CLI.
//!
//! Main entry point for the `lawqa` command-line tool.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{ArticlesCommand, AskCommand, ConsultCommand, IngestCommand, SourcesCommand};
use lawqa_core::{config::AppConfig, logging, logging::LogFormat};
use std::path::PathBuf;
use tracing::Instrument;

/// Answer labor-law questions from statute text and curated Q&A
#[derive(Parser, Debug)]
#[command(name = "lawqa")]
#[command(about = "Answer labor-law questions with retrieval-augmented generation", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "LAWQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "LAWQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log line format (pretty, json)
    #[arg(long, global = true, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider
    #[arg(short, long, global = true, env = "LAWQA_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "LAWQA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question from the statute and Q&A stores
    Ask(AskCommand),

    /// Answer a question from the complete statute text
    Consult(ConsultCommand),

    /// Load statute text or documents into the stores
    Ingest(IngestCommand),

    /// Inspect statute articles
    Articles(ArticlesCommand),

    /// List recorded ingestion runs
    Sources(SourcesCommand),
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}' (pretty, json)", s))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())
        .context("Failed to load configuration")?
        .with_overrides(
            cli.workspace,
            cli.config,
            cli.provider,
            cli.model,
            cli.log_level,
            cli.log_format,
            cli.verbose,
            cli.no_color,
        );

    logging::init_logging(config.log_level.as_deref(), config.log_format, config.no_color)?;
    config.validate()?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_lawqa_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Consult(_) => "consult",
        Commands::Ingest(_) => "ingest",
        Commands::Articles(_) => "articles",
        Commands::Sources(_) => "sources",
    };
    let span = tracing::info_span!("command", name = command_name);

    let result = async {
        match cli.command {
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Consult(cmd) => cmd.execute(&config).await,
            Commands::Ingest(cmd) => cmd.execute(&config).await,
            Commands::Articles(cmd) => cmd.execute(&config),
            Commands::Sources(cmd) => cmd.execute(&config),
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
