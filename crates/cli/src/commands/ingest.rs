//! Ingest command handler.

use anyhow::Context;
use clap::{Args, Subcommand};
use lawqa_core::AppConfig;
use lawqa_knowledge::{IngestStats, RagContext};
use std::path::PathBuf;

/// Load statute text or documents into the stores
#[derive(Args, Debug)]
pub struct IngestCommand {
    #[command(subcommand)]
    pub action: IngestAction,
}

#[derive(Subcommand, Debug)]
pub enum IngestAction {
    /// Parse a statute file into articles and embed them
    Statute {
        /// Statute text file
        file: PathBuf,

        /// Clear stored articles and statute vectors first
        #[arg(long)]
        reset: bool,
    },

    /// Chunk and embed every text file under a directory
    Docs {
        /// Directory to walk
        dir: PathBuf,

        /// Retrieval source tag for the stored chunks
        #[arg(long)]
        source: String,

        /// Clear vectors with the same source tag first
        #[arg(long)]
        reset: bool,
    },
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let ctx = RagContext::from_app_config(config)
            .await
            .context("Failed to initialize retrieval context")?;

        let stats = match &self.action {
            IngestAction::Statute { file, reset } => {
                lawqa_knowledge::ingest_statute(&ctx, file, *reset)
                    .await
                    .with_context(|| format!("Failed to ingest statute {:?}", file))?
            }
            IngestAction::Docs { dir, source, reset } => {
                lawqa_knowledge::ingest_documents(&ctx, dir, source, *reset)
                    .await
                    .with_context(|| format!("Failed to ingest documents from {:?}", dir))?
            }
        };

        print_stats(&stats);
        Ok(())
    }
}

fn print_stats(stats: &IngestStats) {
    if stats.articles > 0 {
        println!(
            "Stored {} articles, embedded {} records ({} bytes) in {:.2}s",
            stats.articles, stats.embedded, stats.bytes_processed, stats.duration_secs
        );
    } else {
        println!(
            "Embedded {} records ({} bytes) in {:.2}s",
            stats.embedded, stats.bytes_processed, stats.duration_secs
        );
    }
}
