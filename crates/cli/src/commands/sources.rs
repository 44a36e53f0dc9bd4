//! Sources command handler.

use clap::Args;
use lawqa_core::AppConfig;
use lawqa_knowledge::SourceLedger;

/// List recorded ingestion runs
#[derive(Args, Debug)]
pub struct SourcesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SourcesCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let sources = SourceLedger::new(&config.workspace).list()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&sources)?);
            return Ok(());
        }

        if sources.is_empty() {
            println!("No sources ingested yet.");
            return Ok(());
        }

        for source in &sources {
            println!(
                "{}  {:<9} {:<10} {:>5} records  {}",
                source.indexed_at.format("%Y-%m-%d %H:%M:%S"),
                source.kind,
                source.source_tag,
                source.record_count,
                source.path
            );
        }

        Ok(())
    }
}
