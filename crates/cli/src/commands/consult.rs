//! Consult command handler.

use anyhow::Context;
use clap::Args;
use lawqa_core::AppConfig;
use lawqa_knowledge::RagContext;
use std::path::PathBuf;

/// Answer a question from the complete statute text
#[derive(Args, Debug)]
pub struct ConsultCommand {
    /// The question to ask
    pub question: String,

    /// Statute text file to consult
    #[arg(long)]
    pub law: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ConsultCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let law_text = std::fs::read_to_string(&self.law)
            .with_context(|| format!("Failed to read statute file {:?}", self.law))?;

        let ctx = RagContext::from_app_config(config)
            .await
            .context("Failed to initialize retrieval context")?;

        let result = lawqa_knowledge::consult(&ctx, &self.question, &law_text).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("{}", result.answer);
        }

        Ok(())
    }
}
