//! Ask command handler.

use anyhow::Context;
use clap::Args;
use lawqa_core::AppConfig;
use lawqa_knowledge::types::DEFAULT_TOP_K;
use lawqa_knowledge::{FinalResult, RagContext, ReconciledHit};

/// Answer a question from the statute and Q&A stores
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Documents to retrieve per source (1-10)
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let ctx = RagContext::from_app_config(config)
            .await
            .context("Failed to initialize retrieval context")?;

        let result = lawqa_knowledge::ask(&ctx, &self.question, self.top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_result(&result);
        }

        Ok(())
    }
}

fn print_result(result: &FinalResult) {
    println!("{}", result.answer);

    if result.hit_references.is_empty() {
        return;
    }

    println!();
    println!("References:");
    for (i, hit) in result.hit_references.iter().enumerate() {
        match hit {
            ReconciledHit::Verified(reference) => {
                println!("  [{}] {}", i + 1, reference.metadata);
                let preview: String = reference.page_content.chars().take(80).collect();
                println!("      {}", preview.replace('\n', " "));
            }
            ReconciledHit::Unverified(raw) => {
                println!("  [{}] (unverified) {}", i + 1, raw);
            }
        }
    }
}
