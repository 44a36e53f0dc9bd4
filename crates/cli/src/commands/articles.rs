//! Articles command handler.
//!
//! Reads the article store directly; no model or embedding client is built.

use anyhow::Context;
use clap::{Args, Subcommand};
use lawqa_core::AppConfig;
use lawqa_knowledge::config::get_article_store_path;
use lawqa_knowledge::store::SqliteArticleStore;
use lawqa_knowledge::types::DbArticle;
use lawqa_knowledge::{parse_statute, ArticleNumber};
use std::path::PathBuf;

/// Inspect statute articles
#[derive(Args, Debug)]
pub struct ArticlesCommand {
    #[command(subcommand)]
    pub action: ArticlesAction,
}

#[derive(Subcommand, Debug)]
pub enum ArticlesAction {
    /// List every stored article in article order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch the articles that cite the given numbers
    Find {
        /// Article numbers such as 17 or 17-1
        #[arg(required = true)]
        numbers: Vec<String>,
    },

    /// Parse a statute file and print the articles without storing them
    Parse {
        /// Statute text file
        file: PathBuf,
    },
}

impl ArticlesCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        match &self.action {
            ArticlesAction::List { json } => {
                let articles = open_store(config)?.list_all()?;
                if *json {
                    println!("{}", serde_json::to_string_pretty(&articles)?);
                } else {
                    print_articles(&articles);
                }
            }
            ArticlesAction::Find { numbers } => {
                let parsed = numbers
                    .iter()
                    .map(|n| {
                        ArticleNumber::parse(n)
                            .with_context(|| format!("Invalid article number '{}'", n))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;

                let articles = open_store(config)?.search_by_numbers(&parsed)?;
                print_articles(&articles);
            }
            ArticlesAction::Parse { file } => {
                let text = std::fs::read_to_string(file)
                    .with_context(|| format!("Failed to read statute file {:?}", file))?;
                let articles = parse_statute(&text);
                if articles.is_empty() {
                    anyhow::bail!("no articles found in {:?}", file);
                }
                println!("{}", serde_json::to_string_pretty(&articles)?);
            }
        }

        Ok(())
    }
}

fn open_store(config: &AppConfig) -> anyhow::Result<SqliteArticleStore> {
    let path = get_article_store_path(&config.workspace);
    SqliteArticleStore::open(&path)
        .with_context(|| format!("Failed to open article store {:?}", path))
}

fn print_articles(articles: &[DbArticle]) {
    if articles.is_empty() {
        println!("No articles found.");
        return;
    }

    for article in articles {
        let number = article.metadata["article"].as_str().unwrap_or("?");
        let chapter = &article.metadata["chapter"];
        println!("第 {} 條 (chapter {})", number, chapter);
        println!("{}", article.content);
        println!();
    }
}
