//! Ingestion ledger.
//!
//! Every ingestion run appends one line to `.lawqa/store/sources.jsonl`.

use crate::config;
use crate::types::KnowledgeSource;
use lawqa_core::{AppError, AppResult};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Append-only record of ingestion runs for a workspace.
#[derive(Debug, Clone)]
pub struct SourceLedger {
    path: PathBuf,
}

impl SourceLedger {
    pub fn new(workspace: &Path) -> Self {
        Self {
            path: config::get_sources_path(workspace),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one run and flush it to disk.
    pub fn record(&self, source: &KnowledgeSource) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open sources.jsonl: {}", e)))?;

        let json_line = serde_json::to_string(source)?;

        writeln!(file, "{}", json_line).map_err(|e| {
            AppError::Knowledge(format!("Failed to write to sources.jsonl: {}", e))
        })?;

        file.sync_all()
            .map_err(|e| AppError::Knowledge(format!("Failed to sync sources.jsonl: {}", e)))?;

        tracing::debug!(source_id = %source.source_id, tag = %source.source_tag, "Recorded ingestion run");
        Ok(())
    }

    /// All recorded runs, oldest first.
    pub fn list(&self) -> AppResult<Vec<KnowledgeSource>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open sources.jsonl: {}", e)))?;

        let mut sources = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                AppError::Knowledge(format!("Failed to read line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let source: KnowledgeSource = serde_json::from_str(&line).map_err(|e| {
                AppError::Knowledge(format!(
                    "Failed to parse line {} in sources.jsonl: {}",
                    line_num + 1,
                    e
                ))
            })?;
            sources.push(source);
        }

        Ok(sources)
    }

    /// Forget every recorded run.
    pub fn clear(&self) -> AppResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| {
                AppError::Knowledge(format!("Failed to delete sources.jsonl: {}", e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(id: &str, tag: &str) -> KnowledgeSource {
        KnowledgeSource {
            source_id: id.to_string(),
            path: format!("{}.txt", id),
            source_tag: tag.to_string(),
            kind: "documents".to_string(),
            indexed_at: chrono::Utc::now(),
            record_count: 3,
            byte_count: 120,
        }
    }

    #[test]
    fn test_record_and_list_in_order() {
        let temp = TempDir::new().unwrap();
        let ledger = SourceLedger::new(temp.path());

        ledger.record(&source("one", "labor_law")).unwrap();
        ledger.record(&source("two", "qa")).unwrap();

        let sources = ledger.list().unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_id, "one");
        assert_eq!(sources[1].source_tag, "qa");
        assert!(ledger.path().ends_with(".lawqa/store/sources.jsonl"));
    }

    #[test]
    fn test_list_empty_when_no_file() {
        let temp = TempDir::new().unwrap();
        assert!(SourceLedger::new(temp.path()).list().unwrap().is_empty());
    }

    #[test]
    fn test_clear_removes_ledger() {
        let temp = TempDir::new().unwrap();
        let ledger = SourceLedger::new(temp.path());
        ledger.record(&source("one", "qa")).unwrap();

        ledger.clear().unwrap();
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_corrupt_line_reports_line_number() {
        let temp = TempDir::new().unwrap();
        let ledger = SourceLedger::new(temp.path());
        ledger.record(&source("one", "qa")).unwrap();
        let mut file = OpenOptions::new().append(true).open(ledger.path()).unwrap();
        writeln!(file, "not json").unwrap();

        let err = ledger.list().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
