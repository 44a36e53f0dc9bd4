//! SQLite-backed stores.
//!
//! Both stores open a connection per call; the connection is dropped on
//! every exit path.

pub mod articles;
pub mod vector;

pub use articles::SqliteArticleStore;
pub use vector::{EmbeddedSearch, SimilaritySearch, SqliteVectorStore, VectorHit, VectorRecord};

use lawqa_core::{AppError, AppResult};
use rusqlite::Connection;
use std::path::Path;

/// Open a database file, creating its parent directory first.
fn open_db(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Store(format!("Failed to create store directory: {}", e)))?;
    }

    Connection::open(db_path)
        .map_err(|e| AppError::Store(format!("Failed to open SQLite store {:?}: {}", db_path, e)))
}
