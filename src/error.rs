//! Error taxonomy for ingestion and storage.
//!
//! None of these abort a whole run: fetch/parse failures fall through to the
//! next strategy, storage failures skip one entry, and an exhausted chain
//! skips one source.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("fetch via {strategy} failed: {reason}")]
    Fetch {
        strategy: &'static str,
        reason: String,
    },

    #[error("parse via {strategy} failed: {reason}")]
    Parse {
        strategy: &'static str,
        reason: String,
    },

    #[error("all fetch strategies failed for {source_name}: {}", attempts.join("; "))]
    Exhausted {
        source_name: String,
        attempts: Vec<String>,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    pub fn fetch(strategy: &'static str, reason: impl ToString) -> Self {
        IngestError::Fetch {
            strategy,
            reason: reason.to_string(),
        }
    }

    pub fn parse(strategy: &'static str, reason: impl ToString) -> Self {
        IngestError::Parse {
            strategy,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
