use std::time::Duration;

use thiserror::Error;

/// Failures raised by a `DeckStore` implementation or by the guard around its calls.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store call cancelled")]
    Cancelled,

    #[error("Store error: {0}")]
    Backend(String),
}

/// A single fetched row that could not be turned into a `DeckCardRow`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("row {index}: {reason}")]
pub struct RowDecodeError {
    pub index: usize,
    pub reason: String,
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Skipping row in deck {deck_id}: {source}")]
    RowRead {
        deck_id: String,
        #[source]
        source: RowDecodeError,
    },

    #[error("Failed to fetch cards for deck {deck_id}: {source}")]
    DeckFetch {
        deck_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to persist analysis for deck {deck_id}: {source}")]
    Persist {
        deck_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to select decks for analysis: {0}")]
    BatchInit(#[source] StoreError),
}

impl AnalysisError {
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AnalysisError::DeckFetch { source: StoreError::Cancelled, .. }
                | AnalysisError::Persist { source: StoreError::Cancelled, .. }
                | AnalysisError::BatchInit(StoreError::Cancelled)
        )
    }
}
