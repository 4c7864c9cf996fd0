use async_trait::async_trait;

use crate::analysis::AnalysisMode;
use crate::error::{RowDecodeError, StoreError};
use crate::models::card::DeckCardRow;
use crate::models::deck::DeckRef;
use crate::models::deck_analysis::AnalysisRecord;

pub mod memory;
pub mod surreal;

pub use memory::MemoryStore;
pub use surreal::SurrealStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Written,
    /// Fresh-only mode found an existing record and left it alone.
    Skipped,
}

pub type FetchedRow = Result<DeckCardRow, RowDecodeError>;

/// Read side of the card catalog plus the write side of `deck_analysis`.
#[async_trait]
pub trait DeckStore: Send + Sync {
    /// Decks lacking an analysis (fresh-only) or every deck (overwrite).
    async fn select_decks(&self, mode: AnalysisMode) -> Result<Vec<DeckRef>, StoreError>;

    /// Commander and mainboard cards of a deck, one entry per (card, quantity) pair.
    async fn fetch_deck_cards(&self, deck_id: &str) -> Result<Vec<FetchedRow>, StoreError>;

    async fn persist_analysis(
        &self,
        record: &AnalysisRecord,
        mode: AnalysisMode,
    ) -> Result<PersistOutcome, StoreError>;
}
