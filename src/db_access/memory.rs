use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Deserialize;

use super::{DeckStore, FetchedRow, PersistOutcome};
use crate::analysis::AnalysisMode;
use crate::error::{RowDecodeError, StoreError};
use crate::models::card::{CardSnapshot, DeckCardEntry, DeckCardRow};
use crate::models::deck::DeckRef;
use crate::models::deck_analysis::AnalysisRecord;

#[derive(Debug, Deserialize)]
struct FixtureCard {
    id: String,
    name: String,
    cmc: f64,
    type_line: String,
    #[serde(default)]
    mana_cost: String,
    #[serde(default)]
    oracle_text: String,
}

/// JSON layout accepted by `MemoryStore::load_fixture`.
#[derive(Debug, Deserialize)]
struct Fixture {
    decks: Vec<DeckRef>,
    cards: Vec<FixtureCard>,
    deck_cards: Vec<DeckCardEntry>,
}

/// In-process store with the same filter and upsert rules as the SurrealDB one.
#[derive(Default)]
pub struct MemoryStore {
    decks: Vec<DeckRef>,
    cards: HashMap<String, CardSnapshot>,
    entries: Vec<DeckCardEntry>,
    analyses: Mutex<BTreeMap<String, AnalysisRecord>>,
    failing_fetches: HashSet<String>,
    failing_writes: HashSet<String>,
    fail_selection: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn load_fixture(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&contents)?;

        let mut store = MemoryStore::new();
        for deck in fixture.decks {
            store.add_deck(&deck.id, &deck.name);
        }
        for card in fixture.cards {
            store.add_card(
                &card.id,
                CardSnapshot::from_catalog(
                    &card.name,
                    card.cmc,
                    &card.type_line,
                    &card.mana_cost,
                    &card.oracle_text,
                ),
            );
        }
        store.entries = fixture.deck_cards;
        Ok(store)
    }

    pub fn add_deck(&mut self, id: &str, name: &str) {
        self.decks.push(DeckRef::new(id, name));
    }

    pub fn add_card(&mut self, card_id: &str, card: CardSnapshot) {
        self.cards.insert(card_id.to_string(), card);
    }

    pub fn add_entry(&mut self, entry: DeckCardEntry) {
        self.entries.push(entry);
    }

    pub fn fail_fetch_for(&mut self, deck_id: &str) {
        self.failing_fetches.insert(deck_id.to_string());
    }

    pub fn fail_write_for(&mut self, deck_id: &str) {
        self.failing_writes.insert(deck_id.to_string());
    }

    pub fn fail_selection(&mut self) {
        self.fail_selection = true;
    }

    pub fn analysis(&self, deck_id: &str) -> Option<AnalysisRecord> {
        self.lock_analyses().ok()?.get(deck_id).cloned()
    }

    pub fn analysis_count(&self) -> usize {
        self.lock_analyses().map(|analyses| analyses.len()).unwrap_or(0)
    }

    fn lock_analyses(&self) -> Result<MutexGuard<'_, BTreeMap<String, AnalysisRecord>>, StoreError> {
        self.analyses
            .lock()
            .map_err(|_| StoreError::Backend("analysis table lock poisoned".to_string()))
    }
}

#[async_trait]
impl DeckStore for MemoryStore {
    async fn select_decks(&self, mode: AnalysisMode) -> Result<Vec<DeckRef>, StoreError> {
        if self.fail_selection {
            return Err(StoreError::Backend("deck selection unavailable".to_string()));
        }

        let analyses = self.lock_analyses()?;
        Ok(self
            .decks
            .iter()
            .filter(|deck| mode == AnalysisMode::Overwrite || !analyses.contains_key(&deck.id))
            .cloned()
            .collect())
    }

    async fn fetch_deck_cards(&self, deck_id: &str) -> Result<Vec<FetchedRow>, StoreError> {
        if self.failing_fetches.contains(deck_id) {
            return Err(StoreError::Backend(format!("card query failed for {}", deck_id)));
        }

        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.deck_id == deck_id && entry.section.counts_toward_analysis())
            .enumerate()
            .map(|(index, entry)| {
                self.cards
                    .get(&entry.card_id)
                    .map(|card| DeckCardRow {
                        card: card.clone(),
                        quantity: entry.quantity,
                    })
                    .ok_or_else(|| RowDecodeError {
                        index,
                        reason: format!("card {} not found in catalog", entry.card_id),
                    })
            })
            .collect())
    }

    async fn persist_analysis(
        &self,
        record: &AnalysisRecord,
        mode: AnalysisMode,
    ) -> Result<PersistOutcome, StoreError> {
        if self.failing_writes.contains(&record.deck_id) {
            return Err(StoreError::Backend(format!(
                "write rejected for {}",
                record.deck_id
            )));
        }

        let mut analyses = self.lock_analyses()?;
        match mode {
            AnalysisMode::FreshOnly if analyses.contains_key(&record.deck_id) => {
                Ok(PersistOutcome::Skipped)
            }
            _ => {
                analyses.insert(record.deck_id.clone(), record.clone());
                Ok(PersistOutcome::Written)
            }
        }
    }
}
