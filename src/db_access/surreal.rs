use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

use super::{DeckStore, FetchedRow, PersistOutcome};
use crate::analysis::AnalysisMode;
use crate::context::StoreConfig;
use crate::error::{RowDecodeError, StoreError};
use crate::models::card::{BoardSection, CardSnapshot, DeckCardRow};
use crate::models::deck::DeckRef;
use crate::models::deck_analysis::AnalysisRecord;
use crate::opt::{log_if, DbgFlg};

const ANALYSIS_TABLE: &str = "deck_analysis";

const SELECT_ALL_DECKS: &str = "SELECT record::id(id) AS id, name FROM deck";

const SELECT_UNANALYZED_DECKS: &str = "
    SELECT record::id(id) AS id, name FROM deck
    WHERE record::id(id) NOTINSIDE (SELECT VALUE deck_id FROM deck_analysis)
";

const SELECT_DECK_CARDS: &str = "
    SELECT card.name AS name, card.cmc AS cmc, card.type_line AS type_line,
           card.mana_cost AS mana_cost, card.oracle_text AS oracle_text, quantity
    FROM deck_card
    WHERE deck = type::thing('deck', $deck_id) AND board_type INSIDE $sections
";

// Leaves an existing row untouched; returns nothing in that case.
const INSERT_ANALYSIS_IF_ABSENT: &str =
    "INSERT IGNORE INTO deck_analysis $record RETURN deck_id";

// CONTENT replaces the whole record.
const UPSERT_ANALYSIS: &str =
    "UPSERT type::thing('deck_analysis', $deck_id) CONTENT $record RETURN deck_id";

/// What a write hands back; the record id stays on the server.
#[derive(Debug, Deserialize)]
struct WrittenRow {
    deck_id: String,
}

fn wrote(rows: &[WrittenRow], deck_id: &str) -> bool {
    rows.iter().any(|row| row.deck_id == deck_id)
}

/// Catalog columns joined onto a `deck_card` line.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    name: String,
    cmc: f64,
    type_line: String,
    #[serde(default)]
    mana_cost: Option<String>,
    #[serde(default)]
    oracle_text: Option<String>,
    quantity: u32,
}

impl From<CatalogRow> for DeckCardRow {
    fn from(row: CatalogRow) -> Self {
        DeckCardRow {
            card: CardSnapshot::from_catalog(
                &row.name,
                row.cmc,
                &row.type_line,
                row.mana_cost.as_deref().unwrap_or_default(),
                row.oracle_text.as_deref().unwrap_or_default(),
            ),
            quantity: row.quantity,
        }
    }
}

pub struct SurrealStore {
    db: Surreal<Any>,
}

impl SurrealStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        log::info!("Connecting to {}", config.connection);
        let db: Surreal<Any> = Surreal::init();
        db.connect(&config.connection).await?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            log::info!("Signing in as {}", username);
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(&config.namespace).use_db(&config.database).await?;

        Ok(SurrealStore { db })
    }
}

fn decode_rows(values: Vec<JsonValue>) -> Vec<FetchedRow> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value::<CatalogRow>(value)
                .map(DeckCardRow::from)
                .map_err(|err| RowDecodeError {
                    index,
                    reason: err.to_string(),
                })
        })
        .collect()
}

#[async_trait]
impl DeckStore for SurrealStore {
    async fn select_decks(&self, mode: AnalysisMode) -> Result<Vec<DeckRef>, StoreError> {
        let query = match mode {
            AnalysisMode::FreshOnly => SELECT_UNANALYZED_DECKS,
            AnalysisMode::Overwrite => SELECT_ALL_DECKS,
        };
        log_if(&format!("Selecting decks ({}): {}", mode, query.trim()), DbgFlg::Db);

        let mut response = self.db.query(query).await?;
        let decks: Vec<DeckRef> = response.take(0)?;
        Ok(decks)
    }

    async fn fetch_deck_cards(&self, deck_id: &str) -> Result<Vec<FetchedRow>, StoreError> {
        let sections = BoardSection::ANALYZED
            .iter()
            .map(|section| section.to_string())
            .collect::<Vec<String>>();
        log_if(&format!("Fetching cards of deck {}", deck_id), DbgFlg::Db);

        let mut response = self
            .db
            .query(SELECT_DECK_CARDS)
            .bind(("deck_id", deck_id.to_string()))
            .bind(("sections", sections))
            .await?;
        let values: Vec<JsonValue> = response.take(0)?;
        Ok(decode_rows(values))
    }

    async fn persist_analysis(
        &self,
        record: &AnalysisRecord,
        mode: AnalysisMode,
    ) -> Result<PersistOutcome, StoreError> {
        let mut content = serde_json::to_value(record)?;
        log_if(
            &format!("Writing {} row for deck {} ({})", ANALYSIS_TABLE, record.deck_id, mode),
            DbgFlg::Db,
        );

        match mode {
            AnalysisMode::FreshOnly => {
                if let JsonValue::Object(fields) = &mut content {
                    fields.insert("id".to_string(), JsonValue::String(record.deck_id.clone()));
                }
                let mut response = self
                    .db
                    .query(INSERT_ANALYSIS_IF_ABSENT)
                    .bind(("record", content))
                    .await?;
                let inserted: Vec<WrittenRow> = response.take(0)?;
                if wrote(&inserted, &record.deck_id) {
                    Ok(PersistOutcome::Written)
                } else {
                    Ok(PersistOutcome::Skipped)
                }
            }
            AnalysisMode::Overwrite => {
                let mut response = self
                    .db
                    .query(UPSERT_ANALYSIS)
                    .bind(("deck_id", record.deck_id.clone()))
                    .bind(("record", content))
                    .await?;
                let upserted: Vec<WrittenRow> = response.take(0)?;
                if wrote(&upserted, &record.deck_id) {
                    Ok(PersistOutcome::Written)
                } else {
                    Err(StoreError::Backend(format!(
                        "upsert of deck {} returned no row",
                        record.deck_id
                    )))
                }
            }
        }
    }
}
