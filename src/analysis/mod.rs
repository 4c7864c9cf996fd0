use std::fmt::{self, Display, Formatter};
use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use itertools::Itertools;
use strum_macros::EnumString;
use tokio_util::sync::CancellationToken;

use crate::context::EngineConfig;
use crate::db_access::{DeckStore, PersistOutcome};
use crate::error::{AnalysisError, RowDecodeError, StoreError};
use crate::models::deck::DeckRef;
use crate::models::deck_analysis::AnalysisRecord;
use crate::opt::{log_if, DbgFlg};

pub mod aggregator;
pub mod classifier;
pub mod mana_cost;

use aggregator::DeckAggregator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, strum_macros::Display)]
pub enum AnalysisMode {
    /// Only decks without a stored analysis; existing rows are never touched.
    #[strum(serialize = "fresh-only")]
    FreshOnly,
    /// Every deck; each stored row is replaced whole.
    #[strum(serialize = "overwrite")]
    Overwrite,
}

#[derive(Debug)]
enum DeckOutcome {
    Written { rows_skipped: usize },
    Skipped { rows_skipped: usize },
    Failed(AnalysisError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub selected: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rows_skipped: usize,
    pub cancelled: bool,
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{} selected, {} written, {} skipped, {} failed, {} rows skipped{}",
            self.selected,
            self.written,
            self.skipped,
            self.failed,
            self.rows_skipped,
            if self.cancelled { " (cancelled)" } else { "" }
        )
    }
}

pub struct AnalysisEngine<S: DeckStore> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: DeckStore> AnalysisEngine<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        AnalysisEngine { store, config }
    }

    /// Runs one analysis pass. Only a failed deck selection is returned as an error;
    /// per-deck failures are logged and counted in the report.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<BatchReport, AnalysisError> {
        let mode = self.config.mode;
        let decks = self
            .guarded(cancel, self.store.select_decks(mode))
            .await
            .map_err(AnalysisError::BatchInit)?;

        let decks = decks
            .into_iter()
            .unique_by(|deck| deck.id.clone())
            .collect::<Vec<DeckRef>>();
        log::info!("Selected {} decks for analysis ({})", decks.len(), mode);

        let mut report = BatchReport {
            selected: decks.len(),
            ..BatchReport::default()
        };

        let outcomes = stream::iter(decks)
            .map(|deck| self.analyze_deck(deck, cancel))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect::<Vec<DeckOutcome>>()
            .await;

        for outcome in outcomes {
            match outcome {
                DeckOutcome::Written { rows_skipped } => {
                    report.written += 1;
                    report.rows_skipped += rows_skipped;
                }
                DeckOutcome::Skipped { rows_skipped } => {
                    report.skipped += 1;
                    report.rows_skipped += rows_skipped;
                }
                DeckOutcome::Failed(err) => {
                    if err.is_cancelled() {
                        report.cancelled = true;
                    }
                    report.failed += 1;
                }
            }
        }

        report.cancelled |= cancel.is_cancelled();
        log::info!("Analysis pass finished: {}", report);
        Ok(report)
    }

    async fn analyze_deck(&self, deck: DeckRef, cancel: &CancellationToken) -> DeckOutcome {
        match self.try_analyze_deck(&deck, cancel).await {
            Ok(outcome) => outcome,
            Err(err) => {
                if err.is_cancelled() {
                    log::warn!("{}", err);
                } else {
                    log::error!("{}", err);
                }
                DeckOutcome::Failed(err)
            }
        }
    }

    async fn try_analyze_deck(
        &self,
        deck: &DeckRef,
        cancel: &CancellationToken,
    ) -> Result<DeckOutcome, AnalysisError> {
        log::info!("Analyzing deck: {}", deck);

        let rows = self
            .guarded(cancel, self.store.fetch_deck_cards(&deck.id))
            .await
            .map_err(|source| AnalysisError::DeckFetch {
                deck_id: deck.id.clone(),
                source,
            })?;

        let mut aggregator = DeckAggregator::new(&deck.id);
        let mut rows_skipped = 0;
        for (index, row) in rows.into_iter().enumerate() {
            let checked = row.and_then(|row| {
                DeckAggregator::validate(&row)
                    .map(|_| row)
                    .map_err(|reason| RowDecodeError { index, reason })
            });
            match checked {
                Ok(row) => {
                    log_if(&format!("{}: {}", deck.id, row), DbgFlg::Analysis);
                    aggregator.add_row(&row);
                }
                Err(source) => {
                    rows_skipped += 1;
                    log::warn!(
                        "{}",
                        AnalysisError::RowRead {
                            deck_id: deck.id.clone(),
                            source,
                        }
                    );
                }
            }
        }
        let analysis = aggregator.finish();

        let persist_err = |source: StoreError| AnalysisError::Persist {
            deck_id: deck.id.clone(),
            source,
        };
        let record = AnalysisRecord::encode(&analysis)
            .map_err(|err| persist_err(StoreError::Serialization(err)))?;
        if cancel.is_cancelled() {
            return Err(persist_err(StoreError::Cancelled));
        }
        // A started write may already be committed, so it is only bounded by the deadline.
        let outcome = self
            .bounded(self.store.persist_analysis(&record, self.config.mode))
            .await
            .map_err(persist_err)?;

        Ok(match outcome {
            PersistOutcome::Written => DeckOutcome::Written { rows_skipped },
            PersistOutcome::Skipped => {
                log::info!("Deck {} already has an analysis, left unchanged", deck.id);
                DeckOutcome::Skipped { rows_skipped }
            }
        })
    }

    /// Bounds a store call by the configured deadline and the caller's cancellation.
    async fn guarded<T, F>(&self, cancel: &CancellationToken, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StoreError::Cancelled),
            result = self.bounded(call) => result,
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let timeout = self.config.query_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| Err(StoreError::Timeout(timeout)))
    }
}
