use crate::analysis::classifier::classify_card;
use crate::analysis::mana_cost::parse_pips;
use crate::models::card::DeckCardRow;
use crate::models::deck_analysis::DeckAnalysis;

/// Folds a deck's card rows into a `DeckAnalysis`. Every count scales by quantity
/// and saturates at `u32::MAX` instead of wrapping.
#[derive(Debug, Clone)]
pub struct DeckAggregator {
    analysis: DeckAnalysis,
    mana_value_sum: f64,
    non_land_quantity: u32,
}

impl DeckAggregator {
    pub fn new(deck_id: &str) -> Self {
        DeckAggregator {
            analysis: DeckAnalysis::empty(deck_id),
            mana_value_sum: 0.0,
            non_land_quantity: 0,
        }
    }

    /// Rejects rows the fold cannot use. Returns the reason for the caller to log.
    pub fn validate(row: &DeckCardRow) -> Result<(), String> {
        if row.quantity == 0 {
            return Err(format!("{} has quantity 0", row.card.name));
        }
        if !row.card.cmc.is_finite() || row.card.cmc < 0.0 {
            return Err(format!("{} has invalid mana value {}", row.card.name, row.card.cmc));
        }
        Ok(())
    }

    pub fn add_row(&mut self, row: &DeckCardRow) {
        let card = &row.card;
        let quantity = row.quantity;
        let analysis = &mut self.analysis;

        for tag in classify_card(card) {
            analysis.roles.add(tag, quantity);
        }

        if card.is_land {
            analysis.land_count = analysis.land_count.saturating_add(quantity);
            if card.is_basic_land {
                analysis.basic_land_count = analysis.basic_land_count.saturating_add(quantity);
            } else {
                analysis.nonbasic_land_count = analysis.nonbasic_land_count.saturating_add(quantity);
            }
            return;
        }

        self.mana_value_sum += card.cmc * f64::from(quantity);
        self.non_land_quantity = self.non_land_quantity.saturating_add(quantity);
        let bucket = analysis
            .mana_curve
            .entry(card.cmc.floor() as u32)
            .or_insert(0);
        *bucket = bucket.saturating_add(quantity);
        if card.cmc > analysis.highest_mana_value {
            analysis.highest_mana_value = card.cmc;
        }

        for (symbol, count) in parse_pips(&card.mana_cost).color_counts() {
            let pips = analysis
                .color_symbol_counts
                .entry(symbol.to_string())
                .or_insert(0);
            *pips = pips.saturating_add(count.saturating_mul(quantity));
        }

        for token in card.type_line.split_whitespace() {
            if token.chars().next().is_some_and(char::is_uppercase) {
                analysis.card_types.insert(token.to_string());
            }
        }
    }

    pub fn finish(self) -> DeckAnalysis {
        let mut analysis = self.analysis;
        analysis.average_mana_value = if self.non_land_quantity > 0 {
            self.mana_value_sum / f64::from(self.non_land_quantity)
        } else {
            0.0
        };
        analysis
    }
}

pub fn aggregate<'a, I>(deck_id: &str, rows: I) -> DeckAnalysis
where
    I: IntoIterator<Item = &'a DeckCardRow>,
{
    let mut aggregator = DeckAggregator::new(deck_id);
    for row in rows {
        aggregator.add_row(row);
    }
    aggregator.finish()
}
