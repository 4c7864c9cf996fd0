use std::fmt::{self, Display, Formatter};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;

use crate::analysis::classifier::WordPattern;

lazy_static! {
    static ref LAND_WORD: WordPattern = WordPattern::new("land").unwrap();
    static ref BASIC_WORD: WordPattern = WordPattern::new("basic").unwrap();
}

/// Read-only view of a catalog card, as far as deck analysis cares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSnapshot {
    pub name: String,
    pub cmc: f64,
    pub type_line: String,
    #[serde(default)]
    pub mana_cost: String,
    #[serde(default)]
    pub oracle_text: String,
    pub is_land: bool,
    pub is_basic_land: bool,
}

impl CardSnapshot {
    /// Builds a snapshot from raw catalog columns, deriving the land flags from the type line.
    pub fn from_catalog(
        name: &str,
        cmc: f64,
        type_line: &str,
        mana_cost: &str,
        oracle_text: &str,
    ) -> Self {
        CardSnapshot {
            name: name.to_string(),
            cmc,
            type_line: type_line.to_string(),
            mana_cost: mana_cost.to_string(),
            oracle_text: oracle_text.to_string(),
            is_land: LAND_WORD.is_match(type_line),
            is_basic_land: BASIC_WORD.is_match(type_line),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BoardSection {
    Commander,
    Mainboard,
    Sideboard,
    Maybeboard,
}

impl BoardSection {
    pub const ANALYZED: [BoardSection; 2] = [BoardSection::Commander, BoardSection::Mainboard];

    pub fn counts_toward_analysis(&self) -> bool {
        BoardSection::ANALYZED.contains(self)
    }
}

/// One deck-list line as the importer stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckCardEntry {
    pub deck_id: String,
    pub card_id: String,
    pub quantity: u32,
    #[serde(rename = "board_type")]
    pub section: BoardSection,
}

/// A card with its multiplicity in a deck, restricted to analyzed sections.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckCardRow {
    pub card: CardSnapshot,
    pub quantity: u32,
}

impl Display for DeckCardRow {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}x {} [{}]", self.quantity, self.card.name, self.card.type_line)
    }
}
