use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

/// Symbols tracked in the deck-level color distribution.
pub const COLOR_SYMBOLS: [&str; 6] = ["W", "U", "B", "R", "G", "C"];

lazy_static! {
    static ref MANA_SYMBOL: Regex = Regex::new(r"\{(.*?)\}").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManaPips {
    pub total: u32,
    pub symbols: BTreeMap<String, u32>,
}

impl ManaPips {
    /// Counts for W/U/B/R/G/C only, skipping generic, X and Phyrexian parts.
    pub fn color_counts(&self) -> BTreeMap<&'static str, u32> {
        COLOR_SYMBOLS
            .iter()
            .filter_map(|symbol| self.symbols.get(*symbol).map(|count| (*symbol, *count)))
            .collect()
    }
}

/// Counts every `{...}` part of a cost. Hybrid `{U/B}` counts once per side.
pub fn parse_pips(mana_cost: &str) -> ManaPips {
    let mut pips = ManaPips::default();
    for token in MANA_SYMBOL.captures_iter(mana_cost) {
        let contents = token[1].to_uppercase();
        for part in contents.split('/').filter(|part| !part.is_empty()) {
            *pips.symbols.entry(part.to_string()).or_insert(0) += 1;
            pips.total += 1;
        }
    }
    pips
}
