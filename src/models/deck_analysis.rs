use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::RoleTag;
use crate::analysis::mana_cost::COLOR_SYMBOLS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub draw: u32,
    pub ramp: u32,
    pub single_target_removal: u32,
    pub mass_removal: u32,
    pub counterspell: u32,
    pub token: u32,
    pub recursion: u32,
}

impl RoleCounts {
    pub fn add(&mut self, tag: RoleTag, quantity: u32) {
        let counter = match tag {
            RoleTag::Draw => &mut self.draw,
            RoleTag::Ramp => &mut self.ramp,
            RoleTag::SingleTargetRemoval => &mut self.single_target_removal,
            RoleTag::MassRemoval => &mut self.mass_removal,
            RoleTag::Counterspell => &mut self.counterspell,
            RoleTag::TokenGenerator => &mut self.token,
            RoleTag::Recursion => &mut self.recursion,
        };
        *counter = counter.saturating_add(quantity);
    }
}

/// Per-deck summary produced by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckAnalysis {
    pub deck_id: String,
    pub roles: RoleCounts,
    pub average_mana_value: f64,
    pub highest_mana_value: f64,
    pub mana_curve: BTreeMap<u32, u32>,
    pub card_types: BTreeSet<String>,
    pub basic_land_count: u32,
    pub nonbasic_land_count: u32,
    pub land_count: u32,
    pub color_symbol_counts: BTreeMap<String, u32>,
}

impl DeckAnalysis {
    pub fn empty(deck_id: &str) -> Self {
        DeckAnalysis {
            deck_id: deck_id.to_string(),
            roles: RoleCounts::default(),
            average_mana_value: 0.0,
            highest_mana_value: 0.0,
            mana_curve: BTreeMap::new(),
            card_types: BTreeSet::new(),
            basic_land_count: 0,
            nonbasic_land_count: 0,
            land_count: 0,
            color_symbol_counts: COLOR_SYMBOLS
                .iter()
                .map(|symbol| (symbol.to_string(), 0))
                .collect(),
        }
    }
}

/// Storage form of a `DeckAnalysis`: one row in `deck_analysis`, map fields as JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub deck_id: String,
    pub draw_count: u32,
    pub ramp_count: u32,
    pub single_target_removal_count: u32,
    pub mass_removal_count: u32,
    pub counterspell_count: u32,
    pub token_count: u32,
    pub recursion_count: u32,
    pub average_mana_value: f64,
    pub highest_mana_value: f64,
    pub mana_curve: String,
    pub card_types: String,
    pub color_symbols: String,
    pub basic_land_count: u32,
    pub nonbasic_land_count: u32,
    pub land_count: u32,
    pub analyzed_at: String,
}

impl AnalysisRecord {
    pub fn encode(analysis: &DeckAnalysis) -> Result<Self, serde_json::Error> {
        let roles = &analysis.roles;
        Ok(AnalysisRecord {
            deck_id: analysis.deck_id.clone(),
            draw_count: roles.draw,
            ramp_count: roles.ramp,
            single_target_removal_count: roles.single_target_removal,
            mass_removal_count: roles.mass_removal,
            counterspell_count: roles.counterspell,
            token_count: roles.token,
            recursion_count: roles.recursion,
            average_mana_value: analysis.average_mana_value,
            highest_mana_value: analysis.highest_mana_value,
            mana_curve: serde_json::to_string(&analysis.mana_curve)?,
            card_types: serde_json::to_string(&analysis.card_types)?,
            color_symbols: serde_json::to_string(&analysis.color_symbol_counts)?,
            basic_land_count: analysis.basic_land_count,
            nonbasic_land_count: analysis.nonbasic_land_count,
            land_count: analysis.land_count,
            analyzed_at: utc_now(),
        })
    }

    pub fn decode(&self) -> Result<DeckAnalysis, serde_json::Error> {
        Ok(DeckAnalysis {
            deck_id: self.deck_id.clone(),
            roles: RoleCounts {
                draw: self.draw_count,
                ramp: self.ramp_count,
                single_target_removal: self.single_target_removal_count,
                mass_removal: self.mass_removal_count,
                counterspell: self.counterspell_count,
                token: self.token_count,
                recursion: self.recursion_count,
            },
            average_mana_value: self.average_mana_value,
            highest_mana_value: self.highest_mana_value,
            mana_curve: serde_json::from_str(&self.mana_curve)?,
            card_types: serde_json::from_str(&self.card_types)?,
            basic_land_count: self.basic_land_count,
            nonbasic_land_count: self.nonbasic_land_count,
            land_count: self.land_count,
            color_symbol_counts: serde_json::from_str(&self.color_symbols)?,
        })
    }
}

fn utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> DeckAnalysis {
        let mut analysis = DeckAnalysis::empty("deck-1");
        analysis.roles.add(RoleTag::Draw, 2);
        analysis.roles.add(RoleTag::SingleTargetRemoval, 1);
        analysis.average_mana_value = 8.0 / 3.0;
        analysis.highest_mana_value = 4.0;
        analysis.mana_curve = BTreeMap::from([(4, 1), (2, 2)]);
        analysis.card_types = BTreeSet::from(["Sorcery".to_string(), "Instant".to_string()]);
        analysis.land_count = 10;
        analysis.basic_land_count = 10;
        analysis.color_symbol_counts.insert("U".to_string(), 2);
        analysis.color_symbol_counts.insert("B".to_string(), 1);
        analysis
    }

    #[test]
    fn test_empty_analysis_has_all_color_keys() {
        let analysis = DeckAnalysis::empty("d");
        assert_eq!(analysis.color_symbol_counts.len(), 6);
        assert!(analysis.color_symbol_counts.values().all(|count| *count == 0));
        assert!(analysis.mana_curve.is_empty());
    }

    #[test]
    fn test_role_counts_saturate() {
        let mut roles = RoleCounts::default();
        roles.add(RoleTag::Draw, u32::MAX);
        roles.add(RoleTag::Draw, 4);
        assert_eq!(roles.draw, u32::MAX);
        assert_eq!(roles.ramp, 0);
    }

    #[test]
    fn test_encoded_maps_are_stable_text() {
        let record = AnalysisRecord::encode(&sample()).unwrap();
        assert_eq!(record.mana_curve, r#"{"2":2,"4":1}"#);
        assert_eq!(record.card_types, r#"["Instant","Sorcery"]"#);
        assert_eq!(
            record.color_symbols,
            r#"{"B":1,"C":0,"G":0,"R":0,"U":2,"W":0}"#
        );

        let again = AnalysisRecord::encode(&record.decode().unwrap()).unwrap();
        assert_eq!(again.mana_curve, record.mana_curve);
        assert_eq!(again.card_types, record.card_types);
        assert_eq!(again.color_symbols, record.color_symbols);
    }

    #[test]
    fn test_decode_restores_every_field() {
        let analysis = sample();
        let record = AnalysisRecord::encode(&analysis).unwrap();
        assert_eq!(record.decode().unwrap(), analysis);
    }
}
