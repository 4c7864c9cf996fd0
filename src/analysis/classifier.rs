use std::collections::BTreeSet;

use regex::Regex;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::models::card::CardSnapshot;

/// Functional roles a card can be heuristically tagged with. Tags are not exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
pub enum RoleTag {
    Draw,
    Ramp,
    SingleTargetRemoval,
    MassRemoval,
    Counterspell,
    TokenGenerator,
    Recursion,
}

const DRAW_PHRASES: &[&str] = &[
    "draw a card",
    "you may draw",
    "then draw",
    "draw two",
    "draw x",
    "investigate",
];

const RAMP_PHRASES: &[&str] = &[
    "add {",
    "add one mana",
    "add two mana",
    "add three mana",
    "add an amount of mana",
    "search your library for a land",
    "create a treasure",
    "mana pool",
    "untap target land",
    "put a land card",
];

const SINGLE_TARGET_REMOVAL_PHRASES: &[&str] = &[
    "destroy target",
    "exile target",
    "damage to target",
    "fight target creature",
    "choose one or both",
];

const MASS_REMOVAL_PHRASES: &[&str] = &[
    "each creature",
    "all creatures",
    "all permanents",
    "destroy all",
    "exile all",
    "sacrifice all",
    "each opponent sacrifices",
];

const COUNTERSPELL_PHRASES: &[&str] = &["counter target", "unless its controller pays"];

const TOKEN_PHRASES: &[&str] = &["create a", "create a copy of", "token"];

const RECURSION_PHRASES: &[&str] = &[
    "return target",
    "from your graveyard",
    "escape",
    "retrace",
    "unearth",
    "eternalize",
    "disturb",
    "embalm",
    "delve",
    "undying",
    "persist",
];

impl RoleTag {
    /// Lower-case trigger phrases; any one of them tags the card.
    pub fn phrases(&self) -> &'static [&'static str] {
        match self {
            RoleTag::Draw => DRAW_PHRASES,
            RoleTag::Ramp => RAMP_PHRASES,
            RoleTag::SingleTargetRemoval => SINGLE_TARGET_REMOVAL_PHRASES,
            RoleTag::MassRemoval => MASS_REMOVAL_PHRASES,
            RoleTag::Counterspell => COUNTERSPELL_PHRASES,
            RoleTag::TokenGenerator => TOKEN_PHRASES,
            RoleTag::Recursion => RECURSION_PHRASES,
        }
    }
}

/// Whole-word, case-insensitive matcher: `mana` matches "mana-cost" but not "manacost".
/// Compile once and reuse; see the land patterns in `models::card`.
#[derive(Debug, Clone)]
pub struct WordPattern(Regex);

impl WordPattern {
    pub fn new(word: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).map(WordPattern)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

/// Plain substring test; callers lower-case both sides.
pub fn contains_any_phrase(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| text.contains(phrase))
}

pub fn classify(oracle_text: &str) -> BTreeSet<RoleTag> {
    let text = oracle_text.to_lowercase();
    RoleTag::iter()
        .filter(|tag| contains_any_phrase(&text, tag.phrases()))
        .collect()
}

/// Role tags for a card; lands never count as ramp.
pub fn classify_card(card: &CardSnapshot) -> BTreeSet<RoleTag> {
    let mut tags = classify(&card.oracle_text);
    if card.is_land {
        tags.remove(&RoleTag::Ramp);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_match(text: &str, word: &str) -> bool {
        WordPattern::new(word).unwrap().is_match(text)
    }

    #[test]
    fn test_word_match() {
        assert!(!word_match("The manacost is high", "mana"));
        assert!(word_match("Add one mana of any color", "mana"));
        assert!(word_match("Add One Mana of any color", "mana"));
        assert!(word_match("Check the mana-cost here", "mana"));
    }

    #[test]
    fn test_word_match_escapes_pattern() {
        assert!(word_match("pay {1} more", "1"));
        assert!(!word_match("a.b", "a*b"));
    }

    #[test]
    fn test_word_pattern_is_reusable() {
        let land = WordPattern::new("land").unwrap();
        assert!(land.is_match("Basic Land — Forest"));
        assert!(land.is_match("Artifact Land"));
        assert!(!land.is_match("Landfall"));
        assert!(!land.is_match("Creature — Elf"));
    }

    #[test]
    fn test_contains_any_phrase_is_case_sensitive() {
        assert!(contains_any_phrase(
            "draw a card and you may draw two",
            &["counter target", "draw a card"]
        ));
        assert!(!contains_any_phrase("Destroy target creature", &["destroy target creature"]));
        assert!(contains_any_phrase("Destroy target creature", &["Destroy target creature"]));
        assert!(contains_any_phrase("Destroy target creature", &["target creature", "random"]));
        assert!(!contains_any_phrase("Destroy target creature", &["destroy Target creature"]));
    }

    #[test]
    fn test_single_phrase_tags_only_its_role() {
        // Phrases chosen so they do not also trigger a sibling role.
        let samples = [
            (RoleTag::Draw, "Then Draw two."),
            (RoleTag::Ramp, "{T}: ADD {G}."),
            (RoleTag::SingleTargetRemoval, "Destroy Target artifact."),
            (RoleTag::MassRemoval, "Destroy All nonland permanents."),
            (RoleTag::Counterspell, "Counter Target spell."),
            (RoleTag::TokenGenerator, "Populate. The copy is a Token."),
            (RoleTag::Recursion, "Unearth {1}{R}"),
        ];

        for (expected, text) in samples {
            let tags = classify(text);
            assert!(tags.contains(&expected), "{text:?} should be {expected}");
            for other in RoleTag::iter().filter(|tag| *tag != expected) {
                assert!(!tags.contains(&other), "{text:?} should not be {other}");
            }
        }
    }

    #[test]
    fn test_every_listed_phrase_triggers_its_role() {
        for tag in RoleTag::iter() {
            for phrase in tag.phrases() {
                assert!(
                    classify(&phrase.to_uppercase()).contains(&tag),
                    "{phrase:?} should trigger {tag}"
                );
            }
        }
    }

    #[test]
    fn test_tags_accumulate_independently() {
        let tags = classify("Destroy target creature. Create a 1/1 white Soldier creature token.");
        assert!(tags.contains(&RoleTag::SingleTargetRemoval));
        assert!(tags.contains(&RoleTag::TokenGenerator));

        let wrath = classify("Destroy all creatures. Exile target card from a graveyard.");
        assert!(wrath.contains(&RoleTag::MassRemoval));
        assert!(wrath.contains(&RoleTag::SingleTargetRemoval));
    }

    #[test]
    fn test_empty_text_has_no_roles() {
        assert!(classify("").is_empty());
    }

    #[test]
    fn test_lands_are_never_ramp() {
        let land = CardSnapshot::from_catalog("Forest", 0.0, "Basic Land — Forest", "", "({T}: Add {G}.)");
        assert!(classify(&land.oracle_text).contains(&RoleTag::Ramp));
        assert!(!classify_card(&land).contains(&RoleTag::Ramp));

        let elf = CardSnapshot::from_catalog(
            "Llanowar Elves",
            1.0,
            "Creature — Elf Druid",
            "{G}",
            "{T}: Add {G}.",
        );
        assert!(classify_card(&elf).contains(&RoleTag::Ramp));
    }
}
