pub mod card;
pub mod deck;
pub mod deck_analysis;
