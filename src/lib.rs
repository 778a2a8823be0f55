pub mod config;
pub mod flashcards;

pub use config::{Config, ConfigError};
pub use flashcards::{Card, CardId, Deck, DeckError};
