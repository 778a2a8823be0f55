//! Flashcard decks with SM-2 scheduling
//!
//! This module provides:
//! - Card model with per-review easiness and hardness history
//! - SM-2 variant scheduling (interval and easiness computation)
//! - SQLite deck storage with atomic sync

pub mod algorithm;
pub mod models;
pub mod storage;

pub use models::*;
pub use storage::{Deck, DeckError, HistoryKind};
