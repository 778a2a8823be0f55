//! Data models for the flashcard deck

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a card within its deck
pub type CardId = u32;

/// A prompt/answer pair together with its review history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub prompt: String,
    pub answer: String,
    /// Number of completed reviews
    pub repetitions: u32,
    /// Earliest instant the card may be reviewed again
    pub next_due: DateTime<Utc>,
    /// Easiness factor recorded by each review, indexed by `repetitions - 1`
    #[serde(default)]
    pub easiness_history: Vec<f64>,
    /// Hardness rating given at each review, indexed by `repetitions - 1`
    #[serde(default)]
    pub hardness_history: Vec<i32>,
    /// Current interval in days, I(repetitions)
    #[serde(default)]
    pub interval_days: f64,
}

impl Card {
    /// A fresh card, due immediately. The deck assigns its id on insertion.
    pub fn new(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: 0,
            prompt: prompt.into(),
            answer: answer.into(),
            repetitions: 0,
            next_due: Utc::now(),
            easiness_history: Vec::new(),
            hardness_history: Vec::new(),
            interval_days: 0.0,
        }
    }

    /// Check if the card is due for review at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_due
    }

    /// Easiness recorded by the most recent review
    pub fn easiness(&self) -> Option<f64> {
        self.easiness_history.last().copied()
    }

    /// Hardness given at the most recent review
    pub fn last_hardness(&self) -> Option<i32> {
        self.hardness_history.last().copied()
    }
}
