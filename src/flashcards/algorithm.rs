//! SM-2 Spaced Repetition Algorithm
//!
//! A variant of SuperMemo 2. Each review records a hardness rating (1-5)
//! and an easiness factor, and pushes the card's due date out by the
//! interval I(n), where n is the number of reviews so far:
//!
//! - I(1) = 1 day
//! - I(2) = 4 days
//! - I(n) = I(n-1) * EF(n) for n > 2
//!
//! The first two reviews record the default easiness of 1.75. Later ones
//! derive it from the previous value:
//!
//! EF(n) = max(1.3, EF(n-1) - 0.8 + 0.28 * q - 0.02 * q * q)
//!
//! A hardness of 5 from the third review on makes the card due again
//! immediately. Ratings are not range checked here.

use chrono::{DateTime, Duration, Utc};

use super::models::Card;

/// Easiness recorded by the first two reviews
pub const DEFAULT_EASINESS: f64 = 1.75;

/// Minimum easiness factor allowed
pub const MIN_EASINESS: f64 = 1.3;

/// Hardness that marks a card as trivially recalled
pub const TRIVIAL_HARDNESS: i32 = 5;

const FIRST_INTERVAL_DAYS: f64 = 1.0;
const SECOND_INTERVAL_DAYS: f64 = 4.0;

const SECONDS_PER_DAY: f64 = 86_400.0;
const MILLIS_PER_DAY: f64 = SECONDS_PER_DAY * 1000.0;

/// Next easiness factor from the previous one and a hardness rating
pub fn easiness(previous: f64, hardness: i32) -> f64 {
    let q = f64::from(hardness);
    (previous - 0.8 + 0.28 * q - 0.02 * q * q).max(MIN_EASINESS)
}

/// Record a review made now. See [`record_review_at`].
pub fn record_review(card: &mut Card, hardness: i32) {
    record_review_at(card, hardness, Utc::now());
}

/// Record one review of `card` with the given hardness at `now`.
///
/// Appends exactly one entry to each history, advances the running
/// interval and sets the next due date.
pub fn record_review_at(card: &mut Card, hardness: i32, now: DateTime<Utc>) {
    card.repetitions += 1;
    card.hardness_history.push(hardness);

    match card.repetitions {
        1 => {
            card.easiness_history.push(DEFAULT_EASINESS);
            card.interval_days = FIRST_INTERVAL_DAYS;
        }
        2 => {
            card.easiness_history.push(DEFAULT_EASINESS);
            card.interval_days = SECOND_INTERVAL_DAYS;
        }
        _ => {
            let previous = card.easiness().unwrap_or(DEFAULT_EASINESS);
            let ef = easiness(previous, hardness);
            card.easiness_history.push(ef);
            card.interval_days *= ef;
        }
    }

    card.next_due = if card.repetitions > 2 && hardness == TRIVIAL_HARDNESS {
        now
    } else {
        due_after(now, card.interval_days)
    };
}

/// Recompute I(n) from a full easiness history, n being its length.
///
/// Returns 0 for a card that was never reviewed.
pub fn interval_from_history(easiness_history: &[f64]) -> f64 {
    easiness_history
        .iter()
        .enumerate()
        .fold(0.0, |interval, (index, ef)| match index {
            0 => FIRST_INTERVAL_DAYS,
            1 => SECOND_INTERVAL_DAYS,
            _ => interval * ef,
        })
}

/// Days until the card would be due again for each hardness 1-5
pub fn preview(card: &Card) -> [f64; 5] {
    let now = Utc::now();
    let mut days = [0.0; 5];

    for (slot, hardness) in days.iter_mut().zip(1..=5) {
        let mut next = card.clone();
        record_review_at(&mut next, hardness, now);
        *slot = (next.next_due - now).num_seconds() as f64 / SECONDS_PER_DAY;
    }

    days
}

/// `now` shifted by a fractional number of days, saturating at the latest
/// representable instant
fn due_after(now: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    let millis = (days * MILLIS_PER_DAY).round() as i64;
    Duration::try_milliseconds(millis)
        .and_then(|offset| now.checked_add_signed(offset))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Describe how long until `next_due`, e.g. "now", "20 minutes", "2 weeks"
pub fn format_due(next_due: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let until = (next_due - now).num_seconds();
    if until <= 0 {
        return "now".to_string();
    }

    let days = until / 86_400;
    let (count, noun) = match days {
        0 if until < 3_600 => ((until / 60).max(1), "minute"),
        0 => (until / 3_600, "hour"),
        1..=6 => (days, "day"),
        7..=365 => (days / 7, "week"),
        _ => (days / 30, "month"),
    };

    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// Format an interval in days to a compact string
pub fn format_interval(days: f64) -> String {
    let hours = (days * 24.0).round() as i64;
    let days = days.round() as i64;

    if hours == 0 {
        "now".to_string()
    } else if days == 0 {
        format!("{}h", hours)
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
