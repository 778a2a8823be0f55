//! Storage operations for flashcard decks
//!
//! A deck lives in a single SQLite file:
//! ```text
//! cards(id, prompt, answer, reps, nextrep)   nextrep in epoch seconds
//! efs(id, card_id, ef)                       one row per review, ordered by id
//! hardnesses(id, card_id, hardness)          one row per review, ordered by id
//! deck_meta(key, value)                      id counter
//! ```
//!
//! The whole deck is held in memory. Syncing writes a complete copy to
//! `<path>.sync` and renames it over the deck file once every row is in
//! place, so the file on disk is always either the old deck or the new one.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use super::algorithm::{interval_from_history, record_review_at};
use super::models::{Card, CardId};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS cards (
        id INTEGER NOT NULL PRIMARY KEY,
        prompt TEXT,
        answer TEXT,
        reps INTEGER,
        nextrep INTEGER
    );
    CREATE TABLE IF NOT EXISTS efs (
        id INTEGER NOT NULL PRIMARY KEY,
        card_id INTEGER NOT NULL,
        ef FLOAT64
    );
    CREATE TABLE IF NOT EXISTS hardnesses (
        id INTEGER NOT NULL PRIMARY KEY,
        card_id INTEGER NOT NULL,
        hardness INTEGER
    );
    CREATE TABLE IF NOT EXISTS deck_meta (
        key TEXT NOT NULL PRIMARY KEY,
        value INTEGER NOT NULL
    );
"#;

const NEXT_ID_KEY: &str = "next_id";

/// Which per-review history a card is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Easiness,
    Hardness,
}

impl std::fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easiness => write!(f, "easiness"),
            Self::Hardness => write!(f, "hardness"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Card {card_id} has {repetitions} repetitions but no {kind} history")]
    MissingHistory {
        card_id: CardId,
        repetitions: u32,
        kind: HistoryKind,
    },

    #[error("Card {card_id} has {repetitions} repetitions but {easiness} easiness and {hardness} hardness entries")]
    HistoryMismatch {
        card_id: CardId,
        repetitions: u32,
        easiness: usize,
        hardness: usize,
    },

    #[error("Card {card_id} has an invalid due timestamp: {secs}")]
    InvalidTimestamp { card_id: CardId, secs: i64 },

    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    #[error("No card id left after {0}")]
    IdSpaceExhausted(CardId),
}

impl DeckError {
    /// Whether the deck file was readable but its contents are inconsistent
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::MissingHistory { .. }
                | Self::HistoryMismatch { .. }
                | Self::InvalidTimestamp { .. }
                | Self::IdSpaceExhausted(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;

/// An open deck: the authoritative in-memory cards plus the file they
/// are mirrored to.
///
/// A dirty deck is synced when it is closed, or as a last resort when it
/// is dropped.
#[derive(Debug)]
pub struct Deck {
    path: PathBuf,
    conn: Option<Connection>,
    cards: Vec<Card>,
    next_id: CardId,
    dirty: bool,
}

impl Deck {
    /// Open the deck at `path`, creating an empty one if nothing is there
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;

        if !has_table(&conn, "cards")? {
            conn.execute_batch(SCHEMA)?;
            log::info!("Initialized empty deck at {:?}", path);
            return Ok(Self {
                path,
                conn: Some(conn),
                cards: Vec::new(),
                next_id: 0,
                dirty: false,
            });
        }

        let cards = load_cards(&conn)?;
        let after_last = match cards.iter().map(|c| c.id).max() {
            Some(last) => last.checked_add(1).ok_or(DeckError::IdSpaceExhausted(last))?,
            None => 0,
        };
        let next_id = read_next_id(&conn)?.unwrap_or(0).max(after_last);

        log::info!("Opened deck {:?} with {} cards", path, cards.len());

        Ok(Self {
            path,
            conn: Some(conn),
            cards,
            next_id,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cards in deck order
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag in-memory changes made through means other than this type
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Id the next added card will receive
    pub fn next_id(&self) -> CardId {
        self.next_id
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Cards due at `now`, in deck order
    pub fn due_cards(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(move |c| c.is_due(now))
    }

    /// Append a card, assigning it the next id. Ids are never reused, even
    /// after the card holding the highest id is deleted.
    pub fn add_card(&mut self, mut card: Card) -> Result<CardId> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(DeckError::IdSpaceExhausted(id))?;
        card.id = id;
        self.cards.push(card);
        self.dirty = true;
        Ok(id)
    }

    /// Remove the card with `id`. Returns false if there was none.
    pub fn delete_card(&mut self, id: CardId) -> bool {
        match self.cards.iter().position(|c| c.id == id) {
            Some(pos) => {
                self.cards.remove(pos);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Replace the prompt and/or answer of a card
    pub fn edit_card(&mut self, id: CardId, prompt: Option<String>, answer: Option<String>) -> Result<&Card> {
        let card = self.card_mut(id)?;
        if let Some(prompt) = prompt {
            card.prompt = prompt;
        }
        if let Some(answer) = answer {
            card.answer = answer;
        }
        self.dirty = true;
        self.card(id).ok_or(DeckError::CardNotFound(id))
    }

    /// Record a review of the card with `id` made now
    pub fn review(&mut self, id: CardId, hardness: i32) -> Result<&Card> {
        self.review_at(id, hardness, Utc::now())
    }

    /// Record a review of the card with `id` made at `now`
    pub fn review_at(&mut self, id: CardId, hardness: i32, now: DateTime<Utc>) -> Result<&Card> {
        let card = self.card_mut(id)?;
        record_review_at(card, hardness, now);
        self.dirty = true;
        self.card(id).ok_or(DeckError::CardNotFound(id))
    }

    fn card_mut(&mut self, id: CardId) -> Result<&mut Card> {
        self.cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DeckError::CardNotFound(id))
    }

    /// Write the deck to disk.
    ///
    /// On error the deck file is left as it was and the deck stays dirty.
    pub fn sync(&mut self) -> Result<()> {
        self.sync_with(write_snapshot)
    }

    fn sync_with<F>(&mut self, write: F) -> Result<()>
    where
        F: FnOnce(&mut Connection, &[Card], CardId) -> Result<()>,
    {
        let temp_path = self.temp_path();
        if temp_path.exists() {
            // Left over from an interrupted sync
            fs::remove_file(&temp_path)?;
        }

        if let Err(e) = write_temp(&temp_path, &self.cards, self.next_id, write) {
            discard_temp(&temp_path);
            return Err(e);
        }

        // Release the old handle before the file is replaced underneath it
        self.conn = None;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            discard_temp(&temp_path);
            self.conn = Some(Connection::open(&self.path)?);
            return Err(e.into());
        }

        self.conn = Some(Connection::open(&self.path)?);
        self.dirty = false;

        log::info!("Synced {} cards to {:?}", self.cards.len(), self.path);
        Ok(())
    }

    /// Sync if dirty, then release the storage handle
    pub fn close(mut self) -> Result<()> {
        let synced = if self.dirty { self.sync() } else { Ok(()) };
        // Consumed either way; nothing left for Drop to retry
        self.dirty = false;

        let released = match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| DeckError::from(e)),
            None => Ok(()),
        };

        synced.and(released)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".sync");
        PathBuf::from(name)
    }
}

impl Drop for Deck {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.sync() {
                log::warn!("Failed to sync deck {:?} on drop: {}", self.path, e);
            }
        }
    }
}

fn has_table(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Decks written before the counter existed have no deck_meta table
fn read_next_id(conn: &Connection) -> Result<Option<CardId>> {
    if !has_table(conn, "deck_meta")? {
        return Ok(None);
    }

    let next_id = conn
        .query_row(
            "SELECT value FROM deck_meta WHERE key = ?1",
            params![NEXT_ID_KEY],
            |row| row.get::<_, CardId>(0),
        )
        .optional()?;
    Ok(next_id)
}

fn load_cards(conn: &Connection) -> Result<Vec<Card>> {
    let mut card_stmt =
        conn.prepare("SELECT id, prompt, answer, reps, nextrep FROM cards ORDER BY nextrep, id")?;
    let rows = card_stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, CardId>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<u32>>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut ef_stmt = conn.prepare("SELECT ef FROM efs WHERE card_id = ?1 ORDER BY id")?;
    let mut hardness_stmt =
        conn.prepare("SELECT hardness FROM hardnesses WHERE card_id = ?1 ORDER BY id")?;

    let mut cards = Vec::with_capacity(rows.len());
    for (id, prompt, answer, reps, nextrep) in rows {
        let repetitions = reps.unwrap_or(0);

        let easiness_history = ef_stmt
            .query_map(params![id], |row| row.get::<_, f64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let hardness_history = hardness_stmt
            .query_map(params![id], |row| row.get::<_, i32>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        check_history(id, repetitions, &easiness_history, &hardness_history)?;

        let next_due = DateTime::from_timestamp(nextrep, 0).ok_or(DeckError::InvalidTimestamp {
            card_id: id,
            secs: nextrep,
        })?;

        cards.push(Card {
            id,
            prompt: prompt.unwrap_or_default(),
            answer: answer.unwrap_or_default(),
            repetitions,
            next_due,
            interval_days: interval_from_history(&easiness_history),
            easiness_history,
            hardness_history,
        });
    }

    Ok(cards)
}

fn check_history(id: CardId, repetitions: u32, easiness: &[f64], hardness: &[i32]) -> Result<()> {
    if repetitions > 0 {
        if easiness.is_empty() {
            return Err(DeckError::MissingHistory {
                card_id: id,
                repetitions,
                kind: HistoryKind::Easiness,
            });
        }
        if hardness.is_empty() {
            return Err(DeckError::MissingHistory {
                card_id: id,
                repetitions,
                kind: HistoryKind::Hardness,
            });
        }
    }

    let expected = repetitions as usize;
    if easiness.len() != expected || hardness.len() != expected {
        return Err(DeckError::HistoryMismatch {
            card_id: id,
            repetitions,
            easiness: easiness.len(),
            hardness: hardness.len(),
        });
    }

    Ok(())
}

fn write_temp<F>(temp_path: &Path, cards: &[Card], next_id: CardId, write: F) -> Result<()>
where
    F: FnOnce(&mut Connection, &[Card], CardId) -> Result<()>,
{
    let mut conn = Connection::open(temp_path)?;
    conn.execute_batch(SCHEMA)?;
    write(&mut conn, cards, next_id)?;
    conn.close().map_err(|(_, e)| e)?;
    Ok(())
}

fn write_snapshot(conn: &mut Connection, cards: &[Card], next_id: CardId) -> Result<()> {
    let tx = conn.transaction()?;
    {
        let mut insert_card = tx.prepare(
            "INSERT INTO cards (id, prompt, answer, reps, nextrep) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let mut insert_ef = tx.prepare("INSERT INTO efs (card_id, ef) VALUES (?1, ?2)")?;
        let mut insert_hardness =
            tx.prepare("INSERT INTO hardnesses (card_id, hardness) VALUES (?1, ?2)")?;

        for card in cards {
            insert_card.execute(params![
                card.id,
                card.prompt,
                card.answer,
                card.repetitions,
                card.next_due.timestamp(),
            ])?;
            for ef in &card.easiness_history {
                insert_ef.execute(params![card.id, ef])?;
            }
            for hardness in &card.hardness_history {
                insert_hardness.execute(params![card.id, hardness])?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO deck_meta (key, value) VALUES (?1, ?2)",
            params![NEXT_ID_KEY, next_id],
        )?;
    }
    tx.commit()?;
    Ok(())
}

fn discard_temp(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to remove {:?}: {}", temp_path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn create_test_deck() -> (Deck, PathBuf, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deck.db");
        let deck = Deck::open(&path).unwrap();
        (deck, path, temp_dir)
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn ids(deck: &Deck) -> Vec<CardId> {
        deck.cards().iter().map(|c| c.id).collect()
    }

    fn sorted_by_id(deck: &Deck) -> Vec<Card> {
        let mut cards = deck.cards().to_vec();
        cards.sort_by_key(|c| c.id);
        cards
    }

    fn assert_same_card(loaded: &Card, original: &Card) {
        assert_eq!(loaded.id, original.id);
        assert_eq!(loaded.prompt, original.prompt);
        assert_eq!(loaded.answer, original.answer);
        assert_eq!(loaded.repetitions, original.repetitions);
        assert_eq!(loaded.next_due.timestamp(), original.next_due.timestamp());
        assert_eq!(loaded.easiness_history, original.easiness_history);
        assert_eq!(loaded.hardness_history, original.hardness_history);
        assert_eq!(loaded.interval_days, original.interval_days);
    }

    /// Deck file as written by the first version of the format
    fn write_raw_deck(path: &Path, statements: &str) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE cards (id INTEGER NOT NULL PRIMARY KEY, prompt TEXT, answer TEXT, reps INTEGER, nextrep INTEGER);
            CREATE TABLE efs (id INTEGER NOT NULL PRIMARY KEY, card_id INTEGER NOT NULL, ef FLOAT64);
            CREATE TABLE hardnesses (id INTEGER NOT NULL PRIMARY KEY, card_id INTEGER NOT NULL, hardness INTEGER);
            "#,
        )
        .unwrap();
        conn.execute_batch(statements).unwrap();
    }

    #[test]
    fn test_open_missing_creates_empty_deck() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("deck.db");

        let deck = Deck::open(&path).unwrap();

        assert!(deck.is_empty());
        assert!(!deck.is_dirty());
        assert_eq!(deck.next_id(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_add_card_assigns_sequential_ids() {
        let (mut deck, _path, _temp) = create_test_deck();

        assert_eq!(deck.add_card(Card::new("a", "1")).unwrap(), 0);
        assert!(deck.is_dirty());
        assert_eq!(deck.add_card(Card::new("b", "2")).unwrap(), 1);
        assert_eq!(deck.add_card(Card::new("c", "3")).unwrap(), 2);

        assert_eq!(ids(&deck), vec![0, 1, 2]);
    }

    #[test]
    fn test_deleted_ids_are_not_reused() {
        let (mut deck, _path, _temp) = create_test_deck();
        for i in 0..3 {
            deck.add_card(Card::new(format!("q{}", i), "a")).unwrap();
        }

        assert!(deck.delete_card(2));
        assert_eq!(deck.add_card(Card::new("q3", "a")).unwrap(), 3);
    }

    #[test]
    fn test_delete_preserves_order() {
        let (mut deck, _path, _temp) = create_test_deck();
        for i in 0..4 {
            deck.add_card(Card::new(format!("q{}", i), "a")).unwrap();
        }

        assert!(deck.delete_card(1));

        assert_eq!(ids(&deck), vec![0, 2, 3]);
        assert!(deck.card(1).is_none());
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let (mut deck, _path, _temp) = create_test_deck();
        deck.add_card(Card::new("q", "a")).unwrap();
        deck.sync().unwrap();

        assert!(!deck.delete_card(42));
        assert_eq!(deck.len(), 1);
        assert!(!deck.is_dirty());
    }

    #[test]
    fn test_edit_and_review_unknown_card() {
        let (mut deck, _path, _temp) = create_test_deck();

        let err = deck.edit_card(7, Some("p".to_string()), None).unwrap_err();
        assert!(matches!(err, DeckError::CardNotFound(7)));

        let err = deck.review(7, 3).unwrap_err();
        assert!(matches!(err, DeckError::CardNotFound(7)));
        assert!(!deck.is_dirty());
    }

    #[test]
    fn test_edit_card_replaces_given_fields() {
        let (mut deck, _path, _temp) = create_test_deck();
        let id = deck.add_card(Card::new("old prompt", "old answer")).unwrap();

        let card = deck.edit_card(id, None, Some("new answer".to_string())).unwrap();

        assert_eq!(card.prompt, "old prompt");
        assert_eq!(card.answer, "new answer");
    }

    #[test]
    fn test_round_trip() {
        let (mut deck, path, _temp) = create_test_deck();
        let now = fixed_now();

        let a = deck.add_card(Card::new("Was heißt \"vergessen\"?", "to forget")).unwrap();
        let b = deck.add_card(Card::new("multi\nline\nprompt", "")).unwrap();
        deck.add_card(Card::new("never reviewed", "a")).unwrap();
        for hardness in [3, 2, 4, 1] {
            deck.review_at(a, hardness, now).unwrap();
        }
        deck.review_at(b, 5, now).unwrap();
        deck.delete_card(2);
        deck.add_card(Card::new("after delete", "a")).unwrap();

        deck.sync().unwrap();
        assert!(!deck.is_dirty());
        let expected = sorted_by_id(&deck);

        let reopened = Deck::open(&path).unwrap();
        let loaded = sorted_by_id(&reopened);

        assert_eq!(loaded.len(), expected.len());
        for (loaded, original) in loaded.iter().zip(expected.iter()) {
            assert_same_card(loaded, original);
        }
        assert_eq!(reopened.next_id(), 4);
        assert!(!reopened.is_dirty());
    }

    #[test]
    fn test_load_orders_by_due_date() {
        let (mut deck, path, _temp) = create_test_deck();
        let now = fixed_now();

        let late = deck.add_card(Card::new("late", "a")).unwrap();
        let soon = deck.add_card(Card::new("soon", "a")).unwrap();
        deck.review_at(late, 3, now).unwrap();
        deck.review_at(late, 3, now).unwrap();
        deck.review_at(soon, 3, now).unwrap();
        deck.sync().unwrap();

        let reopened = Deck::open(&path).unwrap();
        assert_eq!(ids(&reopened), vec![soon, late]);
    }

    #[test]
    fn test_due_cards() {
        let (mut deck, _path, _temp) = create_test_deck();

        let reviewed = deck.add_card(Card::new("reviewed", "a")).unwrap();
        let fresh = deck.add_card(Card::new("fresh", "a")).unwrap();
        let now = Utc::now();
        deck.review_at(reviewed, 3, now).unwrap();

        let due: Vec<CardId> = deck.due_cards(now).map(|c| c.id).collect();
        assert_eq!(due, vec![fresh]);

        let due: Vec<CardId> = deck.due_cards(now + Duration::days(1)).map(|c| c.id).collect();
        assert_eq!(due, vec![reviewed, fresh]);
    }

    #[test]
    fn test_missing_history_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deck.db");
        write_raw_deck(
            &path,
            "INSERT INTO cards VALUES (0, 'q', 'a', 2, 1700000000);
             INSERT INTO hardnesses (card_id, hardness) VALUES (0, 3), (0, 3);",
        );

        let err = Deck::open(&path).unwrap_err();

        assert!(err.is_corruption());
        assert!(matches!(
            err,
            DeckError::MissingHistory { card_id: 0, repetitions: 2, kind: HistoryKind::Easiness }
        ));
    }

    #[test]
    fn test_short_history_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deck.db");
        write_raw_deck(
            &path,
            "INSERT INTO cards VALUES (0, 'q', 'a', 3, 1700000000);
             INSERT INTO efs (card_id, ef) VALUES (0, 1.75), (0, 1.75);
             INSERT INTO hardnesses (card_id, hardness) VALUES (0, 3), (0, 3), (0, 3);",
        );

        let err = Deck::open(&path).unwrap_err();
        assert!(matches!(err, DeckError::HistoryMismatch { easiness: 2, hardness: 3, .. }));
    }

    #[test]
    fn test_garbage_file_is_io_failure() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deck.db");
        fs::write(&path, b"this is not a deck, just some text that is long enough").unwrap();

        let err = Deck::open(&path).unwrap_err();

        assert!(matches!(err, DeckError::Sqlite(_)));
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_legacy_deck_without_counter() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deck.db");
        write_raw_deck(
            &path,
            "INSERT INTO cards VALUES (1, 'first', 'a', 1, 1700000000);
             INSERT INTO cards VALUES (5, 'second', 'b', 0, 1600000000);
             INSERT INTO efs (card_id, ef) VALUES (1, 1.75);
             INSERT INTO hardnesses (card_id, hardness) VALUES (1, 2);",
        );

        let mut deck = Deck::open(&path).unwrap();

        assert_eq!(ids(&deck), vec![5, 1]);
        assert_eq!(deck.card(1).unwrap().interval_days, 1.0);
        assert_eq!(deck.add_card(Card::new("new", "c")).unwrap(), 6);
    }

    #[test]
    fn test_highest_possible_id_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deck.db");
        write_raw_deck(&path, "INSERT INTO cards VALUES (4294967295, 'q', 'a', 0, 1700000000);");

        let err = Deck::open(&path).unwrap_err();

        assert!(matches!(err, DeckError::IdSpaceExhausted(id) if id == CardId::MAX));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_add_card_fails_once_ids_run_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deck.db");
        write_raw_deck(
            &path,
            "CREATE TABLE deck_meta (key TEXT NOT NULL PRIMARY KEY, value INTEGER NOT NULL);
             INSERT INTO deck_meta VALUES ('next_id', 4294967295);",
        );
        let mut deck = Deck::open(&path).unwrap();
        assert_eq!(deck.next_id(), CardId::MAX);

        let err = deck.add_card(Card::new("q", "a")).unwrap_err();

        assert!(matches!(err, DeckError::IdSpaceExhausted(id) if id == CardId::MAX));
        assert!(deck.is_empty());
        assert!(!deck.is_dirty());
        assert_eq!(deck.next_id(), CardId::MAX);
    }

    #[test]
    fn test_counter_survives_sync() {
        let (mut deck, path, _temp) = create_test_deck();
        for i in 0..3 {
            deck.add_card(Card::new(format!("q{}", i), "a")).unwrap();
        }
        deck.delete_card(2);
        deck.sync().unwrap();

        let mut reopened = Deck::open(&path).unwrap();
        assert_eq!(reopened.add_card(Card::new("q", "a")).unwrap(), 3);
    }

    #[test]
    fn test_failed_write_leaves_original() {
        let (mut deck, path, _temp) = create_test_deck();
        deck.add_card(Card::new("kept", "a")).unwrap();
        deck.sync().unwrap();

        deck.add_card(Card::new("lost", "b")).unwrap();
        deck.add_card(Card::new("also lost", "c")).unwrap();
        let err = deck
            .sync_with(|conn, cards, next_id| {
                write_snapshot(conn, &cards[..1], next_id)?;
                Err(DeckError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )))
            })
            .unwrap_err();

        assert!(matches!(err, DeckError::Io(_)));
        assert!(deck.is_dirty());
        assert_eq!(deck.len(), 3);
        assert!(!deck.temp_path().exists());

        let on_disk = Deck::open(&path).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk.cards()[0].prompt, "kept");
    }

    #[test]
    fn test_undeletable_stale_temp_leaves_original() {
        let (mut deck, path, _temp) = create_test_deck();
        deck.add_card(Card::new("kept", "a")).unwrap();
        deck.sync().unwrap();

        deck.add_card(Card::new("lost", "b")).unwrap();
        fs::create_dir(deck.temp_path()).unwrap();

        assert!(deck.sync().is_err());
        assert!(deck.is_dirty());

        let on_disk = Deck::open(&path).unwrap();
        assert_eq!(on_disk.len(), 1);

        fs::remove_dir(deck.temp_path()).unwrap();
        deck.sync().unwrap();
        assert_eq!(Deck::open(&path).unwrap().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_temp_file_creation_failure_leaves_original() {
        let (mut deck, path, temp) = create_test_deck();
        deck.add_card(Card::new("kept", "a")).unwrap();
        deck.sync().unwrap();

        // Dangling link: nothing to clean up first, but nothing can be created there
        let target = temp.path().join("missing").join("deck.db.sync");
        std::os::unix::fs::symlink(&target, deck.temp_path()).unwrap();

        deck.add_card(Card::new("lost", "b")).unwrap();
        let err = deck.sync().unwrap_err();

        assert!(matches!(err, DeckError::Sqlite(_)));
        assert!(deck.is_dirty());
        assert!(fs::symlink_metadata(deck.temp_path()).is_err());
        assert!(!target.exists());

        let on_disk = Deck::open(&path).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk.cards()[0].prompt, "kept");
    }

    #[test]
    fn test_stale_temp_file_is_replaced() {
        let (mut deck, path, _temp) = create_test_deck();
        fs::write(deck.temp_path(), b"left over").unwrap();

        deck.add_card(Card::new("q", "a")).unwrap();
        deck.sync().unwrap();

        assert!(!deck.temp_path().exists());
        assert_eq!(Deck::open(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_close_syncs_dirty_deck() {
        let (mut deck, path, _temp) = create_test_deck();
        deck.add_card(Card::new("q", "a")).unwrap();

        deck.close().unwrap();

        let reopened = Deck::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_close_clean_deck_does_not_write() {
        let (mut deck, path, _temp) = create_test_deck();
        deck.add_card(Card::new("q", "a")).unwrap();
        deck.sync().unwrap();
        let temp_path = deck.temp_path();

        deck.close().unwrap();

        assert!(!temp_path.exists());
        assert_eq!(Deck::open(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_drop_syncs_dirty_deck() {
        let (mut deck, path, _temp) = create_test_deck();
        deck.add_card(Card::new("q", "a")).unwrap();

        drop(deck);

        assert_eq!(Deck::open(&path).unwrap().len(), 1);
    }
}
