//! SQLite-backed review store.
//!
//! Owns the deck, card and review-state tables. Timestamps are stored as
//! fixed-width RFC 3339 UTC strings so that due-date filtering can compare
//! them as text.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ensure_version_advances, ReviewStore};
use crate::config::FlashdeckConfig;
use crate::error::{FlashdeckError, FlashdeckResult};
use crate::types::{
    Card, CardId, Deck, DeckId, DueCandidate, Phase, PhaseKind, ReviewState, UserId,
};

const REVIEW_COLUMNS: &str = "r.card_id, r.user_id, r.stability, r.difficulty, r.repetitions, \
     r.lapses, r.due_at, r.last_reviewed_at, r.phase, r.phase_step, r.version";

/// SQLite-backed store for decks, cards and review states.
pub struct SqliteReviewStore {
    conn: Mutex<Connection>,
}

impl SqliteReviewStore {
    /// Open (or create) the database at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> FlashdeckResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Opened review database");
        Self::with_connection(conn)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> FlashdeckResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// Open the database named by `config.database_path`, creating its
    /// parent directory when needed.
    pub fn from_config(config: &FlashdeckConfig) -> FlashdeckResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::new(&config.database_path)
    }

    fn with_connection(conn: Connection) -> FlashdeckResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> FlashdeckResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| FlashdeckError::database(e.to_string()))
    }

    fn init_schema(&self) -> FlashdeckResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS decks (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_decks_user_id ON decks(user_id);

            CREATE TABLE IF NOT EXISTS cards (
                id TEXT PRIMARY KEY,
                deck_id TEXT NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
                front TEXT NOT NULL,
                back TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cards_deck_id ON cards(deck_id);

            CREATE TABLE IF NOT EXISTS review_states (
                card_id TEXT NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                stability REAL NOT NULL,
                difficulty REAL NOT NULL,
                repetitions INTEGER NOT NULL DEFAULT 0,
                lapses INTEGER NOT NULL DEFAULT 0,
                due_at TEXT NOT NULL,
                last_reviewed_at TEXT,
                phase TEXT NOT NULL DEFAULT 'new',
                phase_step INTEGER NOT NULL DEFAULT 0,
                version INTEGER NOT NULL,
                PRIMARY KEY (card_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_review_states_user_due ON review_states(user_id, due_at);
            ",
        )?;

        debug!("Review store schema ready");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Decks
    // ------------------------------------------------------------------

    /// Insert a new deck.
    pub fn create_deck(&self, deck: &Deck) -> FlashdeckResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO decks (id, user_id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                deck.id.to_string(),
                deck.user_id.as_str(),
                deck.name,
                deck.description,
                format_ts(&deck.created_at),
                format_ts(&deck.updated_at),
            ],
        )?;
        debug!(deck_id = %deck.id, user_id = %deck.user_id, "Created deck");
        Ok(())
    }

    /// Get a deck by ID.
    pub fn get_deck(&self, deck_id: &DeckId) -> FlashdeckResult<Option<Deck>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, user_id, name, description, created_at, updated_at
             FROM decks WHERE id = ?1",
            params![deck_id.to_string()],
            DeckRow::read,
        )
        .optional()?
        .map(DeckRow::into_deck)
        .transpose()
    }

    /// List the user's decks, oldest first.
    pub fn list_decks(&self, user_id: &UserId) -> FlashdeckResult<Vec<Deck>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, description, created_at, updated_at
             FROM decks WHERE user_id = ?1
             ORDER BY created_at, id",
        )?;
        let rows = stmt
            .query_map(params![user_id.as_str()], DeckRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(DeckRow::into_deck).collect()
    }

    /// Delete a deck, its cards and their review states.
    ///
    /// Returns `false` if the deck did not exist.
    pub fn delete_deck(&self, deck_id: &DeckId) -> FlashdeckResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM decks WHERE id = ?1", params![deck_id.to_string()])?;
        if deleted > 0 {
            debug!(deck_id = %deck_id, "Deleted deck");
        }
        Ok(deleted > 0)
    }

    // ------------------------------------------------------------------
    // Cards
    // ------------------------------------------------------------------

    /// Insert a new card. Fails with `DeckNotFound` if its deck is missing.
    pub fn add_card(&self, card: &Card) -> FlashdeckResult<()> {
        let conn = self.lock()?;
        let deck_exists: bool = conn
            .query_row(
                "SELECT 1 FROM decks WHERE id = ?1",
                params![card.deck_id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !deck_exists {
            return Err(FlashdeckError::deck_not_found(card.deck_id));
        }

        conn.execute(
            "INSERT INTO cards (id, deck_id, front, back, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                card.id.to_string(),
                card.deck_id.to_string(),
                card.front,
                card.back,
                format_ts(&card.created_at),
                format_ts(&card.updated_at),
            ],
        )?;
        debug!(card_id = %card.id, deck_id = %card.deck_id, "Added card");
        Ok(())
    }

    /// Get a card by ID.
    pub fn get_card(&self, card_id: &CardId) -> FlashdeckResult<Option<Card>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, deck_id, front, back, created_at, updated_at
             FROM cards WHERE id = ?1",
            params![card_id.to_string()],
            CardRow::read,
        )
        .optional()?
        .map(CardRow::into_card)
        .transpose()
    }

    /// List the cards of a deck, oldest first.
    pub fn list_cards(&self, deck_id: &DeckId) -> FlashdeckResult<Vec<Card>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, deck_id, front, back, created_at, updated_at
             FROM cards WHERE deck_id = ?1
             ORDER BY created_at, id",
        )?;
        let rows = stmt
            .query_map(params![deck_id.to_string()], CardRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(CardRow::into_card).collect()
    }

    /// Update a card's content. Review states are left untouched.
    pub fn update_card(&self, card: &Card) -> FlashdeckResult<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE cards SET front = ?2, back = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                card.id.to_string(),
                card.front,
                card.back,
                format_ts(&card.updated_at),
            ],
        )?;
        if updated == 0 {
            return Err(FlashdeckError::card_not_found(card.id));
        }
        Ok(())
    }

    /// Delete a card and its review states.
    pub fn delete_card(&self, card_id: &CardId) -> FlashdeckResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM cards WHERE id = ?1", params![card_id.to_string()])?;
        Ok(deleted > 0)
    }

    // ------------------------------------------------------------------
    // Review states
    // ------------------------------------------------------------------

    /// Drop a user's review state for a card, returning it to `New`.
    pub fn delete_review_state(&self, card_id: &CardId, user_id: &UserId) -> FlashdeckResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM review_states WHERE card_id = ?1 AND user_id = ?2",
            params![card_id.to_string(), user_id.as_str()],
        )?;
        Ok(deleted > 0)
    }

    /// Count review states stored for a user.
    pub fn count_review_states(&self, user_id: &UserId) -> FlashdeckResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM review_states WHERE user_id = ?1",
            params![user_id.as_str()],
            |row| row.get(0),
        )?;
        usize::try_from(count).map_err(|e| FlashdeckError::Internal(e.to_string()))
    }

    fn stored_version(
        conn: &Connection,
        card_id: &CardId,
        user_id: &UserId,
    ) -> FlashdeckResult<Option<u64>> {
        conn.query_row(
            "SELECT version FROM review_states WHERE card_id = ?1 AND user_id = ?2",
            params![card_id.to_string(), user_id.as_str()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .map(|v| decode_version(v, *card_id))
        .transpose()
    }
}

impl ReviewStore for SqliteReviewStore {
    fn card_exists(&self, card_id: &CardId) -> FlashdeckResult<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM cards WHERE id = ?1",
                params![card_id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn load_review_state(
        &self,
        card_id: &CardId,
        user_id: &UserId,
    ) -> FlashdeckResult<Option<ReviewState>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM review_states r WHERE r.card_id = ?1 AND r.user_id = ?2"
        );
        conn.query_row(&sql, params![card_id.to_string(), user_id.as_str()], |row| {
            ReviewRow::read(row, 0)
        })
        .optional()?
        .map(ReviewRow::into_state)
        .transpose()
    }

    fn due_candidates(&self, user_id: &UserId, now: DateTime<Utc>) -> FlashdeckResult<Vec<DueCandidate>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT c.id, c.deck_id, d.created_at, c.created_at, {REVIEW_COLUMNS}
             FROM cards c
             JOIN decks d ON d.id = c.deck_id
             LEFT JOIN review_states r ON r.card_id = c.id AND r.user_id = ?1
             WHERE d.user_id = ?1 AND (r.card_id IS NULL OR r.due_at <= ?2)"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user_id.as_str(), format_ts(&now)], |row| {
                let has_state: Option<String> = row.get(4)?;
                let review = match has_state {
                    Some(_) => Some(ReviewRow::read(row, 4)?),
                    None => None,
                };
                Ok(CandidateRow {
                    card_id: row.get(0)?,
                    deck_id: row.get(1)?,
                    deck_created_at: row.get(2)?,
                    card_created_at: row.get(3)?,
                    review,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let candidates = rows
            .into_iter()
            .map(CandidateRow::into_candidate)
            .collect::<FlashdeckResult<Vec<_>>>()?;

        debug!(user_id = %user_id, count = candidates.len(), "Loaded due candidates");
        Ok(candidates)
    }

    fn compare_and_swap(
        &self,
        expected_version: Option<u64>,
        new_state: &ReviewState,
    ) -> FlashdeckResult<()> {
        ensure_version_advances(expected_version, new_state)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let card_known = tx
            .query_row(
                "SELECT 1 FROM cards WHERE id = ?1",
                params![new_state.card_id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !card_known {
            return Err(FlashdeckError::card_not_found(new_state.card_id));
        }

        let actual = Self::stored_version(&tx, &new_state.card_id, &new_state.user_id)?;
        if actual != expected_version {
            warn!(
                card_id = %new_state.card_id,
                user_id = %new_state.user_id,
                ?expected_version,
                ?actual,
                "Review state compare-and-swap conflict"
            );
            return Err(FlashdeckError::stale(new_state.card_id, expected_version, actual));
        }

        let card_id = new_state.card_id.to_string();
        let due_at = format_ts(&new_state.due_at);
        let last_reviewed_at = new_state.last_reviewed_at.as_ref().map(format_ts);
        let phase = new_state.phase.kind().to_string();
        let version = encode_version(new_state.version)?;

        // Constraint failures surface as database errors, never as conflicts.
        let changed = match expected_version {
            None => tx.execute(
                "INSERT INTO review_states
                 (card_id, user_id, stability, difficulty, repetitions, lapses,
                  due_at, last_reviewed_at, phase, phase_step, version)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    card_id,
                    new_state.user_id.as_str(),
                    new_state.stability,
                    new_state.difficulty,
                    new_state.repetitions,
                    new_state.lapses,
                    due_at,
                    last_reviewed_at,
                    phase,
                    new_state.phase.step(),
                    version,
                ],
            )?,
            Some(expected) => tx.execute(
                "UPDATE review_states
                 SET stability = ?3, difficulty = ?4, repetitions = ?5, lapses = ?6,
                     due_at = ?7, last_reviewed_at = ?8, phase = ?9, phase_step = ?10,
                     version = ?11
                 WHERE card_id = ?1 AND user_id = ?2 AND version = ?12",
                params![
                    card_id,
                    new_state.user_id.as_str(),
                    new_state.stability,
                    new_state.difficulty,
                    new_state.repetitions,
                    new_state.lapses,
                    due_at,
                    last_reviewed_at,
                    phase,
                    new_state.phase.step(),
                    version,
                    encode_version(expected)?,
                ],
            )?,
        };
        if changed != 1 {
            return Err(FlashdeckError::database(format!(
                "review state write for card {} touched {} rows",
                new_state.card_id, changed
            )));
        }

        tx.commit()?;
        debug!(
            card_id = %new_state.card_id,
            user_id = %new_state.user_id,
            version = new_state.version,
            "Persisted review state"
        );
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Row mapping
// ----------------------------------------------------------------------

struct DeckRow {
    id: String,
    user_id: String,
    name: String,
    description: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DeckRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_deck(self) -> FlashdeckResult<Deck> {
        Ok(Deck {
            id: DeckId(parse_uuid(&self.id, "deck id")?),
            user_id: UserId::new(self.user_id),
            name: self.name,
            description: self.description,
            created_at: parse_ts(&self.created_at, "deck created_at")?,
            updated_at: parse_ts(&self.updated_at, "deck updated_at")?,
        })
    }
}

struct CardRow {
    id: String,
    deck_id: String,
    front: String,
    back: String,
    created_at: String,
    updated_at: String,
}

impl CardRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            deck_id: row.get(1)?,
            front: row.get(2)?,
            back: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_card(self) -> FlashdeckResult<Card> {
        Ok(Card {
            id: CardId(parse_uuid(&self.id, "card id")?),
            deck_id: DeckId(parse_uuid(&self.deck_id, "deck id")?),
            front: self.front,
            back: self.back,
            created_at: parse_ts(&self.created_at, "card created_at")?,
            updated_at: parse_ts(&self.updated_at, "card updated_at")?,
        })
    }
}

struct CandidateRow {
    card_id: String,
    deck_id: String,
    deck_created_at: String,
    card_created_at: String,
    review: Option<ReviewRow>,
}

impl CandidateRow {
    fn into_candidate(self) -> FlashdeckResult<DueCandidate> {
        Ok(DueCandidate {
            card_id: CardId(parse_uuid(&self.card_id, "card id")?),
            deck_id: DeckId(parse_uuid(&self.deck_id, "deck id")?),
            deck_created_at: parse_ts(&self.deck_created_at, "deck created_at")?,
            card_created_at: parse_ts(&self.card_created_at, "card created_at")?,
            review: self.review.map(ReviewRow::into_state).transpose()?,
        })
    }
}

/// Review state columns as stored, before validation.
///
/// Numbers are read with SQLite's own types so that out-of-range or missing
/// values reach `into_state` and are reported as invalid state.
struct ReviewRow {
    card_id: String,
    user_id: String,
    stability: Option<f64>,
    difficulty: Option<f64>,
    repetitions: Option<i64>,
    lapses: Option<i64>,
    due_at: String,
    last_reviewed_at: Option<String>,
    phase: String,
    phase_step: Option<i64>,
    version: i64,
}

impl ReviewRow {
    /// Read the review columns starting at column `offset`.
    fn read(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            card_id: row.get(offset)?,
            user_id: row.get(offset + 1)?,
            stability: row.get(offset + 2)?,
            difficulty: row.get(offset + 3)?,
            repetitions: row.get(offset + 4)?,
            lapses: row.get(offset + 5)?,
            due_at: row.get(offset + 6)?,
            last_reviewed_at: row.get(offset + 7)?,
            phase: row.get(offset + 8)?,
            phase_step: row.get(offset + 9)?,
            version: row.get(offset + 10)?,
        })
    }

    fn into_state(self) -> FlashdeckResult<ReviewState> {
        let card_id = CardId(parse_uuid(&self.card_id, "card id")?);
        let kind = PhaseKind::from_str(&self.phase).map_err(|_| {
            FlashdeckError::invalid_state_for(card_id, format!("unknown phase '{}'", self.phase))
        })?;

        Ok(ReviewState {
            card_id,
            user_id: UserId::new(self.user_id),
            stability: decode_real(self.stability, "stability", card_id)?,
            difficulty: decode_real(self.difficulty, "difficulty", card_id)?,
            repetitions: decode_count(self.repetitions, "repetitions", card_id)?,
            lapses: decode_count(self.lapses, "lapses", card_id)?,
            due_at: parse_ts(&self.due_at, "due_at")?,
            last_reviewed_at: self
                .last_reviewed_at
                .as_deref()
                .map(|s| parse_ts(s, "last_reviewed_at"))
                .transpose()?,
            phase: Phase::from_parts(kind, decode_count(self.phase_step, "phase_step", card_id)?),
            version: decode_version(self.version, card_id)?,
        })
    }
}

fn format_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(s: &str, field: &str) -> FlashdeckResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FlashdeckError::invalid_state(format!("invalid {field} '{s}': {e}")))
}

fn parse_uuid(s: &str, field: &str) -> FlashdeckResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| FlashdeckError::invalid_state(format!("invalid {field} '{s}': {e}")))
}

fn decode_real(value: Option<f64>, field: &str, card_id: CardId) -> FlashdeckResult<f32> {
    match value {
        Some(v) if v.is_finite() && v.abs() <= f64::from(f32::MAX) => Ok(v as f32),
        Some(v) => Err(FlashdeckError::invalid_state_for(card_id, format!("{field} {v} out of range"))),
        None => Err(FlashdeckError::invalid_state_for(card_id, format!("{field} is missing"))),
    }
}

fn decode_count(value: Option<i64>, field: &str, card_id: CardId) -> FlashdeckResult<u32> {
    let value = value
        .ok_or_else(|| FlashdeckError::invalid_state_for(card_id, format!("{field} is missing")))?;
    u32::try_from(value)
        .map_err(|_| FlashdeckError::invalid_state_for(card_id, format!("{field} {value} out of range")))
}

fn encode_version(version: u64) -> FlashdeckResult<i64> {
    i64::try_from(version).map_err(|_| FlashdeckError::Internal(format!("version {version} overflows storage")))
}

fn decode_version(version: i64, card_id: CardId) -> FlashdeckResult<u64> {
    u64::try_from(version)
        .map_err(|_| FlashdeckError::invalid_state_for(card_id, format!("negative version {version}")))
}
