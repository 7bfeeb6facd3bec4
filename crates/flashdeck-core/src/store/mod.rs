//! Review state storage.
//!
//! The scheduling core only talks to storage through [`ReviewStore`].
//! Two implementations ship with the crate: an in-process map and a
//! SQLite database with the deck/card/review schema.

mod memory;
mod sqlite;

pub use memory::MemoryReviewStore;
pub use sqlite::SqliteReviewStore;

use chrono::{DateTime, Utc};

use crate::error::{FlashdeckError, FlashdeckResult};
use crate::types::{CardId, DueCandidate, ReviewState, UserId};

/// Trait for review state storage operations.
///
/// Writes go through [`compare_and_swap`](ReviewStore::compare_and_swap) only,
/// so concurrent submissions for the same (card, user) pair resolve to
/// exactly one winner.
pub trait ReviewStore: Send + Sync {
    /// Whether the card exists.
    fn card_exists(&self, card_id: &CardId) -> FlashdeckResult<bool>;

    /// Load the review state for a (card, user) pair.
    fn load_review_state(
        &self,
        card_id: &CardId,
        user_id: &UserId,
    ) -> FlashdeckResult<Option<ReviewState>>;

    /// Cards in the user's decks that are due at `now` or have no state yet.
    ///
    /// Order is unspecified; the session planner sorts.
    fn due_candidates(&self, user_id: &UserId, now: DateTime<Utc>) -> FlashdeckResult<Vec<DueCandidate>>;

    /// Persist `new_state` if the stored version still equals `expected_version`
    /// (`None` meaning "no state stored yet"). Fails with `StaleState` otherwise.
    fn compare_and_swap(
        &self,
        expected_version: Option<u64>,
        new_state: &ReviewState,
    ) -> FlashdeckResult<()>;
}

/// Version a successful write must carry after `expected`.
///
/// `None` once the counter is exhausted.
pub fn next_version(expected: Option<u64>) -> Option<u64> {
    expected.map_or(Some(1), |v| v.checked_add(1))
}

/// Like [`next_version`], but an exhausted counter is an `InvalidState` for `card_id`.
pub(crate) fn required_version(card_id: CardId, expected: Option<u64>) -> FlashdeckResult<u64> {
    next_version(expected).ok_or_else(|| {
        FlashdeckError::invalid_state_for(card_id, "version counter exhausted")
    })
}

/// Reject writes whose version does not advance from `expected` by exactly one.
pub(crate) fn ensure_version_advances(
    expected: Option<u64>,
    new_state: &ReviewState,
) -> FlashdeckResult<()> {
    let required = required_version(new_state.card_id, expected)?;
    if new_state.version != required {
        return Err(FlashdeckError::invalid_state_for(
            new_state.card_id,
            format!(
                "write must carry version {}, got {}",
                required, new_state.version
            ),
        ));
    }
    Ok(())
}
