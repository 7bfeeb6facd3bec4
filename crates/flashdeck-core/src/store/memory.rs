//! In-process review store.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, warn};

use super::{ensure_version_advances, ReviewStore};
use crate::error::{FlashdeckError, FlashdeckResult};
use crate::types::{Card, CardId, Deck, DeckId, DueCandidate, ReviewState, UserId};

#[derive(Default)]
struct Inner {
    decks: HashMap<DeckId, Deck>,
    cards: HashMap<CardId, Card>,
    states: HashMap<(CardId, UserId), ReviewState>,
}

/// Review store backed by hash maps behind one `RwLock`.
///
/// Deleting a deck or card removes everything that depends on it, matching
/// the cascade rules of the SQLite schema.
#[derive(Default)]
pub struct MemoryReviewStore {
    inner: RwLock<Inner>,
}

impl MemoryReviewStore {
    /// Create an empty store.
    pub fn new() -> Self {
        debug!("Creating in-memory review store");
        Self::default()
    }

    fn read(&self) -> FlashdeckResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| FlashdeckError::Internal(e.to_string()))
    }

    fn write(&self) -> FlashdeckResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| FlashdeckError::Internal(e.to_string()))
    }

    /// Insert or replace a deck.
    pub fn create_deck(&self, deck: &Deck) -> FlashdeckResult<()> {
        self.write()?.decks.insert(deck.id, deck.clone());
        Ok(())
    }

    /// Insert or replace a card. The deck must exist.
    pub fn add_card(&self, card: &Card) -> FlashdeckResult<()> {
        let mut inner = self.write()?;
        if !inner.decks.contains_key(&card.deck_id) {
            return Err(FlashdeckError::deck_not_found(card.deck_id));
        }
        inner.cards.insert(card.id, card.clone());
        Ok(())
    }

    /// Get a card by ID.
    pub fn get_card(&self, card_id: &CardId) -> FlashdeckResult<Option<Card>> {
        Ok(self.read()?.cards.get(card_id).cloned())
    }

    /// Delete a deck together with its cards and their review states.
    pub fn delete_deck(&self, deck_id: &DeckId) -> FlashdeckResult<bool> {
        let mut inner = self.write()?;
        if inner.decks.remove(deck_id).is_none() {
            return Ok(false);
        }
        let doomed: Vec<CardId> = inner
            .cards
            .values()
            .filter(|c| c.deck_id == *deck_id)
            .map(|c| c.id)
            .collect();
        for card_id in &doomed {
            inner.cards.remove(card_id);
        }
        inner.states.retain(|(card_id, _), _| !doomed.contains(card_id));
        Ok(true)
    }

    /// Delete a card together with its review states.
    pub fn delete_card(&self, card_id: &CardId) -> FlashdeckResult<bool> {
        let mut inner = self.write()?;
        if inner.cards.remove(card_id).is_none() {
            return Ok(false);
        }
        inner.states.retain(|(id, _), _| id != card_id);
        Ok(true)
    }

    /// Get count of stored review states.
    pub fn count_states(&self) -> FlashdeckResult<usize> {
        Ok(self.read()?.states.len())
    }
}

impl ReviewStore for MemoryReviewStore {
    fn card_exists(&self, card_id: &CardId) -> FlashdeckResult<bool> {
        Ok(self.read()?.cards.contains_key(card_id))
    }

    fn load_review_state(
        &self,
        card_id: &CardId,
        user_id: &UserId,
    ) -> FlashdeckResult<Option<ReviewState>> {
        Ok(self.read()?.states.get(&(*card_id, user_id.clone())).cloned())
    }

    fn due_candidates(&self, user_id: &UserId, now: DateTime<Utc>) -> FlashdeckResult<Vec<DueCandidate>> {
        let inner = self.read()?;
        let candidates = inner
            .cards
            .values()
            .filter_map(|card| {
                let deck = inner.decks.get(&card.deck_id)?;
                (deck.user_id == *user_id).then(|| DueCandidate {
                    card_id: card.id,
                    deck_id: card.deck_id,
                    deck_created_at: deck.created_at,
                    card_created_at: card.created_at,
                    review: inner.states.get(&(card.id, user_id.clone())).cloned(),
                })
            })
            .filter(|candidate| candidate.is_due(now))
            .collect();
        Ok(candidates)
    }

    fn compare_and_swap(
        &self,
        expected_version: Option<u64>,
        new_state: &ReviewState,
    ) -> FlashdeckResult<()> {
        ensure_version_advances(expected_version, new_state)?;

        let mut inner = self.write()?;
        if !inner.cards.contains_key(&new_state.card_id) {
            return Err(FlashdeckError::card_not_found(new_state.card_id));
        }

        let key = (new_state.card_id, new_state.user_id.clone());
        let actual = inner.states.get(&key).map(|s| s.version);
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

        inner.states.insert(key, new_state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap()
    }

    fn seeded() -> (MemoryReviewStore, Deck, Card) {
        let store = MemoryReviewStore::new();
        let deck = Deck::new("user_1", "Capitals");
        let card = Card::with_timestamp(deck.id, "France", "Paris", t0());
        store.create_deck(&deck).unwrap();
        store.add_card(&card).unwrap();
        (store, deck, card)
    }

    fn persisted(card: &Card, version: u64, due_at: DateTime<Utc>) -> ReviewState {
        let mut state = ReviewState::new(card.id, UserId::new("user_1"), t0());
        state.version = version;
        state.due_at = due_at;
        state
    }

    #[test]
    fn test_add_card_requires_deck() {
        let store = MemoryReviewStore::new();
        let err = store
            .add_card(&Card::new(DeckId::new(), "q", "a"))
            .unwrap_err();
        assert!(matches!(err, FlashdeckError::DeckNotFound { .. }));
    }

    #[test]
    fn test_compare_and_swap_insert_then_update() {
        let (store, _, card) = seeded();
        let user = UserId::new("user_1");

        store.compare_and_swap(None, &persisted(&card, 1, t0())).unwrap();
        assert_eq!(store.load_review_state(&card.id, &user).unwrap().unwrap().version, 1);

        store.compare_and_swap(Some(1), &persisted(&card, 2, t0())).unwrap();
        assert_eq!(store.load_review_state(&card.id, &user).unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_compare_and_swap_detects_conflict() {
        let (store, _, card) = seeded();
        store.compare_and_swap(None, &persisted(&card, 1, t0())).unwrap();

        let err = store
            .compare_and_swap(None, &persisted(&card, 1, t0()))
            .unwrap_err();
        assert!(matches!(
            err,
            FlashdeckError::StaleState {
                expected: None,
                actual: Some(1),
                ..
            }
        ));
    }

    #[test]
    fn test_compare_and_swap_unknown_card() {
        let store = MemoryReviewStore::new();
        let state = ReviewState {
            version: 1,
            ..ReviewState::new(CardId::new(), UserId::new("user_1"), t0())
        };
        let err = store.compare_and_swap(None, &state).unwrap_err();
        assert!(matches!(err, FlashdeckError::CardNotFound { .. }));
    }

    #[test]
    fn test_compare_and_swap_rejects_exhausted_version() {
        let (store, _, card) = seeded();
        for version in [0, u64::MAX] {
            let err = store
                .compare_and_swap(Some(u64::MAX), &persisted(&card, version, t0()))
                .unwrap_err();
            assert!(matches!(err, FlashdeckError::InvalidState { .. }));
        }
        assert_eq!(store.count_states().unwrap(), 0);
    }

    #[test]
    fn test_due_candidates_scoped_to_user_and_time() {
        let (store, deck, due_card) = seeded();
        let later_card = Card::with_timestamp(deck.id, "Spain", "Madrid", t0());
        store.add_card(&later_card).unwrap();
        store
            .compare_and_swap(None, &persisted(&later_card, 1, t0() + Duration::days(3)))
            .unwrap();

        let other_deck = Deck::new("user_2", "Other");
        store.create_deck(&other_deck).unwrap();
        store.add_card(&Card::new(other_deck.id, "x", "y")).unwrap();

        let due = store.due_candidates(&UserId::new("user_1"), t0()).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].card_id, due_card.id);
        assert!(due[0].review.is_none());
    }

    #[test]
    fn test_delete_deck_cascades() {
        let (store, deck, card) = seeded();
        store.compare_and_swap(None, &persisted(&card, 1, t0())).unwrap();

        assert!(store.delete_deck(&deck.id).unwrap());
        assert!(!store.card_exists(&card.id).unwrap());
        assert_eq!(store.count_states().unwrap(), 0);
        assert!(!store.delete_deck(&deck.id).unwrap());
    }

    #[test]
    fn test_delete_card_cascades() {
        let (store, _, card) = seeded();
        store.compare_and_swap(None, &persisted(&card, 1, t0())).unwrap();

        assert!(store.delete_card(&card.id).unwrap());
        assert!(store.get_card(&card.id).unwrap().is_none());
        assert_eq!(store.count_states().unwrap(), 0);
    }
}
