//! Review outcome recording.
//!
//! Turns a graded answer into the next review state. [`OutcomeRecorder::submit_review`]
//! only computes; [`OutcomeRecorder::record_review`] also commits the result
//! through the store's compare-and-swap.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{FlashdeckError, FlashdeckResult};
use crate::scheduler::Scheduler;
use crate::store::{required_version, ReviewStore};
use crate::types::{CardId, Grade, ReviewState, UserId};

/// One graded answer as received from a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSubmission {
    pub card_id: CardId,
    pub user_id: UserId,
    /// Raw 1-4 rating. Checked before anything else is read.
    pub rating: u8,
    pub now: DateTime<Utc>,
    /// Version the client last saw; `None` if it never saw a state.
    pub expected_version: Option<u64>,
}

impl ReviewSubmission {
    /// Submission for a card the client has no stored state for.
    pub fn new(card_id: CardId, user_id: UserId, grade: Grade, now: DateTime<Utc>) -> Self {
        Self::with_rating(card_id, user_id, grade.to_rating(), now)
    }

    /// Submission from an unvalidated rating.
    pub fn with_rating(card_id: CardId, user_id: UserId, rating: u8, now: DateTime<Utc>) -> Self {
        Self {
            card_id,
            user_id,
            rating,
            now,
            expected_version: None,
        }
    }

    /// Set the version the client last saw.
    pub fn expecting(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Applies review outcomes through the scheduler.
#[derive(Debug, Clone, Default)]
pub struct OutcomeRecorder {
    scheduler: Scheduler,
}

impl OutcomeRecorder {
    /// Create a recorder around `scheduler`.
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// Get the scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Compute the state that follows `submission` without persisting it.
    ///
    /// The returned state carries the version the write must use.
    pub fn submit_review<S: ReviewStore + ?Sized>(
        &self,
        store: &S,
        submission: &ReviewSubmission,
    ) -> FlashdeckResult<ReviewState> {
        let grade = Grade::try_from(submission.rating)?;

        if !store.card_exists(&submission.card_id)? {
            return Err(FlashdeckError::card_not_found(submission.card_id));
        }

        let stored = store.load_review_state(&submission.card_id, &submission.user_id)?;
        let actual = stored.as_ref().map(|s| s.version);
        if actual != submission.expected_version {
            return Err(FlashdeckError::stale(
                submission.card_id,
                submission.expected_version,
                actual,
            ));
        }

        let current = stored.unwrap_or_else(|| {
            self.scheduler.initial_state(
                submission.card_id,
                submission.user_id.clone(),
                submission.now,
            )
        });

        let mut next = self.scheduler.schedule(&current, grade, submission.now)?;
        next.version = required_version(submission.card_id, submission.expected_version)?;
        Ok(next)
    }

    /// Compute the next state and commit it with compare-and-swap.
    ///
    /// Of several submissions carrying the same expected version, exactly one
    /// is committed; the others fail with `StaleState`.
    pub fn record_review<S: ReviewStore + ?Sized>(
        &self,
        store: &S,
        submission: &ReviewSubmission,
    ) -> FlashdeckResult<ReviewState> {
        let next = self.submit_review(store, submission)?;

        if let Err(err) = store.compare_and_swap(submission.expected_version, &next) {
            if matches!(err, FlashdeckError::StaleState { .. }) {
                warn!(
                    card_id = %submission.card_id,
                    user_id = %submission.user_id,
                    expected_version = ?submission.expected_version,
                    "Review lost a concurrent update"
                );
            }
            return Err(err);
        }

        debug!(
            card_id = %next.card_id,
            user_id = %next.user_id,
            phase = %next.phase.kind(),
            version = next.version,
            due_at = %next.due_at,
            "Recorded review"
        );
        Ok(next)
    }
}
