//! Scheduling memory for one (card, user) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::card::{CardId, DeckId, UserId};

/// Default stability for a card that has never been reviewed (days).
pub const DEFAULT_STABILITY: f32 = 1.0;

/// Default difficulty for a card that has never been reviewed.
pub const DEFAULT_DIFFICULTY: f32 = 5.0;

/// Phase discriminant without step data, as persisted by stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PhaseKind {
    New,
    Learning,
    Review,
    Relearning,
}

/// Where a card sits in the learning lifecycle.
///
/// ```text
/// New ──any──▶ Learning ──steps done──▶ Review ──Again──▶ Relearning
///                 ▲  │Again                ▲                 │
///                 └──┘                     └───steps done────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Phase {
    /// Never reviewed.
    #[default]
    New,
    /// Initial learning. `step` counts successful learning reviews.
    Learning { step: u32 },
    /// Regular spaced review.
    Review,
    /// Recovering from a lapse. `step` counts successful relearning reviews.
    Relearning { step: u32 },
}

impl Phase {
    /// Get the phase discriminant.
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::New => PhaseKind::New,
            Phase::Learning { .. } => PhaseKind::Learning,
            Phase::Review => PhaseKind::Review,
            Phase::Relearning { .. } => PhaseKind::Relearning,
        }
    }

    /// Step counter of the learning phases, zero for every other phase.
    pub fn step(&self) -> u32 {
        match self {
            Phase::Learning { step } | Phase::Relearning { step } => *step,
            _ => 0,
        }
    }

    /// Rebuild a phase from its persisted parts.
    pub fn from_parts(kind: PhaseKind, step: u32) -> Self {
        match kind {
            PhaseKind::New => Phase::New,
            PhaseKind::Learning => Phase::Learning { step },
            PhaseKind::Review => Phase::Review,
            PhaseKind::Relearning => Phase::Relearning { step },
        }
    }
}

/// Spaced repetition state for one card as seen by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub card_id: CardId,
    pub user_id: UserId,
    /// Days until recall probability drops to the reference threshold.
    pub stability: f32,
    /// Intrinsic item hardness (higher = harder).
    pub difficulty: f32,
    /// Successful reviews since the last lapse.
    pub repetitions: u32,
    /// Failed reviews ever.
    pub lapses: u32,
    /// The card is eligible for review once `now >= due_at`.
    pub due_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub phase: Phase,
    /// Compare-and-swap token; 0 until first persisted.
    #[serde(default)]
    pub version: u64,
}

impl ReviewState {
    /// Create a never-reviewed state with default stability and difficulty,
    /// immediately due at `now`.
    pub fn new(card_id: CardId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self::with_defaults(card_id, user_id, DEFAULT_STABILITY, DEFAULT_DIFFICULTY, now)
    }

    /// Create a never-reviewed state with explicit starting parameters.
    pub fn with_defaults(
        card_id: CardId,
        user_id: UserId,
        stability: f32,
        difficulty: f32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            card_id,
            user_id,
            stability,
            difficulty,
            repetitions: 0,
            lapses: 0,
            due_at: now,
            last_reviewed_at: None,
            phase: Phase::New,
            version: 0,
        }
    }

    /// Check if the card is due at `now` (boundary inclusive).
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.due_at
    }

    /// Whether this state has never been reviewed.
    pub fn is_new(&self) -> bool {
        self.phase == Phase::New
    }

    /// Version as seen by a compare-and-swap write: `None` before first persist.
    pub fn persisted_version(&self) -> Option<u64> {
        (self.version > 0).then_some(self.version)
    }
}

/// A card the planner may put into a session, with its state if any.
#[derive(Debug, Clone, PartialEq)]
pub struct DueCandidate {
    pub card_id: CardId,
    pub deck_id: DeckId,
    /// Creation time of the owning deck; new cards are grouped deck by deck in this order.
    pub deck_created_at: DateTime<Utc>,
    pub card_created_at: DateTime<Utc>,
    pub review: Option<ReviewState>,
}

impl DueCandidate {
    /// Candidate for a card the user has never been scheduled on.
    pub fn unscheduled(
        card_id: CardId,
        deck_id: DeckId,
        deck_created_at: DateTime<Utc>,
        card_created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            card_id,
            deck_id,
            deck_created_at,
            card_created_at,
            review: None,
        }
    }

    /// Attach an existing review state.
    pub fn with_review(mut self, review: ReviewState) -> Self {
        self.review = Some(review);
        self
    }

    /// Phase kind, treating a missing state as `New`.
    pub fn phase_kind(&self) -> PhaseKind {
        self.review
            .as_ref()
            .map(|r| r.phase.kind())
            .unwrap_or(PhaseKind::New)
    }

    /// Missing states are immediately due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.review.as_ref().map_or(true, |r| r.is_due(now))
    }

    /// Due time, if the card has a state.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.review.as_ref().map(|r| r.due_at)
    }
}
