//! Session planning.
//!
//! Picks the cards a user should see now and puts them in a stable order:
//! relearning and freshly lapsed learning cards first, then new cards deck
//! by deck, then everything else by due date.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::config::PlannerConfig;
use crate::error::FlashdeckResult;
use crate::store::ReviewStore;
use crate::types::{CardId, DueCandidate, Phase, PhaseKind, UserId};

/// Ordering tier of a candidate. Lower tiers are reviewed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Relearning,
    New,
    Scheduled,
}

impl Tier {
    fn of(candidate: &DueCandidate) -> Self {
        match candidate.phase_kind() {
            PhaseKind::Relearning => Tier::Relearning,
            PhaseKind::Learning if is_lapsed_learning(candidate) => Tier::Relearning,
            PhaseKind::New => Tier::New,
            PhaseKind::Learning | PhaseKind::Review => Tier::Scheduled,
        }
    }
}

/// A learning card whose last review was a lapse: back at step 0 with a
/// lapse on record. A new card failed on first sight has no lapse.
fn is_lapsed_learning(candidate: &DueCandidate) -> bool {
    candidate
        .review
        .as_ref()
        .is_some_and(|state| state.phase == Phase::Learning { step: 0 } && state.lapses > 0)
}

/// Phase breakdown of a set of candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total: usize,
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    pub relearning: usize,
    /// Candidates eligible at the time the stats were taken.
    pub due: usize,
}

/// Builds review sessions from due candidates.
#[derive(Debug, Clone, Default)]
pub struct SessionPlanner {
    config: PlannerConfig,
}

impl SessionPlanner {
    /// Create a planner with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a planner with custom limits.
    ///
    /// Fails with `Configuration` if the limits do not validate.
    pub fn with_config(config: PlannerConfig) -> FlashdeckResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the active limits.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Load the user's due cards from `store` and order them into a session
    /// of at most `limit` cards.
    pub fn list_due_cards<S: ReviewStore + ?Sized>(
        &self,
        store: &S,
        user_id: &UserId,
        now: DateTime<Utc>,
        limit: usize,
    ) -> FlashdeckResult<Vec<CardId>> {
        let candidates = store.due_candidates(user_id, now)?;
        let session = self.plan(&candidates, now, limit);
        debug!(
            user_id = %user_id,
            candidates = candidates.len(),
            selected = session.len(),
            "Planned review session"
        );
        Ok(session)
    }

    /// Order `candidates` and cut the result to the batch size.
    ///
    /// Candidates that are not due at `now` are dropped. The result is a
    /// prefix of the full ordering, apart from new cards skipped once the
    /// per-session new-card cap is reached.
    pub fn plan(&self, candidates: &[DueCandidate], now: DateTime<Utc>, limit: usize) -> Vec<CardId> {
        let limit = limit.min(self.config.max_batch_size);
        if limit == 0 {
            return Vec::new();
        }

        let mut due: Vec<&DueCandidate> = candidates.iter().filter(|c| c.is_due(now)).collect();
        due.sort_by(|a, b| compare(a, b));

        let mut new_budget = self.config.new_cards_per_session.unwrap_or(usize::MAX);
        let mut session = Vec::with_capacity(limit.min(due.len()));
        for candidate in due {
            if session.len() == limit {
                break;
            }
            if Tier::of(candidate) == Tier::New {
                if new_budget == 0 {
                    continue;
                }
                new_budget -= 1;
            }
            session.push(candidate.card_id);
        }
        session
    }

    /// Count candidates per phase and how many are due at `now`.
    pub fn session_stats(&self, candidates: &[DueCandidate], now: DateTime<Utc>) -> SessionStats {
        candidates.iter().fold(SessionStats::default(), |mut stats, candidate| {
            stats.total += 1;
            match candidate.phase_kind() {
                PhaseKind::New => stats.new += 1,
                PhaseKind::Learning => stats.learning += 1,
                PhaseKind::Review => stats.review += 1,
                PhaseKind::Relearning => stats.relearning += 1,
            }
            if candidate.is_due(now) {
                stats.due += 1;
            }
            stats
        })
    }
}

fn compare(a: &DueCandidate, b: &DueCandidate) -> Ordering {
    let tier = Tier::of(a);
    tier.cmp(&Tier::of(b))
        .then_with(|| match tier {
            Tier::New => a
                .deck_created_at
                .cmp(&b.deck_created_at)
                .then_with(|| a.deck_id.cmp(&b.deck_id))
                .then_with(|| a.card_created_at.cmp(&b.card_created_at)),
            Tier::Relearning | Tier::Scheduled => a.due_at().cmp(&b.due_at()),
        })
        .then_with(|| a.card_id.cmp(&b.card_id))
}
