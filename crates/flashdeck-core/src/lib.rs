//! flashdeck-core - Spaced repetition engine for flashdeck.
//!
//! This crate schedules flashcard reviews, plans review sessions and
//! records graded answers against a pluggable review store.
//!
//! # Example
//!
//! ```ignore
//! use flashdeck_core::{
//!     Card, Deck, Grade, MemoryReviewStore, OutcomeRecorder, ReviewSubmission, SessionPlanner,
//! };
//!
//! let store = MemoryReviewStore::new();
//! let deck = Deck::new("user1", "Capitals");
//! let card = Card::new(deck.id, "France", "Paris");
//! store.create_deck(&deck)?;
//! store.add_card(&card)?;
//!
//! // Build a session of up to 20 cards
//! let now = chrono::Utc::now();
//! let session = SessionPlanner::new().list_due_cards(&store, &"user1".into(), now, 20)?;
//!
//! // Grade the first card
//! let recorder = OutcomeRecorder::default();
//! let next = recorder.record_review(
//!     &store,
//!     &ReviewSubmission::new(session[0], "user1".into(), Grade::Good, now),
//! )?;
//! ```

pub mod config;
pub mod error;
pub mod planner;
pub mod recorder;
pub mod scheduler;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{FlashdeckConfig, PlannerConfig, SchedulerConfig};
pub use error::{ErrorCode, FlashdeckError, FlashdeckResult};
pub use planner::{SessionPlanner, SessionStats};
pub use recorder::{OutcomeRecorder, ReviewSubmission};
pub use scheduler::{SchedulePreview, Scheduler};
pub use store::{MemoryReviewStore, ReviewStore, SqliteReviewStore};
pub use types::{
    Card, CardId, Deck, DeckId, DueCandidate, Grade, Phase, PhaseKind, ReviewState, UserId,
};
