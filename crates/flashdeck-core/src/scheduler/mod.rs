//! Spaced repetition scheduling.
//!
//! A four-phase lifecycle (New, Learning, Review, Relearning) driven by a
//! stability/difficulty memory model with a power forgetting curve.

mod engine;

pub use engine::{SchedulePreview, Scheduler};
