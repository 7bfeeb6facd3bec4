//! Core types for flashdeck.

mod card;
mod grade;
mod review;

pub use card::*;
pub use grade::Grade;
pub use review::*;
