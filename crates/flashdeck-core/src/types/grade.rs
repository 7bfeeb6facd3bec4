//! Self-reported recall quality for a single review.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

use crate::error::{FlashdeckError, FlashdeckResult};

/// Grade for a review (ratings 1-4).
///
/// - Again (1): Complete failure to recall
/// - Hard (2): Recalled with difficulty
/// - Good (3): Recalled correctly
/// - Easy (4): Recalled with no effort
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[repr(u8)]
pub enum Grade {
    /// Complete failure to recall.
    Again = 1,
    /// Recalled with difficulty.
    Hard = 2,
    /// Recalled correctly.
    Good = 3,
    /// Recalled with no effort.
    Easy = 4,
}

impl Grade {
    /// All grades, worst to best.
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    /// Convert to rating value (1-4).
    pub fn to_rating(self) -> u8 {
        self as u8
    }

    /// Create from rating value.
    ///
    /// Returns None for invalid rating values.
    pub fn from_rating(rating: u8) -> Option<Self> {
        match rating {
            1 => Some(Grade::Again),
            2 => Some(Grade::Hard),
            3 => Some(Grade::Good),
            4 => Some(Grade::Easy),
            _ => None,
        }
    }

    /// Parse user input: a grade name (any case) or a rating digit.
    pub fn parse(input: &str) -> FlashdeckResult<Self> {
        let trimmed = input.trim();
        if let Ok(rating) = trimmed.parse::<u8>() {
            return Self::try_from(rating);
        }
        Grade::from_str(trimmed).map_err(|_| FlashdeckError::invalid_grade(input))
    }

    /// Whether this grade is a failed recall.
    pub fn is_failure(self) -> bool {
        self == Grade::Again
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.to_rating()
    }
}

impl TryFrom<u8> for Grade {
    type Error = FlashdeckError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Grade::from_rating(value).ok_or_else(|| FlashdeckError::invalid_grade(value))
    }
}

impl TryFrom<i64> for Grade {
    type Error = FlashdeckError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Grade::from_rating)
            .ok_or_else(|| FlashdeckError::invalid_grade(value))
    }
}
