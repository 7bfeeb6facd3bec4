//! Error types for flashdeck operations.
//!
//! Every failure carries a structured [`ErrorCode`] so an API layer can map
//! it to a response without matching on message text.

use thiserror::Error;

use crate::types::{CardId, DeckId};

/// Result type alias for flashdeck operations.
pub type FlashdeckResult<T> = Result<T, FlashdeckError>;

/// Main error type for all flashdeck operations.
#[derive(Error, Debug)]
pub enum FlashdeckError {
    /// Grade input is not one of Again, Hard, Good, Easy.
    #[error("Invalid grade: {value}")]
    InvalidGrade { value: String },

    /// A review state violates its invariants and was rejected as-is.
    #[error("Invalid review state: {message}")]
    InvalidState {
        message: String,
        card_id: Option<CardId>,
    },

    /// Card does not exist in the store.
    #[error("Card not found: {card_id}")]
    CardNotFound { card_id: CardId },

    /// Deck does not exist in the store.
    #[error("Deck not found: {deck_id}")]
    DeckNotFound { deck_id: DeckId },

    /// The stored review state changed since it was read.
    #[error("Stale review state for card {card_id}: expected version {}, found {}", fmt_version(.expected), fmt_version(.actual))]
    StaleState {
        card_id: CardId,
        expected: Option<u64>,
        actual: Option<u64>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn fmt_version(version: &Option<u64>) -> String {
    match version {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Grade (GRADE_xxx)
    GradeInvalid,

    // Review state (STATE_xxx)
    StateInvalid,
    StateStale,

    // Lookups
    CardNotFound,
    DeckNotFound,

    // Database (DB_xxx)
    DbOperationFailed,

    // Configuration (CFG_xxx)
    ConfigInvalid,

    // IO / parsing
    IoFailed,
    ParseInvalidJson,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::GradeInvalid => "GRADE_001",
            ErrorCode::StateInvalid => "STATE_001",
            ErrorCode::StateStale => "STATE_002",
            ErrorCode::CardNotFound => "CARD_001",
            ErrorCode::DeckNotFound => "DECK_001",
            ErrorCode::DbOperationFailed => "DB_001",
            ErrorCode::ConfigInvalid => "CFG_001",
            ErrorCode::IoFailed => "IO_001",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl FlashdeckError {
    /// Create an invalid grade error from the rejected input.
    pub fn invalid_grade(value: impl ToString) -> Self {
        Self::InvalidGrade {
            value: value.to_string(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
            card_id: None,
        }
    }

    /// Create an invalid state error for a specific card.
    pub fn invalid_state_for(card_id: CardId, message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
            card_id: Some(card_id),
        }
    }

    /// Create a card not found error.
    pub fn card_not_found(card_id: CardId) -> Self {
        Self::CardNotFound { card_id }
    }

    /// Create a deck not found error.
    pub fn deck_not_found(deck_id: DeckId) -> Self {
        Self::DeckNotFound { deck_id }
    }

    /// Create a stale state error.
    pub fn stale(card_id: CardId, expected: Option<u64>, actual: Option<u64>) -> Self {
        Self::StaleState {
            card_id,
            expected,
            actual,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidGrade { .. } => ErrorCode::GradeInvalid,
            Self::InvalidState { .. } => ErrorCode::StateInvalid,
            Self::StaleState { .. } => ErrorCode::StateStale,
            Self::CardNotFound { .. } => ErrorCode::CardNotFound,
            Self::DeckNotFound { .. } => ErrorCode::DeckNotFound,
            Self::Database { .. } => ErrorCode::DbOperationFailed,
            Self::Configuration(_) => ErrorCode::ConfigInvalid,
            Self::Io(_) => ErrorCode::IoFailed,
            Self::Serialization(_) => ErrorCode::ParseInvalidJson,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Whether rereading state and submitting again can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleState { .. })
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::InvalidGrade { .. } => Some("Grade must be one of again, hard, good, easy (1-4)"),
            Self::StaleState { .. } => Some("Reload the card's review state and submit again"),
            Self::CardNotFound { .. } => Some("Please check the card ID and ensure it exists"),
            Self::DeckNotFound { .. } => Some("Please check the deck ID and ensure it exists"),
            Self::InvalidState { .. } => Some("The stored review state needs manual repair"),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for FlashdeckError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
