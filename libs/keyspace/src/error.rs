//! Error types for ID parsing and key decoding.

use thiserror::Error;

/// Errors that can occur when parsing IDs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The ID string is empty.
    #[error("ID cannot be empty")]
    Empty,

    /// The ID is not a non-negative decimal integer.
    #[error("invalid {kind} ID '{value}': {reason}")]
    InvalidNumber {
        kind: &'static str,
        value: String,
        reason: String,
    },
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }
}

/// Errors that can occur when decoding escaped keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// A `%` escape is truncated or not followed by two hex digits.
    #[error("invalid URL escape {escape:?} in key {input:?}")]
    InvalidEscape { input: String, escape: String },

    /// The decoded key is not valid UTF-8.
    #[error("decoded key {input:?} is not valid UTF-8")]
    InvalidUtf8 { input: String },
}
