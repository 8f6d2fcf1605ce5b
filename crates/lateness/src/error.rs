//! Error types for expression parsing.

use thiserror::Error;

/// Why an elapsed-time expression failed to parse.
///
/// Every variant carries the offending input (whitespace-normalized copies
/// are *not* used here — offsets index into the string as given) and the
/// byte offset of the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input contained no tokens at all.
    #[error("empty expression: expected at least one '<quantity> <unit>' pair in {input:?}")]
    Empty {
        /// The input as given.
        input: String,
    },

    /// A token that should have been a non-negative integer quantity was
    /// something else (a word, a signed number, a decimal, ...).
    #[error("expected a quantity at byte {offset} in {input:?}")]
    ExpectedQuantity {
        /// The input as given.
        input: String,
        /// Byte offset of the offending token.
        offset: usize,
    },

    /// A quantity was all digits but does not fit the machine integer range.
    #[error("quantity {quantity:?} at byte {offset} is out of range")]
    QuantityOutOfRange {
        /// The input as given.
        input: String,
        /// The digit string that overflowed.
        quantity: String,
        /// Byte offset of the offending token.
        offset: usize,
    },

    /// The input ended where a unit keyword was required.
    #[error("expected a time unit after the quantity at byte {offset} in {input:?}")]
    ExpectedUnit {
        /// The input as given.
        input: String,
        /// Byte offset just past the end of the input.
        offset: usize,
    },

    /// A token in unit position did not match any known unit spelling.
    #[error("unknown time unit {word:?} at byte {offset} in {input:?}")]
    UnknownUnit {
        /// The input as given.
        input: String,
        /// The unrecognized token.
        word: String,
        /// Byte offset of the offending token.
        offset: usize,
    },

    /// The terms were all consumed but the mandatory `late` keyword never
    /// appeared.
    #[error("missing 'late' marker at end of {input:?}")]
    MissingDirection {
        /// The input as given.
        input: String,
        /// Byte offset just past the end of the input.
        offset: usize,
    },

    /// Extra tokens followed the `late` keyword.
    #[error("unexpected trailing input {rest:?} at byte {offset} in {input:?}")]
    TrailingInput {
        /// The input as given.
        input: String,
        /// The first trailing token.
        rest: String,
        /// Byte offset of the first trailing token.
        offset: usize,
    },
}

impl ParseError {
    /// The input the parser was given, unmodified.
    pub fn input(&self) -> &str {
        match self {
            Self::Empty { input }
            | Self::ExpectedQuantity { input, .. }
            | Self::QuantityOutOfRange { input, .. }
            | Self::ExpectedUnit { input, .. }
            | Self::UnknownUnit { input, .. }
            | Self::MissingDirection { input, .. }
            | Self::TrailingInput { input, .. } => input,
        }
    }

    /// Byte offset of the failure within [`input`](Self::input).
    pub fn offset(&self) -> usize {
        match self {
            Self::Empty { .. } => 0,
            Self::ExpectedQuantity { offset, .. }
            | Self::QuantityOutOfRange { offset, .. }
            | Self::ExpectedUnit { offset, .. }
            | Self::UnknownUnit { offset, .. }
            | Self::MissingDirection { offset, .. }
            | Self::TrailingInput { offset, .. } => *offset,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
