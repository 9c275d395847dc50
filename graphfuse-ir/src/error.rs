//! Error types for graphfuse-ir

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Model / codec error type
///
/// Both variants signal that a spill-file writer and reader disagree on
/// the tuple format - an internal invariant violation, never a
/// recoverable data condition.
#[derive(Error, Debug)]
pub enum Error {
    /// A tuple line had the wrong number of fields
    #[error("malformed tuple line: expected {expected} fields, found {found}")]
    TupleArity {
        /// Fields the decoder was configured for
        expected: usize,
        /// Fields actually present on the line
        found: usize,
    },

    /// A term token could not be parsed back into a [`crate::Term`]
    #[error("malformed term token: {0}")]
    Term(String),
}

impl Error {
    /// Create a term-token error
    pub fn term(msg: impl Into<String>) -> Self {
        Error::Term(msg.into())
    }
}
