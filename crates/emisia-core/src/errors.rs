//! Error types shared across EMISIA crates.
//!
//! Conventions:
//! - load-time reference-data violations are `MalformedRecord`
//! - caller misuse (bad argument shapes) is `InvalidArgument`
//! - broken internal assumptions are `Invariant`
//!
//! A failed *resolution* is not an error: it is a domain outcome carried by
//! the engine's result type. Errors here are reserved for conditions that
//! must stop a load or signal a bug.

use thiserror::Error;

/// Result alias used throughout EMISIA crates.
pub type EmisiaResult<T> = Result<T, EmisiaError>;

#[derive(Debug, Error)]
pub enum EmisiaError {
    /// A caller-supplied argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A reference record violated a load-time invariant.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// An internal invariant did not hold.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl EmisiaError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn malformed_record(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let e = EmisiaError::malformed_record("value is negative");
        assert_eq!(e.to_string(), "malformed record: value is negative");
    }
}
