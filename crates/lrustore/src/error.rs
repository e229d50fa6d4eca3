//! Error types for lrustore

use std::fmt;

/// Result type alias for lrustore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store construction and diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Store constructed with a capacity of zero
    ZeroCapacity,

    /// Key index and recency list disagree
    Invariant(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroCapacity => write!(f, "Invalid capacity: must be greater than 0"),
            Error::Invariant(msg) => write!(f, "Invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
