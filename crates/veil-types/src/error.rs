//! Stable error-code contract.
//!
//! Every component error maps onto one of a small set of codes so callers
//! (RPC clients, external consumers such as Battle Royale) can branch on a
//! fixed string instead of a message.

/// Stable error codes.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const SELF_INTERACTION_FORBIDDEN: &str = "SELF_INTERACTION_FORBIDDEN";
    pub const INSUFFICIENT_FUNDS: &str = "INSUFFICIENT_FUNDS";
    pub const SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";
    pub const TARGET_HAS_NO_ANSWER: &str = "TARGET_HAS_NO_ANSWER";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONCURRENCY_CONFLICT: &str = "CONCURRENCY_CONFLICT";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// An error that can be reported with a stable code.
pub trait ErrorCode {
    /// One of the constants in [`codes`].
    fn code(&self) -> &'static str;
}

/// Failure to parse a closed enum from its wire/storage label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind}: {value:?}")]
pub struct ParseError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl ErrorCode for ParseError {
    fn code(&self) -> &'static str {
        codes::VALIDATION_ERROR
    }
}
