//! # veil-quiz
//!
//! Paid quiz sessions between an asker and a target.
//!
//! Opening a session charges the asker a fixed entry cost through the
//! ledger; the charge and the session row are written in one transaction.
//! Starts are rate limited per (asker, target) pair over a rolling window.
//!
//! ## Modules
//!
//! - [`coordinator`]: start, end and lookup of sessions
//! - [`rate_limit`]: rolling-window start cap

pub mod coordinator;
pub mod rate_limit;

pub use coordinator::{QuizConfig, QuizSessionCoordinator, SessionStart};
pub use rate_limit::StartLimiter;

use veil_ledger::LedgerError;
use veil_store::StoreError;
use veil_types::{codes, ErrorCode, SessionId, UserId};

/// Error types for quiz session operations.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// A user tried to open a session against themselves.
    #[error("user {0} cannot quiz themselves")]
    SelfInteractionForbidden(UserId),

    /// Too many starts for this pair inside the window.
    #[error("rate limited: {count} starts against user {target_id} in the last {window_secs}s (limit {limit})")]
    RateLimited {
        /// Target of the rejected start.
        target_id: UserId,
        /// Starts already counted in the window.
        count: u32,
        /// Configured cap.
        limit: u32,
        /// Window length in seconds.
        window_secs: u64,
    },

    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("invalid quiz request: {0}")]
    Validation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for QuizError {
    fn code(&self) -> &'static str {
        match self {
            QuizError::SelfInteractionForbidden(_) => codes::SELF_INTERACTION_FORBIDDEN,
            QuizError::RateLimited { .. } => codes::RATE_LIMITED,
            QuizError::SessionNotFound(_) => codes::SESSION_NOT_FOUND,
            QuizError::Validation(_) => codes::VALIDATION_ERROR,
            QuizError::Ledger(e) => e.code(),
            QuizError::Store(e) => e.code(),
        }
    }
}

/// Convenience result type for quiz operations.
pub type Result<T> = std::result::Result<T, QuizError>;
