//! # veil-skill
//!
//! Per-user guessing accuracy, derived from answer correctness.
//!
//! The aggregate is a read model: it is updated as a side effect of each
//! submitted answer and has no write path of its own. Failures here are
//! logged by the caller and never abort the answer transaction.
//!
//! ## Modules
//!
//! - [`tracker`]: incremental accuracy updates and reads
//! - [`ranking`]: TTL-governed leaderboard cache

pub mod ranking;
pub mod tracker;

pub use ranking::{RankingCache, DEFAULT_RANKING_TTL_SECS};
pub use tracker::SkillTracker;

use veil_store::StoreError;
use veil_types::{codes, ErrorCode};

/// Error types for skill operations.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("attempt counter overflow for user {0}")]
    Overflow(veil_types::UserId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for SkillError {
    fn code(&self) -> &'static str {
        match self {
            SkillError::Overflow(_) => codes::VALIDATION_ERROR,
            SkillError::Store(e) => e.code(),
        }
    }
}

/// Convenience result type for skill operations.
pub type Result<T> = std::result::Result<T, SkillError>;
