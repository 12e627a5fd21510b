//! # veil-disclosure
//!
//! Turns quiz answers into affinity and affinity into disclosure.
//!
//! A correct guess about the target's declared preference raises the
//! asker's affinity score towards the target; a wrong one lowers it and
//! costs currency. The score gates two things:
//!
//! - photo variants, through a per-photo tier that only ever ratchets up
//! - textual profile groups, recomputed from the live score on every read
//!
//! ## Modules
//!
//! - [`tiers`]: score thresholds for T1/T2/T3
//! - [`scorer`]: affinity deltas and persisted scores
//! - [`gate`]: photo tier ratchet and gallery view
//! - [`profile`]: live textual disclosure
//! - [`engine`]: the answer transaction

pub mod engine;
pub mod gate;
pub mod profile;
pub mod scorer;
pub mod tiers;

pub use engine::{AnswerOutcome, DisclosureEngine};
pub use gate::{GalleryPhoto, PhotoUpgrade, RevealOutcome, VisibilityGate};
pub use profile::{visible_groups, ProfileView};
pub use scorer::{AffinityScorer, AffinityUpdate, ScoringConfig};
pub use tiers::TierThresholds;

use veil_ledger::LedgerError;
use veil_store::StoreError;
use veil_types::{codes, ErrorCode, QuestionId, SessionId, UserId};

/// Error types for disclosure operations.
#[derive(Debug, thiserror::Error)]
pub enum DisclosureError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The target never declared a choice for this question.
    #[error("user {target_id} has no declared answer for question {question_id}")]
    TargetHasNoAnswer {
        target_id: UserId,
        question_id: QuestionId,
    },

    #[error("invalid disclosure request: {0}")]
    Validation(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for DisclosureError {
    fn code(&self) -> &'static str {
        match self {
            DisclosureError::SessionNotFound(_) => codes::SESSION_NOT_FOUND,
            DisclosureError::TargetHasNoAnswer { .. } => codes::TARGET_HAS_NO_ANSWER,
            DisclosureError::Validation(_) => codes::VALIDATION_ERROR,
            DisclosureError::Ledger(e) => e.code(),
            DisclosureError::Store(e) => e.code(),
        }
    }
}

/// Convenience result type for disclosure operations.
pub type Result<T> = std::result::Result<T, DisclosureError>;
