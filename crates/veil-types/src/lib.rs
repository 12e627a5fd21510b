//! # veil-types
//!
//! Shared domain types used across the Veil workspace: identifiers, the
//! closed ledger reason taxonomy, quiz/answer rows, visibility tiers and
//! the stable error-code contract every component error implements.

pub mod disclosure;
pub mod error;
pub mod ledger;
pub mod quiz;
pub mod skill;

pub use disclosure::{
    AffinityScore, Photo, PhotoStatus, PhotoVariant, ProfileField, ProfileGroup, Tier,
    VisibilityState,
};
pub use error::{codes, ErrorCode, ParseError};
pub use ledger::{CurrencyBalance, LedgerEntry, NewLedgerEntry, Reason};
pub use quiz::{
    AnswerRecord, Choice, NewAnswerRecord, NewQuizSession, QuizMode, QuizSession, TargetPreference,
};
pub use skill::SkillStat;

/// Common type aliases.
pub type UserId = i64;
pub type PhotoId = i64;
pub type QuestionId = i64;
pub type SessionId = i64;
pub type EntryId = i64;
pub type AnswerId = i64;
/// Unix epoch seconds.
pub type Timestamp = u64;

/// Currency charged to open a quiz session.
pub const DEFAULT_ENTRY_COST: u64 = 1;

/// Currency charged for a wrong guess (clamped at the asker's balance).
pub const DEFAULT_WRONG_PENALTY: u64 = 1;

/// Affinity gained for a correct guess.
pub const DEFAULT_ALPHA: u64 = 3;

/// Affinity lost for a wrong guess.
pub const DEFAULT_BETA: u64 = 1;

/// Default score thresholds for T1, T2 and T3.
pub const DEFAULT_TIER_THRESHOLDS: [u64; 3] = [20, 40, 60];

/// Rolling window for quiz start rate limiting (1 hour).
pub const RATE_LIMIT_WINDOW_SECS: u64 = 3600;

/// Maximum quiz starts per (asker, target) pair per window.
pub const DEFAULT_MAX_STARTS_PER_HOUR: u32 = 10;
