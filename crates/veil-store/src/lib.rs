//! # veil-store
//!
//! Repository traits for every persisted entity, plus the unit-of-work
//! contract that makes multi-entity writes atomic.
//!
//! Components never hold a database handle of their own. They receive the
//! open transaction (`&mut S where S: Store`) from the caller, which obtained
//! it through [`Transactional::atomically`]. Every backend (SQLite in
//! `veil-db`, [`MemoryStore`] for tests) implements these traits; the rest of
//! the workspace depends only on the traits.
//!
//! ## Modules
//!
//! - [`ledger`]: balances and ledger entries
//! - [`quiz`]: sessions, target preferences, answer records
//! - [`disclosure`]: photos, profile fields, affinity, visibility
//! - [`skill`]: skill aggregates
//! - [`memory`]: in-memory backend with fault injection

pub mod disclosure;
pub mod ledger;
pub mod memory;
pub mod quiz;
pub mod skill;

use veil_types::{codes, ErrorCode};

pub use disclosure::{AffinityRepo, PhotoRepo, ProfileRepo, VisibilityRepo};
pub use ledger::LedgerRepo;
pub use memory::{Faults, MemoryState, MemoryStore};
pub use quiz::{AnswerRepo, PreferenceRepo, SessionRepo};
pub use skill::SkillRepo;

/// Storage error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend could not serialize this write against a concurrent one.
    #[error("concurrent write conflict: {0}")]
    Conflict(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => codes::NOT_FOUND,
            StoreError::Conflict(_) => codes::CONCURRENCY_CONFLICT,
            StoreError::Constraint(_)
            | StoreError::Serialization(_)
            | StoreError::Backend(_) => codes::STORAGE_ERROR,
        }
    }
}

/// Convenience result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Every repository, reachable through one transaction handle.
pub trait Store:
    LedgerRepo
    + SessionRepo
    + PreferenceRepo
    + AnswerRepo
    + PhotoRepo
    + ProfileRepo
    + AffinityRepo
    + VisibilityRepo
    + SkillRepo
{
}

impl<T> Store for T where
    T: LedgerRepo
        + SessionRepo
        + PreferenceRepo
        + AnswerRepo
        + PhotoRepo
        + ProfileRepo
        + AffinityRepo
        + VisibilityRepo
        + SkillRepo
        + ?Sized
{
}

/// A backend that can run a closure as one all-or-nothing unit.
///
/// If `f` returns `Err`, nothing it wrote is observable afterwards. If it
/// returns `Ok`, everything it wrote is committed before `atomically`
/// returns.
pub trait Transactional {
    fn atomically<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn Store) -> std::result::Result<T, E>,
        E: From<StoreError>;
}
