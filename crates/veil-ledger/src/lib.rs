//! # veil-ledger
//!
//! The authoritative per-user currency account.
//!
//! Every balance change is paired with exactly one immutable
//! [`LedgerEntry`](veil_types::LedgerEntry); nothing else in the workspace
//! touches balance rows. Operations take the caller's open transaction, so
//! a debit composed into a larger unit (quiz start, answer penalty) commits
//! or rolls back with it.
//!
//! ## Modules
//!
//! - [`account`]: credit, debit, clamped penalty, balance reads
//! - [`audit`]: replay of the entry log against the balance row

pub mod account;
pub mod audit;

pub use account::{CurrencyLedger, LedgerReceipt, PenaltyOutcome, MAX_ACCOUNT_VALUE};
pub use audit::AuditReport;

use veil_store::StoreError;
use veil_types::{codes, ErrorCode, ParseError};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Malformed request (non-positive amount, unknown reason, overflow).
    #[error("invalid ledger request: {0}")]
    Validation(String),

    /// The account cannot cover a strict debit.
    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds {
        /// Current balance.
        available: u64,
        /// Requested debit.
        required: u64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ParseError> for LedgerError {
    fn from(err: ParseError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

impl ErrorCode for LedgerError {
    fn code(&self) -> &'static str {
        match self {
            LedgerError::Validation(_) => codes::VALIDATION_ERROR,
            LedgerError::InsufficientFunds { .. } => codes::INSUFFICIENT_FUNDS,
            LedgerError::Store(e) => e.code(),
        }
    }
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
