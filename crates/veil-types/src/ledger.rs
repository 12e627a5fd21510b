//! Currency ledger structures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{EntryId, ParseError, Timestamp, UserId};

/// Why a ledger entry was written. Closed taxonomy; unknown labels are
/// rejected at parse time and never reach storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    QuizEnter,
    QuizWrong,
    TraitAdd,
    DailyBonus,
    PawnPhoto,
    PawnInfo,
    BattleRoyaleEnter,
    AdminGrant,
    Refund,
}

impl Reason {
    /// Every accepted reason, in declaration order.
    pub const ALL: [Reason; 9] = [
        Reason::QuizEnter,
        Reason::QuizWrong,
        Reason::TraitAdd,
        Reason::DailyBonus,
        Reason::PawnPhoto,
        Reason::PawnInfo,
        Reason::BattleRoyaleEnter,
        Reason::AdminGrant,
        Reason::Refund,
    ];

    /// Storage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::QuizEnter => "QUIZ_ENTER",
            Reason::QuizWrong => "QUIZ_WRONG",
            Reason::TraitAdd => "TRAIT_ADD",
            Reason::DailyBonus => "DAILY_BONUS",
            Reason::PawnPhoto => "PAWN_PHOTO",
            Reason::PawnInfo => "PAWN_INFO",
            Reason::BattleRoyaleEnter => "BATTLE_ROYALE_ENTER",
            Reason::AdminGrant => "ADMIN_GRANT",
            Reason::Refund => "REFUND",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reason {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reason::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseError::new("ledger reason", s))
    }
}

/// Aggregate currency account for one user.
///
/// `balance == total_earned - total_spent` always holds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyBalance {
    pub user_id: UserId,
    pub balance: u64,
    pub total_earned: u64,
    pub total_spent: u64,
}

impl CurrencyBalance {
    /// A fresh zero account.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// Whether the aggregate fields agree with each other.
    pub fn is_consistent(&self) -> bool {
        self.total_earned.checked_sub(self.total_spent) == Some(self.balance)
    }
}

/// An immutable signed currency movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub user_id: UserId,
    /// Positive for credits, negative for debits. Never zero.
    pub delta: i64,
    pub reason: Reason,
    /// Optional external reference (session id, photo id, ...).
    pub ref_id: Option<String>,
    pub created_at: Timestamp,
}

/// A ledger entry before the store assigns its id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub user_id: UserId,
    pub delta: i64,
    pub reason: Reason,
    pub ref_id: Option<String>,
    pub created_at: Timestamp,
}

impl NewLedgerEntry {
    pub fn into_entry(self, id: EntryId) -> LedgerEntry {
        LedgerEntry {
            id,
            user_id: self.user_id,
            delta: self.delta,
            reason: self.reason,
            ref_id: self.ref_id,
            created_at: self.created_at,
        }
    }
}
