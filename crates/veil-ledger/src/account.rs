//! Credit, debit and penalty operations.

use serde::{Deserialize, Serialize};
use veil_store::LedgerRepo;
use veil_types::{CurrencyBalance, LedgerEntry, NewLedgerEntry, Reason, Timestamp, UserId};

use crate::{LedgerError, Result};

/// The entry written by an operation and the balance it produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    pub entry: LedgerEntry,
    pub balance: CurrencyBalance,
}

/// Result of a clamped penalty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyOutcome {
    /// Amount the caller asked to take.
    pub requested: u64,
    /// Amount actually taken, `min(requested, balance)`.
    pub applied: u64,
    /// `None` when nothing was taken.
    pub entry: Option<LedgerEntry>,
    pub balance: CurrencyBalance,
}

/// Per-user currency accounts.
#[derive(Clone, Debug, Default)]
pub struct CurrencyLedger;

impl CurrencyLedger {
    pub fn new() -> Self {
        Self
    }

    /// Current aggregate. An absent account reads as zero.
    pub fn balance<S>(&self, tx: &S, user_id: UserId) -> Result<CurrencyBalance>
    where
        S: LedgerRepo + ?Sized,
    {
        Ok(tx
            .balance(user_id)?
            .unwrap_or_else(|| CurrencyBalance::empty(user_id)))
    }

    /// Add `amount` to the account, creating it if absent.
    pub fn credit<S>(
        &self,
        tx: &mut S,
        user_id: UserId,
        amount: u64,
        reason: Reason,
        ref_id: Option<&str>,
        now: Timestamp,
    ) -> Result<LedgerReceipt>
    where
        S: LedgerRepo + ?Sized,
    {
        let delta = signed_amount(amount)?;
        let mut balance = self.balance(tx, user_id)?;

        balance.balance = bounded_add(balance.balance, amount, "balance")?;
        balance.total_earned = bounded_add(balance.total_earned, amount, "total earned")?;

        let entry = self.write(tx, &balance, delta, reason, ref_id, now)?;
        tracing::debug!(user_id, amount, %reason, balance = balance.balance, "ledger: credit");
        Ok(LedgerReceipt { entry, balance })
    }

    /// Take `amount` from the account, or fail without writing anything.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientFunds`] if the balance is below `amount`
    /// - [`LedgerError::Validation`] if `amount` is zero or too large
    pub fn debit<S>(
        &self,
        tx: &mut S,
        user_id: UserId,
        amount: u64,
        reason: Reason,
        ref_id: Option<&str>,
        now: Timestamp,
    ) -> Result<LedgerReceipt>
    where
        S: LedgerRepo + ?Sized,
    {
        let delta = signed_amount(amount)?;
        let mut balance = self.balance(tx, user_id)?;

        if balance.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                available: balance.balance,
                required: amount,
            });
        }

        balance.balance -= amount;
        balance.total_spent = bounded_add(balance.total_spent, amount, "total spent")?;

        let entry = self.write(tx, &balance, -delta, reason, ref_id, now)?;
        tracing::debug!(user_id, amount, %reason, balance = balance.balance, "ledger: debit");
        Ok(LedgerReceipt { entry, balance })
    }

    /// Take up to `amount`, clamping at the available balance instead of
    /// failing. Writes no entry when nothing can be taken.
    pub fn penalize<S>(
        &self,
        tx: &mut S,
        user_id: UserId,
        amount: u64,
        reason: Reason,
        ref_id: Option<&str>,
        now: Timestamp,
    ) -> Result<PenaltyOutcome>
    where
        S: LedgerRepo + ?Sized,
    {
        signed_amount(amount)?;
        let available = self.balance(tx, user_id)?.balance;
        let applied = amount.min(available);

        if applied < amount {
            tracing::warn!(
                user_id,
                requested = amount,
                applied,
                "ledger: penalty clamped at available balance"
            );
        }

        if applied == 0 {
            return Ok(PenaltyOutcome {
                requested: amount,
                applied: 0,
                entry: None,
                balance: self.balance(tx, user_id)?,
            });
        }

        let receipt = self.debit(tx, user_id, applied, reason, ref_id, now)?;
        Ok(PenaltyOutcome {
            requested: amount,
            applied,
            entry: Some(receipt.entry),
            balance: receipt.balance,
        })
    }

    /// The most recent `limit` entries, newest first.
    pub fn history<S>(&self, tx: &S, user_id: UserId, limit: usize) -> Result<Vec<LedgerEntry>>
    where
        S: LedgerRepo + ?Sized,
    {
        Ok(tx.recent_entries(user_id, limit)?)
    }

    fn write<S>(
        &self,
        tx: &mut S,
        balance: &CurrencyBalance,
        delta: i64,
        reason: Reason,
        ref_id: Option<&str>,
        now: Timestamp,
    ) -> Result<LedgerEntry>
    where
        S: LedgerRepo + ?Sized,
    {
        let entry = tx.append_entry(NewLedgerEntry {
            user_id: balance.user_id,
            delta,
            reason,
            ref_id: ref_id.map(str::to_string),
            created_at: now,
        })?;
        tx.put_balance(balance)?;
        Ok(entry)
    }
}

/// Largest value any account counter may hold. Backends store counters as
/// signed 64-bit integers.
pub const MAX_ACCOUNT_VALUE: u64 = i64::MAX as u64;

fn bounded_add(current: u64, amount: u64, what: &str) -> Result<u64> {
    current
        .checked_add(amount)
        .filter(|total| *total <= MAX_ACCOUNT_VALUE)
        .ok_or_else(|| LedgerError::Validation(format!("{what} would exceed {MAX_ACCOUNT_VALUE}")))
}

/// Validate an amount and convert it to a positive entry delta.
fn signed_amount(amount: u64) -> Result<i64> {
    if amount == 0 {
        return Err(LedgerError::Validation("amount must be positive".into()));
    }
    i64::try_from(amount)
        .map_err(|_| LedgerError::Validation(format!("amount {amount} exceeds entry range")))
}
