//! Ledger storage trait.

use veil_types::{CurrencyBalance, LedgerEntry, NewLedgerEntry, UserId};

use crate::Result;

/// Balance rows and the append-only entry log.
///
/// Only `veil-ledger` writes through this trait; it keeps every balance
/// change paired with exactly one entry.
pub trait LedgerRepo {
    /// The balance row, or `None` if the user has never been credited.
    fn balance(&self, user_id: UserId) -> Result<Option<CurrencyBalance>>;

    /// Insert or replace the balance row.
    fn put_balance(&mut self, balance: &CurrencyBalance) -> Result<()>;

    /// Append an entry and return it with its assigned id.
    fn append_entry(&mut self, entry: NewLedgerEntry) -> Result<LedgerEntry>;

    /// All entries for a user, oldest first.
    fn entries(&self, user_id: UserId) -> Result<Vec<LedgerEntry>>;

    /// The most recent `limit` entries, newest first.
    fn recent_entries(&self, user_id: UserId, limit: usize) -> Result<Vec<LedgerEntry>> {
        let mut all = self.entries(user_id)?;
        all.reverse();
        all.truncate(limit);
        Ok(all)
    }
}
