//! Currency ledger query functions.

use rusqlite::{Connection, OptionalExtension, Row};
use veil_types::{CurrencyBalance, LedgerEntry, NewLedgerEntry, UserId};

use super::{parse_label, sql_int};
use crate::Result;

/// Get the balance row for a user.
pub fn balance(conn: &Connection, user_id: UserId) -> Result<Option<CurrencyBalance>> {
    let row = conn
        .query_row(
            "SELECT user_id, balance, total_earned, total_spent
             FROM currency_balances WHERE user_id = ?1",
            [user_id],
            |row| {
                Ok(CurrencyBalance {
                    user_id: row.get(0)?,
                    balance: row.get::<_, i64>(1)? as u64,
                    total_earned: row.get::<_, i64>(2)? as u64,
                    total_spent: row.get::<_, i64>(3)? as u64,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Insert or update a balance row.
pub fn upsert_balance(conn: &Connection, balance: &CurrencyBalance) -> Result<()> {
    conn.execute(
        "INSERT INTO currency_balances (user_id, balance, total_earned, total_spent)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
            balance = excluded.balance,
            total_earned = excluded.total_earned,
            total_spent = excluded.total_spent",
        rusqlite::params![
            balance.user_id,
            sql_int(balance.balance)?,
            sql_int(balance.total_earned)?,
            sql_int(balance.total_spent)?,
        ],
    )?;
    Ok(())
}

/// Append a ledger entry, returning it with its assigned id.
pub fn insert_entry(conn: &Connection, entry: NewLedgerEntry) -> Result<LedgerEntry> {
    conn.execute(
        "INSERT INTO ledger_entries (user_id, delta, reason, ref_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            entry.user_id,
            entry.delta,
            entry.reason.as_str(),
            entry.ref_id,
            sql_int(entry.created_at)?,
        ],
    )?;
    Ok(entry.into_entry(conn.last_insert_rowid()))
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        delta: row.get(2)?,
        reason: parse_label(3, row.get(3)?)?,
        ref_id: row.get(4)?,
        created_at: row.get::<_, i64>(5)? as u64,
    })
}

/// All entries for a user, oldest first.
pub fn entries(conn: &Connection, user_id: UserId) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, delta, reason, ref_id, created_at
         FROM ledger_entries WHERE user_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt
        .query_map([user_id], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Most recent entries for a user, newest first.
pub fn recent_entries(conn: &Connection, user_id: UserId, limit: u32) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, delta, reason, ref_id, created_at
         FROM ledger_entries WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![user_id, limit], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
