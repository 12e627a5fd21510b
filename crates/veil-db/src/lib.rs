//! # veil-db
//!
//! SQLite backend for the Veil engine.
//!
//! ## Schema
//!
//! - WAL mode, foreign keys enforced
//! - All timestamps are Unix epoch seconds
//! - Ledger entries and answer records are append-only (enforced by triggers)
//! - Visibility tiers can only advance (enforced by trigger)
//! - Schema version stored in `PRAGMA user_version`
//!
//! [`Database`] implements [`veil_store::Transactional`]: each call to
//! `atomically` runs inside one `BEGIN IMMEDIATE` transaction that commits on
//! `Ok` and rolls back on `Err`.

pub mod migrations;
pub mod queries;
pub mod schema;
pub mod store;

use std::path::Path;

use rusqlite::{Connection, ErrorCode, TransactionBehavior};
use veil_store::{Store, StoreError, Transactional};

pub use store::SqliteStore;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, msg)) => {
                let detail = msg.unwrap_or_else(|| e.to_string());
                match e.code {
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                        StoreError::Conflict(detail)
                    }
                    ErrorCode::ConstraintViolation => StoreError::Constraint(detail),
                    _ => StoreError::Backend(detail),
                }
            }
            DbError::Sqlite(other) => StoreError::Backend(other.to_string()),
            DbError::Migration(msg) => StoreError::Backend(msg),
            DbError::NotFound(what) => StoreError::NotFound(what),
            DbError::Serialization(msg) => StoreError::Serialization(msg),
        }
    }
}

/// An open Veil database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// The underlying connection, for direct queries outside a transaction.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Open or create the Veil database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Database> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(Database { conn })
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Database> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(Database { conn })
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -8000;",
    )?;
    Ok(())
}

impl Transactional for Database {
    fn atomically<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn Store) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| E::from(StoreError::from(DbError::from(e))))?;

        let value = {
            let mut store = SqliteStore::new(&tx);
            f(&mut store)?
        };

        tx.commit()
            .map_err(|e| E::from(StoreError::from(DbError::from(e))))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_types::{NewLedgerEntry, Reason};

    #[test]
    fn test_open_memory() {
        let db = open_memory().expect("open in-memory db");
        let version: u32 = db
            .conn()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("get user_version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_open_file_wal_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = open(&dir.path().join("veil.db")).expect("open");
        let mode: String = db
            .conn()
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("get journal_mode");
        assert_eq!(mode, "wal");
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = open_memory().expect("open");
        let fk: i32 = db
            .conn()
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("get foreign_keys");
        assert_eq!(fk, 1);
    }

    fn grant(user_id: i64) -> NewLedgerEntry {
        NewLedgerEntry {
            user_id,
            delta: 10,
            reason: Reason::AdminGrant,
            ref_id: None,
            created_at: 1,
        }
    }

    #[test]
    fn test_atomically_commits() {
        let mut db = open_memory().expect("open");
        db.atomically(|tx| tx.append_entry(grant(1)).map(|_| ()))
            .expect("commit");
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM ledger_entries", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_atomically_rolls_back_on_error() {
        let mut db = open_memory().expect("open");
        let result: std::result::Result<(), StoreError> = db.atomically(|tx| {
            tx.append_entry(grant(1))?;
            Err(StoreError::Backend("abort".into()))
        });
        assert!(result.is_err());
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM ledger_entries", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_constraint_maps_to_store_constraint() {
        let db = open_memory().expect("open");
        let err = db
            .conn()
            .execute(
                "INSERT INTO currency_balances (user_id, balance, total_earned, total_spent)
                 VALUES (1, 5, 3, 0)",
                [],
            )
            .expect_err("inconsistent balance rejected");
        assert!(matches!(
            StoreError::from(DbError::from(err)),
            StoreError::Constraint(_)
        ));
    }
}
