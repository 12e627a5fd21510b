//! Database migration system.
//!
//! Schema version stored in `PRAGMA user_version`. Migrations are forward-only.

use rusqlite::Connection;

use crate::{schema, DbError, Result, SCHEMA_VERSION};

/// Schema steps in order. Step `n` takes the database to version `n`.
const STEPS: &[(u32, &str)] = &[(1, schema::SCHEMA_V1)];

/// Bring the schema up to [`SCHEMA_VERSION`].
///
/// Each step runs in its own transaction together with the `user_version`
/// bump, so a failed step leaves the previous version intact.
pub fn run(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "database is at v{current}, this build supports up to v{SCHEMA_VERSION}"
        )));
    }

    for (version, sql) in STEPS.iter().filter(|(v, _)| *v > current) {
        tracing::info!(version, "db: applying schema step");
        let batch = format!("BEGIN;\n{sql}\nPRAGMA user_version = {version};\nCOMMIT;");
        if let Err(e) = conn.execute_batch(&batch) {
            let _ = conn.execute_batch("ROLLBACK;");
            return Err(DbError::Migration(format!("step v{version}: {e}")));
        }
    }

    Ok(())
}
