//! Skill aggregate query functions.

use rusqlite::{Connection, OptionalExtension, Row};
use veil_types::{SkillStat, UserId};

use super::sql_int;
use crate::Result;

fn skill_from_row(row: &Row<'_>) -> rusqlite::Result<SkillStat> {
    Ok(SkillStat {
        user_id: row.get(0)?,
        correct_count: row.get::<_, i64>(1)? as u64,
        total_attempts: row.get::<_, i64>(2)? as u64,
        accuracy: row.get(3)?,
        updated_at: row.get::<_, i64>(4)? as u64,
    })
}

/// Get a user's skill aggregate.
pub fn skill(conn: &Connection, user_id: UserId) -> Result<Option<SkillStat>> {
    let row = conn
        .query_row(
            "SELECT user_id, correct_count, total_attempts, accuracy, updated_at
             FROM skill_stats WHERE user_id = ?1",
            [user_id],
            skill_from_row,
        )
        .optional()?;
    Ok(row)
}

/// Insert or update a skill aggregate.
pub fn upsert_skill(conn: &Connection, stat: &SkillStat) -> Result<()> {
    conn.execute(
        "INSERT INTO skill_stats (user_id, correct_count, total_attempts, accuracy, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id) DO UPDATE SET
            correct_count = excluded.correct_count,
            total_attempts = excluded.total_attempts,
            accuracy = excluded.accuracy,
            updated_at = excluded.updated_at",
        rusqlite::params![
            stat.user_id,
            sql_int(stat.correct_count)?,
            sql_int(stat.total_attempts)?,
            stat.accuracy,
            sql_int(stat.updated_at)?,
        ],
    )?;
    Ok(())
}

/// Best users by accuracy, then attempts, then id.
pub fn top_skills(conn: &Connection, limit: u32) -> Result<Vec<SkillStat>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, correct_count, total_attempts, accuracy, updated_at
         FROM skill_stats
         ORDER BY accuracy DESC, total_attempts DESC, user_id ASC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit], skill_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
