//! Quiz session, preference and answer query functions.

use rusqlite::{Connection, OptionalExtension, Row};
use veil_types::{
    AnswerRecord, Choice, NewAnswerRecord, NewQuizSession, QuestionId, QuizSession, SessionId,
    TargetPreference, Timestamp, UserId,
};

use super::{parse_label, sql_int};
use crate::Result;

/// Insert a session, returning it with its assigned id.
pub fn insert_session(conn: &Connection, session: NewQuizSession) -> Result<QuizSession> {
    conn.execute(
        "INSERT INTO quiz_sessions (asker_id, target_id, mode, entry_cost, started_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            session.asker_id,
            session.target_id,
            session.mode.as_str(),
            sql_int(session.entry_cost)?,
            sql_int(session.started_at)?,
        ],
    )?;
    Ok(session.into_session(conn.last_insert_rowid()))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<QuizSession> {
    Ok(QuizSession {
        id: row.get(0)?,
        asker_id: row.get(1)?,
        target_id: row.get(2)?,
        mode: parse_label(3, row.get(3)?)?,
        entry_cost: row.get::<_, i64>(4)? as u64,
        started_at: row.get::<_, i64>(5)? as u64,
        ended_at: row.get::<_, Option<i64>>(6)?.map(|t| t as u64),
    })
}

/// Get a session by id.
pub fn session(conn: &Connection, id: SessionId) -> Result<Option<QuizSession>> {
    let row = conn
        .query_row(
            "SELECT id, asker_id, target_id, mode, entry_cost, started_at, ended_at
             FROM quiz_sessions WHERE id = ?1",
            [id],
            session_from_row,
        )
        .optional()?;
    Ok(row)
}

/// Set `ended_at` unless already set. Returns whether a row changed.
pub fn end_session(conn: &Connection, id: SessionId, ended_at: Timestamp) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE quiz_sessions SET ended_at = ?1 WHERE id = ?2 AND ended_at IS NULL",
        rusqlite::params![sql_int(ended_at)?, id],
    )?;
    Ok(updated > 0)
}

/// Count sessions for a pair started at or after `since`.
pub fn count_sessions_since(
    conn: &Connection,
    asker_id: UserId,
    target_id: UserId,
    since: Timestamp,
) -> Result<u32> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM quiz_sessions
         WHERE asker_id = ?1 AND target_id = ?2 AND started_at >= ?3",
        rusqlite::params![asker_id, target_id, sql_int(since)?],
        |row| row.get(0),
    )?;
    Ok(count as u32)
}

/// Get a target's declared choice for a question.
pub fn target_choice(
    conn: &Connection,
    target_id: UserId,
    question_id: QuestionId,
) -> Result<Option<Choice>> {
    let row = conn
        .query_row(
            "SELECT choice FROM target_preferences WHERE target_id = ?1 AND question_id = ?2",
            rusqlite::params![target_id, question_id],
            |row| parse_label(0, row.get(0)?),
        )
        .optional()?;
    Ok(row)
}

/// Insert or replace a declared choice.
pub fn upsert_preference(conn: &Connection, preference: &TargetPreference) -> Result<()> {
    conn.execute(
        "INSERT INTO target_preferences (target_id, question_id, choice)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(target_id, question_id) DO UPDATE SET choice = excluded.choice",
        rusqlite::params![
            preference.target_id,
            preference.question_id,
            preference.choice.as_str(),
        ],
    )?;
    Ok(())
}

/// Insert an answer record, returning it with its assigned id.
pub fn insert_answer(conn: &Connection, answer: NewAnswerRecord) -> Result<AnswerRecord> {
    conn.execute(
        "INSERT INTO answer_records
         (session_id, question_id, asker_guess, target_choice, correct,
          delta_affinity, delta_currency, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            answer.session_id,
            answer.question_id,
            answer.asker_guess.as_str(),
            answer.target_choice.as_str(),
            answer.correct,
            answer.delta_affinity,
            answer.delta_currency,
            sql_int(answer.created_at)?,
        ],
    )?;
    Ok(answer.into_record(conn.last_insert_rowid()))
}

/// Answers for a session, oldest first.
pub fn answers(conn: &Connection, session_id: SessionId) -> Result<Vec<AnswerRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, question_id, asker_guess, target_choice, correct,
                delta_affinity, delta_currency, created_at
         FROM answer_records WHERE session_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt
        .query_map([session_id], |row| {
            Ok(AnswerRecord {
                id: row.get(0)?,
                session_id: row.get(1)?,
                question_id: row.get(2)?,
                asker_guess: parse_label(3, row.get(3)?)?,
                target_choice: parse_label(4, row.get(4)?)?,
                correct: row.get(5)?,
                delta_affinity: row.get(6)?,
                delta_currency: row.get(7)?,
                created_at: row.get::<_, i64>(8)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_types::QuizMode;

    fn test_db() -> crate::Database {
        crate::open_memory().expect("open test db")
    }

    fn new_session(asker_id: UserId, target_id: UserId, started_at: u64) -> NewQuizSession {
        NewQuizSession {
            asker_id,
            target_id,
            mode: QuizMode::Rapid,
            entry_cost: 1,
            started_at,
        }
    }

    #[test]
    fn test_session_round_trip() {
        let db = test_db();
        let inserted = insert_session(db.conn(), new_session(1, 2, 100)).expect("insert");
        let fetched = session(db.conn(), inserted.id).expect("get").expect("exists");
        assert_eq!(fetched, inserted);
        assert_eq!(fetched.mode, QuizMode::Rapid);
    }

    #[test]
    fn test_self_session_rejected_by_schema() {
        let db = test_db();
        assert!(insert_session(db.conn(), new_session(3, 3, 100)).is_err());
    }

    #[test]
    fn test_end_session_once() {
        let db = test_db();
        let s = insert_session(db.conn(), new_session(1, 2, 100)).expect("insert");
        assert!(end_session(db.conn(), s.id, 200).expect("end"));
        assert!(!end_session(db.conn(), s.id, 300).expect("end again"));
        let fetched = session(db.conn(), s.id).expect("get").expect("exists");
        assert_eq!(fetched.ended_at, Some(200));
    }

    #[test]
    fn test_count_sessions_window() {
        let db = test_db();
        for t in [100, 200, 300] {
            insert_session(db.conn(), new_session(1, 2, t)).expect("insert");
        }
        insert_session(db.conn(), new_session(2, 1, 300)).expect("reverse pair");
        assert_eq!(count_sessions_since(db.conn(), 1, 2, 200).expect("count"), 2);
        assert_eq!(count_sessions_since(db.conn(), 1, 2, 0).expect("count"), 3);
    }

    #[test]
    fn test_preference_upsert() {
        let db = test_db();
        assert!(target_choice(db.conn(), 2, 7).expect("get").is_none());
        let mut pref = TargetPreference {
            target_id: 2,
            question_id: 7,
            choice: Choice::Left,
        };
        upsert_preference(db.conn(), &pref).expect("insert");
        pref.choice = Choice::Right;
        upsert_preference(db.conn(), &pref).expect("replace");
        assert_eq!(target_choice(db.conn(), 2, 7).expect("get"), Some(Choice::Right));
    }

    #[test]
    fn test_answers_for_session() {
        let db = test_db();
        let s = insert_session(db.conn(), new_session(1, 2, 100)).expect("insert");
        let record = insert_answer(
            db.conn(),
            NewAnswerRecord {
                session_id: s.id,
                question_id: 7,
                asker_guess: Choice::Right,
                target_choice: Choice::Left,
                correct: false,
                delta_affinity: -1,
                delta_currency: -1,
                created_at: 150,
            },
        )
        .expect("insert answer");
        let all = answers(db.conn(), s.id).expect("answers");
        assert_eq!(all, vec![record]);
    }

    #[test]
    fn test_answer_requires_session() {
        let db = test_db();
        let result = insert_answer(
            db.conn(),
            NewAnswerRecord {
                session_id: 999,
                question_id: 7,
                asker_guess: Choice::Left,
                target_choice: Choice::Left,
                correct: true,
                delta_affinity: 3,
                delta_currency: 0,
                created_at: 150,
            },
        );
        assert!(result.is_err());
    }
}
