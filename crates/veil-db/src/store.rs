//! Repository trait implementations over an open SQLite connection.

use rusqlite::Connection;
use veil_store::{
    AffinityRepo, AnswerRepo, LedgerRepo, PhotoRepo, PreferenceRepo, ProfileRepo, SessionRepo,
    SkillRepo, StoreError, VisibilityRepo,
};
use veil_types::{
    AffinityScore, AnswerRecord, Choice, CurrencyBalance, LedgerEntry, NewAnswerRecord,
    NewLedgerEntry, NewQuizSession, Photo, PhotoId, ProfileField, QuestionId, QuizSession,
    SessionId, SkillStat, TargetPreference, Timestamp, UserId, VisibilityState,
};

use crate::queries::{disclosure, ledger, quiz, skill};
use crate::DbError;

type Result<T> = std::result::Result<T, StoreError>;

/// A connection (normally an open transaction) seen through the
/// repository traits.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

fn lift<T>(r: crate::Result<T>) -> Result<T> {
    r.map_err(StoreError::from)
}

impl LedgerRepo for SqliteStore<'_> {
    fn balance(&self, user_id: UserId) -> Result<Option<CurrencyBalance>> {
        lift(ledger::balance(self.conn, user_id))
    }

    fn put_balance(&mut self, balance: &CurrencyBalance) -> Result<()> {
        lift(ledger::upsert_balance(self.conn, balance))
    }

    fn append_entry(&mut self, entry: NewLedgerEntry) -> Result<LedgerEntry> {
        lift(ledger::insert_entry(self.conn, entry))
    }

    fn entries(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        lift(ledger::entries(self.conn, user_id))
    }

    fn recent_entries(&self, user_id: UserId, limit: usize) -> Result<Vec<LedgerEntry>> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        lift(ledger::recent_entries(self.conn, user_id, limit))
    }
}

impl SessionRepo for SqliteStore<'_> {
    fn insert_session(&mut self, session: NewQuizSession) -> Result<QuizSession> {
        lift(quiz::insert_session(self.conn, session))
    }

    fn session(&self, id: SessionId) -> Result<Option<QuizSession>> {
        lift(quiz::session(self.conn, id))
    }

    fn mark_session_ended(&mut self, id: SessionId, ended_at: Timestamp) -> Result<()> {
        if quiz::session(self.conn, id).map_err(StoreError::from)?.is_none() {
            return Err(DbError::NotFound(format!("session {id}")).into());
        }
        lift(quiz::end_session(self.conn, id, ended_at)).map(|_| ())
    }

    fn count_sessions_since(
        &self,
        asker_id: UserId,
        target_id: UserId,
        since: Timestamp,
    ) -> Result<u32> {
        lift(quiz::count_sessions_since(self.conn, asker_id, target_id, since))
    }
}

impl PreferenceRepo for SqliteStore<'_> {
    fn target_choice(
        &self,
        target_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<Choice>> {
        lift(quiz::target_choice(self.conn, target_id, question_id))
    }

    fn put_preference(&mut self, preference: &TargetPreference) -> Result<()> {
        lift(quiz::upsert_preference(self.conn, preference))
    }
}

impl AnswerRepo for SqliteStore<'_> {
    fn insert_answer(&mut self, answer: NewAnswerRecord) -> Result<AnswerRecord> {
        lift(quiz::insert_answer(self.conn, answer))
    }

    fn answers(&self, session_id: SessionId) -> Result<Vec<AnswerRecord>> {
        lift(quiz::answers(self.conn, session_id))
    }
}

impl PhotoRepo for SqliteStore<'_> {
    fn put_photo(&mut self, photo: &Photo) -> Result<()> {
        lift(disclosure::upsert_photo(self.conn, photo))
    }

    fn approved_photos(&self, owner_id: UserId) -> Result<Vec<Photo>> {
        lift(disclosure::approved_photos(self.conn, owner_id))
    }
}

impl ProfileRepo for SqliteStore<'_> {
    fn put_profile_field(&mut self, field: &ProfileField) -> Result<()> {
        lift(disclosure::upsert_profile_field(self.conn, field))
    }

    fn profile_fields(&self, user_id: UserId) -> Result<Vec<ProfileField>> {
        lift(disclosure::profile_fields(self.conn, user_id))
    }
}

impl AffinityRepo for SqliteStore<'_> {
    fn affinity(&self, viewer_id: UserId, target_id: UserId) -> Result<Option<AffinityScore>> {
        lift(disclosure::affinity(self.conn, viewer_id, target_id))
    }

    fn put_affinity(&mut self, score: &AffinityScore) -> Result<()> {
        lift(disclosure::upsert_affinity(self.conn, score))
    }
}

impl VisibilityRepo for SqliteStore<'_> {
    fn visibility(
        &self,
        viewer_id: UserId,
        photo_id: PhotoId,
    ) -> Result<Option<VisibilityState>> {
        lift(disclosure::visibility(self.conn, viewer_id, photo_id))
    }

    fn put_visibility(&mut self, state: &VisibilityState) -> Result<()> {
        lift(disclosure::upsert_visibility(self.conn, state))
    }
}

impl SkillRepo for SqliteStore<'_> {
    fn skill(&self, user_id: UserId) -> Result<Option<SkillStat>> {
        lift(skill::skill(self.conn, user_id))
    }

    fn put_skill(&mut self, stat: &SkillStat) -> Result<()> {
        lift(skill::upsert_skill(self.conn, stat))
    }

    fn top_skills(&self, limit: usize) -> Result<Vec<SkillStat>> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        lift(skill::top_skills(self.conn, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_store::Transactional;

    #[test]
    fn test_end_unknown_session_is_not_found() {
        let mut db = crate::open_memory().expect("open");
        let result = db.atomically(|tx| tx.mark_session_ended(42, 100));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_store_through_transaction() {
        let mut db = crate::open_memory().expect("open");
        db.atomically(|tx| {
            tx.put_preference(&TargetPreference {
                target_id: 2,
                question_id: 1,
                choice: Choice::Left,
            })
        })
        .expect("write");
        let choice = db
            .atomically(|tx| tx.target_choice(2, 1))
            .expect("read");
        assert_eq!(choice, Some(Choice::Left));
    }
}
