//! Quiz storage traits.

use veil_types::{
    AnswerRecord, Choice, NewAnswerRecord, NewQuizSession, QuestionId, QuizSession, SessionId,
    TargetPreference, Timestamp, UserId,
};

use crate::Result;

/// Quiz sessions.
pub trait SessionRepo {
    fn insert_session(&mut self, session: NewQuizSession) -> Result<QuizSession>;

    fn session(&self, id: SessionId) -> Result<Option<QuizSession>>;

    /// Set `ended_at` if it is still unset. No-op otherwise.
    fn mark_session_ended(&mut self, id: SessionId, ended_at: Timestamp) -> Result<()>;

    /// Sessions opened by `asker_id` against `target_id` at or after `since`.
    fn count_sessions_since(
        &self,
        asker_id: UserId,
        target_id: UserId,
        since: Timestamp,
    ) -> Result<u32>;
}

/// Target preferences, written by the external quiz/content authority.
pub trait PreferenceRepo {
    fn target_choice(&self, target_id: UserId, question_id: QuestionId)
        -> Result<Option<Choice>>;

    /// Insert or replace a declared choice.
    fn put_preference(&mut self, preference: &TargetPreference) -> Result<()>;
}

/// Answer audit rows.
pub trait AnswerRepo {
    fn insert_answer(&mut self, answer: NewAnswerRecord) -> Result<AnswerRecord>;

    /// Answers for a session, oldest first.
    fn answers(&self, session_id: SessionId) -> Result<Vec<AnswerRecord>>;
}
