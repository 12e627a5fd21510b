//! In-memory backend for deterministic testing.
//!
//! [`MemoryStore::atomically`] runs the closure against a copy of the state
//! and swaps it in only on success, which gives the same all-or-nothing
//! behaviour as a SQLite transaction. [`Faults`] lets tests force specific
//! writes to fail mid-transaction.

use std::collections::{BTreeMap, HashMap};

use veil_types::{
    AffinityScore, AnswerRecord, Choice, CurrencyBalance, LedgerEntry, NewAnswerRecord,
    NewLedgerEntry, NewQuizSession, Photo, PhotoId, PhotoStatus, ProfileField, QuestionId,
    QuizSession, SessionId, SkillStat, TargetPreference, Timestamp, UserId, VisibilityState,
};

use crate::{
    AffinityRepo, AnswerRepo, LedgerRepo, PhotoRepo, PreferenceRepo, ProfileRepo, Result,
    SessionRepo, SkillRepo, Store, StoreError, Transactional, VisibilityRepo,
};

/// Writes that should fail while set.
#[derive(Clone, Debug, Default)]
pub struct Faults {
    pub fail_answer_insert: bool,
    pub fail_skill_write: bool,
    pub fail_session_insert: bool,
}

/// The full contents of an in-memory store.
#[derive(Clone, Debug, Default)]
pub struct MemoryState {
    balances: HashMap<UserId, CurrencyBalance>,
    entries: Vec<LedgerEntry>,
    sessions: BTreeMap<SessionId, QuizSession>,
    preferences: HashMap<(UserId, QuestionId), Choice>,
    answers: Vec<AnswerRecord>,
    photos: BTreeMap<PhotoId, Photo>,
    profile: BTreeMap<(UserId, veil_types::ProfileGroup, String), ProfileField>,
    affinity: HashMap<(UserId, UserId), AffinityScore>,
    visibility: HashMap<(UserId, PhotoId), VisibilityState>,
    skills: HashMap<UserId, SkillStat>,
    faults: Faults,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active fault set.
    pub fn set_faults(&mut self, faults: Faults) {
        self.faults = faults;
    }

    /// Every ledger entry across all users, oldest first.
    pub fn all_entries(&self) -> &[LedgerEntry] {
        &self.entries
    }
}

/// In-memory [`Transactional`] backend.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: MemoryState,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed state, for assertions.
    pub fn state(&self) -> &MemoryState {
        &self.state
    }

    /// Direct access to committed state, bypassing transactions.
    pub fn state_mut(&mut self) -> &mut MemoryState {
        &mut self.state
    }
}

impl Transactional for MemoryStore {
    fn atomically<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut dyn Store) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let mut working = self.state.clone();
        match f(&mut working) {
            Ok(value) => {
                self.state = working;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!("memory store: transaction rolled back");
                Err(e)
            }
        }
    }
}

fn next_id(len: usize) -> i64 {
    len as i64 + 1
}

impl LedgerRepo for MemoryState {
    fn balance(&self, user_id: UserId) -> Result<Option<CurrencyBalance>> {
        Ok(self.balances.get(&user_id).cloned())
    }

    fn put_balance(&mut self, balance: &CurrencyBalance) -> Result<()> {
        if !balance.is_consistent() {
            return Err(StoreError::Constraint(format!(
                "balance row for user {} is inconsistent",
                balance.user_id
            )));
        }
        self.balances.insert(balance.user_id, balance.clone());
        Ok(())
    }

    fn append_entry(&mut self, entry: NewLedgerEntry) -> Result<LedgerEntry> {
        if entry.delta == 0 {
            return Err(StoreError::Constraint("ledger entry delta is zero".into()));
        }
        let entry = entry.into_entry(next_id(self.entries.len()));
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn entries(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}

impl SessionRepo for MemoryState {
    fn insert_session(&mut self, session: NewQuizSession) -> Result<QuizSession> {
        if self.faults.fail_session_insert {
            return Err(StoreError::Backend("injected session insert failure".into()));
        }
        let session = session.into_session(next_id(self.sessions.len()));
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    fn session(&self, id: SessionId) -> Result<Option<QuizSession>> {
        Ok(self.sessions.get(&id).cloned())
    }

    fn mark_session_ended(&mut self, id: SessionId, ended_at: Timestamp) -> Result<()> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("session {id}")))?;
        if session.ended_at.is_none() {
            session.ended_at = Some(ended_at);
        }
        Ok(())
    }

    fn count_sessions_since(
        &self,
        asker_id: UserId,
        target_id: UserId,
        since: Timestamp,
    ) -> Result<u32> {
        Ok(self
            .sessions
            .values()
            .filter(|s| s.asker_id == asker_id && s.target_id == target_id && s.started_at >= since)
            .count() as u32)
    }
}

impl PreferenceRepo for MemoryState {
    fn target_choice(
        &self,
        target_id: UserId,
        question_id: QuestionId,
    ) -> Result<Option<Choice>> {
        Ok(self.preferences.get(&(target_id, question_id)).copied())
    }

    fn put_preference(&mut self, preference: &TargetPreference) -> Result<()> {
        self.preferences.insert(
            (preference.target_id, preference.question_id),
            preference.choice,
        );
        Ok(())
    }
}

impl AnswerRepo for MemoryState {
    fn insert_answer(&mut self, answer: NewAnswerRecord) -> Result<AnswerRecord> {
        if self.faults.fail_answer_insert {
            return Err(StoreError::Backend("injected answer insert failure".into()));
        }
        let record = answer.into_record(next_id(self.answers.len()));
        self.answers.push(record.clone());
        Ok(record)
    }

    fn answers(&self, session_id: SessionId) -> Result<Vec<AnswerRecord>> {
        Ok(self
            .answers
            .iter()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect())
    }
}

impl PhotoRepo for MemoryState {
    fn put_photo(&mut self, photo: &Photo) -> Result<()> {
        self.photos.insert(photo.id, photo.clone());
        Ok(())
    }

    fn approved_photos(&self, owner_id: UserId) -> Result<Vec<Photo>> {
        Ok(self
            .photos
            .values()
            .filter(|p| p.owner_id == owner_id && p.status == PhotoStatus::Approved)
            .cloned()
            .collect())
    }
}

impl ProfileRepo for MemoryState {
    fn put_profile_field(&mut self, field: &ProfileField) -> Result<()> {
        self.profile.insert(
            (field.user_id, field.group, field.name.clone()),
            field.clone(),
        );
        Ok(())
    }

    fn profile_fields(&self, user_id: UserId) -> Result<Vec<ProfileField>> {
        Ok(self
            .profile
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }
}

impl AffinityRepo for MemoryState {
    fn affinity(&self, viewer_id: UserId, target_id: UserId) -> Result<Option<AffinityScore>> {
        Ok(self.affinity.get(&(viewer_id, target_id)).cloned())
    }

    fn put_affinity(&mut self, score: &AffinityScore) -> Result<()> {
        self.affinity
            .insert((score.viewer_id, score.target_id), score.clone());
        Ok(())
    }
}

impl VisibilityRepo for MemoryState {
    fn visibility(
        &self,
        viewer_id: UserId,
        photo_id: PhotoId,
    ) -> Result<Option<VisibilityState>> {
        Ok(self.visibility.get(&(viewer_id, photo_id)).cloned())
    }

    fn put_visibility(&mut self, state: &VisibilityState) -> Result<()> {
        self.visibility
            .insert((state.viewer_id, state.photo_id), state.clone());
        Ok(())
    }
}

impl SkillRepo for MemoryState {
    fn skill(&self, user_id: UserId) -> Result<Option<SkillStat>> {
        Ok(self.skills.get(&user_id).cloned())
    }

    fn put_skill(&mut self, stat: &SkillStat) -> Result<()> {
        if self.faults.fail_skill_write {
            return Err(StoreError::Backend("injected skill write failure".into()));
        }
        self.skills.insert(stat.user_id, stat.clone());
        Ok(())
    }

    fn top_skills(&self, limit: usize) -> Result<Vec<SkillStat>> {
        let mut all: Vec<SkillStat> = self.skills.values().cloned().collect();
        all.sort_by(|a, b| {
            b.accuracy
                .total_cmp(&a.accuracy)
                .then(b.total_attempts.cmp(&a.total_attempts))
                .then(a.user_id.cmp(&b.user_id))
        });
        all.truncate(limit);
        Ok(all)
    }
}
