//! End-to-end fixtures for the Veil engine.
//!
//! [`Harness`] wires every component against one SQLite database, the same
//! way the daemon does, so the tests under `tests/` exercise the real
//! schema, triggers and transaction boundaries.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p veil-integration-tests
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use veil_db::{Database, SqliteStore};
use veil_disclosure::{AnswerOutcome, DisclosureEngine, ScoringConfig, TierThresholds};
use veil_ledger::CurrencyLedger;
use veil_quiz::{QuizConfig, QuizSessionCoordinator, SessionStart};
use veil_skill::SkillTracker;
use veil_store::{AffinityRepo, PhotoRepo, StoreError, Transactional};
use veil_types::{
    Choice, CurrencyBalance, Photo, PhotoId, PhotoStatus, PhotoVariant, QuestionId, QuizMode,
    Reason, SessionId, Tier, TargetPreference, Timestamp, UserId,
};

/// Simulated start time for deterministic testing.
pub const TEST_TIMESTAMP: Timestamp = 1_700_000_000;

/// Every component, sharing one database.
pub struct Harness {
    pub db: Database,
    pub ledger: CurrencyLedger,
    pub quiz: QuizSessionCoordinator,
    pub disclosure: DisclosureEngine,
    pub skills: SkillTracker,
    now: Timestamp,
}

impl Harness {
    /// Default configuration on an in-memory database.
    pub fn new() -> veil_db::Result<Self> {
        Ok(Self::with_db(veil_db::open_memory()?))
    }

    /// Default configuration on a database file.
    pub fn open(path: &Path) -> veil_db::Result<Self> {
        Ok(Self::with_db(veil_db::open(path)?))
    }

    fn with_db(db: Database) -> Self {
        let ledger = CurrencyLedger::new();
        let skills = SkillTracker::new();
        Self {
            db,
            quiz: QuizSessionCoordinator::new(QuizConfig::default(), ledger.clone()),
            disclosure: DisclosureEngine::new(
                ScoringConfig::default(),
                TierThresholds::default(),
                ledger.clone(),
                skills.clone(),
            ),
            ledger,
            skills,
            now: TEST_TIMESTAMP,
        }
    }

    /// Current simulated time.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Advance the simulated clock.
    pub fn advance(&mut self, secs: u64) {
        self.now += secs;
    }

    pub fn grant(&mut self, user_id: UserId, amount: u64) -> veil_ledger::Result<CurrencyBalance> {
        let now = self.now;
        let ledger = &self.ledger;
        self.db
            .atomically(|tx| ledger.credit(tx, user_id, amount, Reason::AdminGrant, None, now))
            .map(|receipt| receipt.balance)
    }

    pub fn declare(
        &mut self,
        target_id: UserId,
        question_id: QuestionId,
        choice: Choice,
    ) -> Result<(), StoreError> {
        self.db.atomically(|tx| {
            tx.put_preference(&TargetPreference {
                target_id,
                question_id,
                choice,
            })
        })
    }

    /// Store a photo with every variant key filled in.
    pub fn add_photo(
        &mut self,
        owner_id: UserId,
        photo_id: PhotoId,
        status: PhotoStatus,
    ) -> Result<(), StoreError> {
        let variant_keys: BTreeMap<PhotoVariant, String> = PhotoVariant::ALL
            .into_iter()
            .map(|v| (v, format!("{}/{photo_id}", v.as_str())))
            .collect();
        self.db.atomically(|tx| {
            tx.put_photo(&Photo {
                id: photo_id,
                owner_id,
                status,
                variant_keys,
            })
        })
    }

    pub fn start(&mut self, asker_id: UserId, target_id: UserId) -> veil_quiz::Result<SessionStart> {
        let now = self.now;
        self.quiz
            .start(&mut self.db, asker_id, target_id, QuizMode::Standard, now)
    }

    pub fn answer(
        &mut self,
        session_id: SessionId,
        question_id: QuestionId,
        guess: Choice,
    ) -> veil_disclosure::Result<AnswerOutcome> {
        let now = self.now;
        self.disclosure
            .submit_answer(&mut self.db, session_id, question_id, guess, now)
    }

    /// Read-only view of the database outside any transaction.
    pub fn reader(&self) -> SqliteStore<'_> {
        SqliteStore::new(self.db.conn())
    }

    pub fn balance(&self, user_id: UserId) -> veil_ledger::Result<u64> {
        Ok(self.ledger.balance(&self.reader(), user_id)?.balance)
    }

    pub fn score(&self, viewer_id: UserId, target_id: UserId) -> Result<u64, StoreError> {
        Ok(self
            .reader()
            .affinity(viewer_id, target_id)?
            .map(|a| a.score)
            .unwrap_or(0))
    }

    pub fn tier(&self, viewer_id: UserId, photo_id: PhotoId) -> veil_disclosure::Result<Tier> {
        self.disclosure
            .gate()
            .tier(&self.reader(), viewer_id, photo_id)
    }

    /// Photos of `owner_id` currently approved, by id.
    pub fn approved_photo_ids(&self, owner_id: UserId) -> Result<Vec<PhotoId>, StoreError> {
        Ok(self
            .reader()
            .approved_photos(owner_id)?
            .into_iter()
            .map(|p| p.id)
            .collect())
    }
}
