//! Session start, end and lookup.

use serde::{Deserialize, Serialize};
use veil_ledger::CurrencyLedger;
use veil_store::{Store, Transactional};
use veil_types::{
    NewQuizSession, QuizMode, QuizSession, Reason, SessionId, Timestamp, UserId,
    DEFAULT_ENTRY_COST, DEFAULT_MAX_STARTS_PER_HOUR, RATE_LIMIT_WINDOW_SECS,
};

use crate::{QuizError, Result, StartLimiter};

/// Quiz session settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Charged to the asker on every start. Zero makes sessions free.
    pub entry_cost: u64,
    pub max_starts_per_window: u32,
    pub window_secs: u64,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            entry_cost: DEFAULT_ENTRY_COST,
            max_starts_per_window: DEFAULT_MAX_STARTS_PER_HOUR,
            window_secs: RATE_LIMIT_WINDOW_SECS,
        }
    }
}

/// A freshly opened session and what the asker has left.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStart {
    pub session: QuizSession,
    pub remaining_balance: u64,
}

/// Opens and closes paid quiz sessions.
#[derive(Clone, Debug)]
pub struct QuizSessionCoordinator {
    entry_cost: u64,
    limiter: StartLimiter,
    ledger: CurrencyLedger,
}

impl Default for QuizSessionCoordinator {
    fn default() -> Self {
        Self::new(QuizConfig::default(), CurrencyLedger::new())
    }
}

impl QuizSessionCoordinator {
    pub fn new(config: QuizConfig, ledger: CurrencyLedger) -> Self {
        Self {
            entry_cost: config.entry_cost,
            limiter: StartLimiter::new(config.max_starts_per_window, config.window_secs),
            ledger,
        }
    }

    /// Open a session in its own transaction.
    pub fn start<D>(
        &self,
        db: &mut D,
        asker_id: UserId,
        target_id: UserId,
        mode: QuizMode,
        now: Timestamp,
    ) -> Result<SessionStart>
    where
        D: Transactional,
    {
        db.atomically(|tx| self.start_in(tx, asker_id, target_id, mode, now))
    }

    /// Open a session inside the caller's transaction.
    ///
    /// The session row is written first so the entry-cost debit can
    /// reference it; if the debit fails the caller's rollback removes both.
    ///
    /// # Errors
    ///
    /// - [`QuizError::SelfInteractionForbidden`] if `asker_id == target_id`
    /// - [`QuizError::RateLimited`] if the pair is at its start cap
    /// - [`QuizError::Ledger`] wrapping `InsufficientFunds` if the asker
    ///   cannot pay the entry cost
    pub fn start_in<S>(
        &self,
        tx: &mut S,
        asker_id: UserId,
        target_id: UserId,
        mode: QuizMode,
        now: Timestamp,
    ) -> Result<SessionStart>
    where
        S: Store + ?Sized,
    {
        if asker_id == target_id {
            return Err(QuizError::SelfInteractionForbidden(asker_id));
        }

        let prior_starts = self.limiter.check(tx, asker_id, target_id, now)?;

        let session = tx.insert_session(NewQuizSession {
            asker_id,
            target_id,
            mode,
            entry_cost: self.entry_cost,
            started_at: now,
        })?;

        let remaining_balance = if self.entry_cost > 0 {
            let ref_id = format!("session:{}", session.id);
            self.ledger
                .debit(
                    tx,
                    asker_id,
                    self.entry_cost,
                    Reason::QuizEnter,
                    Some(&ref_id),
                    now,
                )?
                .balance
                .balance
        } else {
            self.ledger.balance(tx, asker_id)?.balance
        };

        tracing::info!(
            session_id = session.id,
            asker_id,
            target_id,
            mode = mode.as_str(),
            entry_cost = self.entry_cost,
            starts_in_window = prior_starts + 1,
            "quiz: session started"
        );

        Ok(SessionStart {
            session,
            remaining_balance,
        })
    }

    /// Close a session in its own transaction.
    pub fn end<D>(&self, db: &mut D, session_id: SessionId, now: Timestamp) -> Result<QuizSession>
    where
        D: Transactional,
    {
        db.atomically(|tx| self.end_in(tx, session_id, now))
    }

    /// Set `ended_at` if unset. Ending an ended session is a no-op that
    /// returns the original timestamp.
    pub fn end_in<S>(&self, tx: &mut S, session_id: SessionId, now: Timestamp) -> Result<QuizSession>
    where
        S: Store + ?Sized,
    {
        let session = self.session(tx, session_id)?;
        if session.is_ended() {
            return Ok(session);
        }

        tx.mark_session_ended(session_id, now)?;
        tracing::info!(session_id, "quiz: session ended");
        self.session(tx, session_id)
    }

    /// Look up a session.
    pub fn session<S>(&self, tx: &S, session_id: SessionId) -> Result<QuizSession>
    where
        S: Store + ?Sized,
    {
        tx.session(session_id)?
            .ok_or(QuizError::SessionNotFound(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_ledger::LedgerError;
    use veil_store::{Faults, MemoryStore};
    use veil_types::{codes, ErrorCode};

    const NOW: Timestamp = 1_700_000_000;

    fn funded(amount: u64) -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .atomically(|tx| {
                CurrencyLedger::new().credit(tx, 1, amount, Reason::AdminGrant, None, 0)
            })
            .expect("fund");
        store
    }

    #[test]
    fn test_start_charges_entry_cost() {
        let mut store = funded(100);
        let quiz = QuizSessionCoordinator::default();
        let start = quiz
            .start(&mut store, 1, 2, QuizMode::Standard, NOW)
            .expect("start");
        assert_eq!(start.remaining_balance, 99);
        assert_eq!(start.session.entry_cost, 1);
        assert_eq!(start.session.started_at, NOW);
        assert!(start.session.ended_at.is_none());

        let entries = store.state().all_entries();
        let last = entries.last().expect("entry");
        assert_eq!(last.delta, -1);
        assert_eq!(last.reason, Reason::QuizEnter);
        assert_eq!(last.ref_id, Some(format!("session:{}", start.session.id)));
    }

    #[test]
    fn test_self_interaction_forbidden() {
        let mut store = funded(100);
        let quiz = QuizSessionCoordinator::default();
        let err = quiz
            .start(&mut store, 1, 1, QuizMode::Standard, NOW)
            .expect_err("self");
        assert_eq!(err.code(), codes::SELF_INTERACTION_FORBIDDEN);
    }

    #[test]
    fn test_insufficient_funds_creates_no_session() {
        let mut store = MemoryStore::new();
        let quiz = QuizSessionCoordinator::default();
        let err = quiz
            .start(&mut store, 1, 2, QuizMode::Standard, NOW)
            .expect_err("broke");
        assert!(matches!(
            err,
            QuizError::Ledger(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(err.code(), codes::INSUFFICIENT_FUNDS);
        assert!(quiz.session(store.state(), 1).is_err());
        assert!(store.state().all_entries().is_empty());
    }

    #[test]
    fn test_failed_session_insert_keeps_balance() {
        let mut store = funded(10);
        store.state_mut().set_faults(Faults {
            fail_session_insert: true,
            ..Faults::default()
        });
        let quiz = QuizSessionCoordinator::default();
        assert!(quiz.start(&mut store, 1, 2, QuizMode::Standard, NOW).is_err());
        let balance = CurrencyLedger::new()
            .balance(store.state(), 1)
            .expect("balance");
        assert_eq!(balance.balance, 10);
    }

    #[test]
    fn test_entry_cost_snapshot_survives_config_change() {
        let mut store = funded(100);
        let cheap = QuizSessionCoordinator::default();
        let start = cheap
            .start(&mut store, 1, 2, QuizMode::Standard, NOW)
            .expect("start");

        let pricey = QuizSessionCoordinator::new(
            QuizConfig {
                entry_cost: 5,
                ..QuizConfig::default()
            },
            CurrencyLedger::new(),
        );
        let stored = pricey.session(store.state(), start.session.id).expect("get");
        assert_eq!(stored.entry_cost, 1);
    }

    #[test]
    fn test_free_sessions_skip_ledger() {
        let mut store = MemoryStore::new();
        let quiz = QuizSessionCoordinator::new(
            QuizConfig {
                entry_cost: 0,
                ..QuizConfig::default()
            },
            CurrencyLedger::new(),
        );
        let start = quiz
            .start(&mut store, 1, 2, QuizMode::Rapid, NOW)
            .expect("start");
        assert_eq!(start.remaining_balance, 0);
        assert!(store.state().all_entries().is_empty());
    }

    #[test]
    fn test_rate_limit_applies_per_pair() {
        let mut store = funded(100);
        let quiz = QuizSessionCoordinator::new(
            QuizConfig {
                max_starts_per_window: 2,
                ..QuizConfig::default()
            },
            CurrencyLedger::new(),
        );
        quiz.start(&mut store, 1, 2, QuizMode::Standard, NOW).expect("first");
        quiz.start(&mut store, 1, 2, QuizMode::Standard, NOW + 1).expect("second");
        let err = quiz
            .start(&mut store, 1, 2, QuizMode::Standard, NOW + 2)
            .expect_err("third");
        assert_eq!(err.code(), codes::RATE_LIMITED);
        // A rejected start is not charged.
        let balance = CurrencyLedger::new().balance(store.state(), 1).expect("balance");
        assert_eq!(balance.balance, 98);

        quiz.start(&mut store, 1, 3, QuizMode::Standard, NOW + 2)
            .expect("other target");
        quiz.start(&mut store, 1, 2, QuizMode::Standard, NOW + 3_600)
            .expect("window rolled");
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut store = funded(10);
        let quiz = QuizSessionCoordinator::default();
        let start = quiz
            .start(&mut store, 1, 2, QuizMode::Standard, NOW)
            .expect("start");
        let first = quiz.end(&mut store, start.session.id, NOW + 60).expect("end");
        let second = quiz.end(&mut store, start.session.id, NOW + 120).expect("end again");
        assert_eq!(first.ended_at, Some(NOW + 60));
        assert_eq!(second.ended_at, first.ended_at);
    }

    #[test]
    fn test_end_unknown_session() {
        let mut store = MemoryStore::new();
        let quiz = QuizSessionCoordinator::default();
        let err = quiz.end(&mut store, 77, NOW).expect_err("missing");
        assert!(matches!(err, QuizError::SessionNotFound(77)));
        assert_eq!(err.code(), codes::SESSION_NOT_FOUND);
    }
}
