//! Replay of the entry log against the stored balance row.
//!
//! ```text
//! replayed_earned  = Σ delta   for delta > 0
//! replayed_spent   = Σ -delta  for delta < 0
//! replayed_balance = replayed_earned - replayed_spent
//! ```
//!
//! The account is consistent when all three replayed figures equal the
//! stored row and no prefix of the log ever dipped below zero.

use serde::{Deserialize, Serialize};
use veil_store::LedgerRepo;
use veil_types::{CurrencyBalance, UserId};

use crate::{CurrencyLedger, LedgerError, Result};

/// Outcome of replaying one user's ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub user_id: UserId,
    pub entry_count: usize,
    pub replayed_balance: i64,
    pub replayed_earned: u64,
    pub replayed_spent: u64,
    /// Lowest running balance seen during replay.
    pub lowest_running_balance: i64,
    pub stored: CurrencyBalance,
    pub consistent: bool,
}

impl CurrencyLedger {
    /// Replay every entry of `user_id` and compare with the balance row.
    pub fn audit<S>(&self, tx: &S, user_id: UserId) -> Result<AuditReport>
    where
        S: LedgerRepo + ?Sized,
    {
        let entries = tx.entries(user_id)?;
        let stored = self.balance(tx, user_id)?;

        let mut earned: u64 = 0;
        let mut spent: u64 = 0;
        let mut running: i64 = 0;
        let mut lowest: i64 = 0;

        for entry in &entries {
            if entry.delta > 0 {
                earned = earned
                    .checked_add(entry.delta.unsigned_abs())
                    .ok_or_else(|| LedgerError::Validation("replay overflow".into()))?;
            } else {
                spent = spent
                    .checked_add(entry.delta.unsigned_abs())
                    .ok_or_else(|| LedgerError::Validation("replay overflow".into()))?;
            }
            running = running
                .checked_add(entry.delta)
                .ok_or_else(|| LedgerError::Validation("replay overflow".into()))?;
            lowest = lowest.min(running);
        }

        let consistent = lowest >= 0
            && u64::try_from(running).ok() == Some(stored.balance)
            && earned == stored.total_earned
            && spent == stored.total_spent;

        if !consistent {
            tracing::warn!(
                user_id,
                replayed = running,
                stored = stored.balance,
                "ledger: audit mismatch"
            );
        }

        Ok(AuditReport {
            user_id,
            entry_count: entries.len(),
            replayed_balance: running,
            replayed_earned: earned,
            replayed_spent: spent,
            lowest_running_balance: lowest,
            stored,
            consistent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use veil_store::MemoryState;
    use veil_types::{NewLedgerEntry, Reason};

    #[test]
    fn test_empty_account_is_consistent() {
        let state = MemoryState::new();
        let report = CurrencyLedger::new().audit(&state, 1).expect("audit");
        assert!(report.consistent);
        assert_eq!(report.entry_count, 0);
    }

    #[test]
    fn test_out_of_band_entry_detected() {
        let mut state = MemoryState::new();
        let ledger = CurrencyLedger::new();
        ledger
            .credit(&mut state, 1, 10, Reason::AdminGrant, None, 0)
            .expect("credit");
        // An entry with no matching balance change.
        state
            .append_entry(NewLedgerEntry {
                user_id: 1,
                delta: 5,
                reason: Reason::Refund,
                ref_id: None,
                created_at: 0,
            })
            .expect("append");
        let report = ledger.audit(&state, 1).expect("audit");
        assert!(!report.consistent);
        assert_eq!(report.replayed_balance, 15);
        assert_eq!(report.stored.balance, 10);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Credit(u64),
        Debit(u64),
        Penalize(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u64..50).prop_map(Op::Credit),
            (1u64..50).prop_map(Op::Debit),
            (1u64..50).prop_map(Op::Penalize),
        ]
    }

    proptest! {
        #[test]
        fn prop_balance_invariants_hold(ops in proptest::collection::vec(op(), 0..60)) {
            let mut state = MemoryState::new();
            let ledger = CurrencyLedger::new();
            for (i, op) in ops.into_iter().enumerate() {
                let now = i as u64;
                match op {
                    Op::Credit(a) => {
                        ledger.credit(&mut state, 1, a, Reason::DailyBonus, None, now)
                            .expect("credit always succeeds");
                    }
                    Op::Debit(a) => {
                        let before = ledger.balance(&state, 1).expect("balance");
                        match ledger.debit(&mut state, 1, a, Reason::QuizEnter, None, now) {
                            Ok(_) => prop_assert!(before.balance >= a),
                            Err(LedgerError::InsufficientFunds { .. }) => {
                                prop_assert!(before.balance < a);
                                prop_assert_eq!(ledger.balance(&state, 1).expect("balance"), before);
                            }
                            Err(e) => prop_assert!(false, "unexpected error: {e}"),
                        }
                    }
                    Op::Penalize(a) => {
                        ledger.penalize(&mut state, 1, a, Reason::QuizWrong, None, now)
                            .expect("penalty never fails");
                    }
                }
                let b = ledger.balance(&state, 1).expect("balance");
                prop_assert!(b.is_consistent());
            }
            let report = ledger.audit(&state, 1).expect("audit");
            prop_assert!(report.consistent);
        }
    }
}
