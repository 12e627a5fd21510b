//! Incremental accuracy tracking.

use veil_store::SkillRepo;
use veil_types::{SkillStat, Timestamp, UserId};

use crate::{Result, SkillError};

/// Maintains `accuracy = correct_count / total_attempts` per user.
#[derive(Clone, Debug, Default)]
pub struct SkillTracker;

impl SkillTracker {
    pub fn new() -> Self {
        Self
    }

    /// Count one attempt for `user_id`.
    pub fn record<S>(
        &self,
        tx: &mut S,
        user_id: UserId,
        correct: bool,
        now: Timestamp,
    ) -> Result<SkillStat>
    where
        S: SkillRepo + ?Sized,
    {
        let mut stat = self.stat(tx, user_id)?;
        stat.total_attempts = stat
            .total_attempts
            .checked_add(1)
            .ok_or(SkillError::Overflow(user_id))?;
        if correct {
            stat.correct_count += 1;
        }
        stat.accuracy = accuracy(stat.correct_count, stat.total_attempts);
        stat.updated_at = now;

        tx.put_skill(&stat)?;
        tracing::debug!(
            user_id,
            correct,
            attempts = stat.total_attempts,
            accuracy = stat.accuracy,
            "skill: attempt recorded"
        );
        Ok(stat)
    }

    /// Current aggregate. A user with no attempts reads as zero.
    pub fn stat<S>(&self, tx: &S, user_id: UserId) -> Result<SkillStat>
    where
        S: SkillRepo + ?Sized,
    {
        Ok(tx
            .skill(user_id)?
            .unwrap_or_else(|| SkillStat::empty(user_id)))
    }
}

/// `correct / total`, or 0.0 before the first attempt.
pub fn accuracy(correct: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64
}
