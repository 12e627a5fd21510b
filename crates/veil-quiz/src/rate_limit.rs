//! Rolling-window cap on quiz starts per (asker, target) pair.
//!
//! A start at `now` counts every session of the pair with
//! `now - started_at < window_secs`. The count is read and then compared,
//! so two concurrent starts can both pass the last free slot; that is
//! acceptable at human interaction rates.

use veil_store::SessionRepo;
use veil_types::{Timestamp, UserId, DEFAULT_MAX_STARTS_PER_HOUR, RATE_LIMIT_WINDOW_SECS};

use crate::{QuizError, Result};

#[derive(Clone, Debug)]
pub struct StartLimiter {
    max_starts: u32,
    window_secs: u64,
}

impl Default for StartLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STARTS_PER_HOUR, RATE_LIMIT_WINDOW_SECS)
    }
}

impl StartLimiter {
    pub fn new(max_starts: u32, window_secs: u64) -> Self {
        Self {
            max_starts,
            window_secs,
        }
    }

    /// Earliest `started_at` still inside the window ending at `now`.
    pub fn window_start(&self, now: Timestamp) -> Timestamp {
        now.saturating_add(1).saturating_sub(self.window_secs)
    }

    /// Fail with [`QuizError::RateLimited`] if the pair is at its cap.
    /// Returns the number of starts already in the window.
    pub fn check<S>(
        &self,
        tx: &S,
        asker_id: UserId,
        target_id: UserId,
        now: Timestamp,
    ) -> Result<u32>
    where
        S: SessionRepo + ?Sized,
    {
        let count = tx.count_sessions_since(asker_id, target_id, self.window_start(now))?;
        if count >= self.max_starts {
            tracing::debug!(asker_id, target_id, count, "quiz: start rate limited");
            return Err(QuizError::RateLimited {
                target_id,
                count,
                limit: self.max_starts,
                window_secs: self.window_secs,
            });
        }
        Ok(count)
    }
}
