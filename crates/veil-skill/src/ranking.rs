//! Leaderboard cache.
//!
//! The ranking is recomputed from the store at most once per `ttl_secs`
//! for a given limit. Callers own the cache and pass it in; there is no
//! process-wide instance.

use veil_store::SkillRepo;
use veil_types::{SkillStat, Timestamp};

use crate::{Result, SkillTracker};

/// Default leaderboard freshness window.
pub const DEFAULT_RANKING_TTL_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct RankingCache {
    ttl_secs: u64,
    computed_at: Option<Timestamp>,
    limit: usize,
    entries: Vec<SkillStat>,
}

impl Default for RankingCache {
    fn default() -> Self {
        Self::new(DEFAULT_RANKING_TTL_SECS)
    }
}

impl RankingCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            computed_at: None,
            limit: 0,
            entries: Vec::new(),
        }
    }

    /// Whether a ranking computed for `limit` can still be served at `now`.
    pub fn is_fresh(&self, limit: usize, now: Timestamp) -> bool {
        match self.computed_at {
            Some(at) => self.limit == limit && now.saturating_sub(at) < self.ttl_secs,
            None => false,
        }
    }

    /// Drop the cached ranking so the next read recomputes it.
    pub fn invalidate(&mut self) {
        self.computed_at = None;
        self.entries.clear();
    }

    fn store(&mut self, limit: usize, now: Timestamp, entries: Vec<SkillStat>) {
        self.computed_at = Some(now);
        self.limit = limit;
        self.entries = entries;
    }
}

impl SkillTracker {
    /// Best `limit` users by accuracy, then attempts, then user id.
    pub fn leaderboard<S>(
        &self,
        tx: &S,
        cache: &mut RankingCache,
        limit: usize,
        now: Timestamp,
    ) -> Result<Vec<SkillStat>>
    where
        S: SkillRepo + ?Sized,
    {
        if cache.is_fresh(limit, now) {
            return Ok(cache.entries.clone());
        }
        let entries = tx.top_skills(limit)?;
        tracing::debug!(limit, rows = entries.len(), "skill: leaderboard recomputed");
        cache.store(limit, now, entries.clone());
        Ok(entries)
    }
}
