//! Affinity score updates.
//!
//! ```text
//! delta     = correct ? +alpha : -beta
//! new_score = max(0, old_score + delta)
//! ```
//!
//! Scores are only ever computed here; no caller supplies an absolute
//! value. `stages_unlocked` grows with every tier the score reaches and
//! never shrinks.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use veil_store::AffinityRepo;
use veil_types::{
    AffinityScore, Tier, Timestamp, UserId, DEFAULT_ALPHA, DEFAULT_BETA, DEFAULT_WRONG_PENALTY,
};

use crate::{Result, TierThresholds};

/// Per-answer weights.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Affinity gained for a correct guess.
    pub alpha: u64,
    /// Affinity lost for a wrong guess.
    pub beta: u64,
    /// Currency taken for a wrong guess, clamped at the asker's balance.
    pub wrong_penalty: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            wrong_penalty: DEFAULT_WRONG_PENALTY,
        }
    }
}

/// A persisted score change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityUpdate {
    pub previous_score: u64,
    pub score: AffinityScore,
    /// Stages first reached by this update.
    pub new_stages: BTreeSet<Tier>,
}

#[derive(Clone, Debug)]
pub struct AffinityScorer {
    alpha: u64,
    beta: u64,
    thresholds: TierThresholds,
}

impl Default for AffinityScorer {
    fn default() -> Self {
        Self::new(&ScoringConfig::default(), TierThresholds::default())
    }
}

impl AffinityScorer {
    pub fn new(config: &ScoringConfig, thresholds: TierThresholds) -> Self {
        Self {
            alpha: config.alpha,
            beta: config.beta,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Signed affinity change for one answer.
    pub fn delta(&self, correct: bool) -> i64 {
        let magnitude = if correct { self.alpha } else { self.beta };
        let magnitude = i64::try_from(magnitude).unwrap_or(i64::MAX);
        if correct {
            magnitude
        } else {
            -magnitude
        }
    }

    /// Stored score of `viewer_id` towards `target_id`. Absent reads as zero.
    pub fn score<S>(&self, tx: &S, viewer_id: UserId, target_id: UserId) -> Result<AffinityScore>
    where
        S: AffinityRepo + ?Sized,
    {
        Ok(tx
            .affinity(viewer_id, target_id)?
            .unwrap_or_else(|| AffinityScore::empty(viewer_id, target_id)))
    }

    /// Apply `delta` to the pair's score, floored at zero, and persist it.
    pub fn apply<S>(
        &self,
        tx: &mut S,
        viewer_id: UserId,
        target_id: UserId,
        delta: i64,
        now: Timestamp,
    ) -> Result<AffinityUpdate>
    where
        S: AffinityRepo + ?Sized,
    {
        let mut score = self.score(tx, viewer_id, target_id)?;
        let previous_score = score.score;

        score.score = if delta >= 0 {
            previous_score.saturating_add(delta.unsigned_abs())
        } else {
            previous_score.saturating_sub(delta.unsigned_abs())
        };
        score.last_interaction_at = now;

        let reached = self.thresholds.tier_for(score.score);
        let new_stages: BTreeSet<Tier> = Tier::crossed(Tier::Locked, reached)
            .filter(|t| !score.stages_unlocked.contains(t))
            .collect();
        score.stages_unlocked.extend(new_stages.iter().copied());

        tx.put_affinity(&score)?;
        tracing::debug!(
            viewer_id,
            target_id,
            previous_score,
            score = score.score,
            "affinity: score updated"
        );

        Ok(AffinityUpdate {
            previous_score,
            score,
            new_stages,
        })
    }
}
