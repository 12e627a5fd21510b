//! Answer resolution.
//!
//! One submitted answer becomes, inside a single transaction: a
//! correctness judgment against the target's declared choice, an optional
//! clamped currency penalty, an affinity update, a photo reveal pass, an
//! immutable answer record and a skill-stat update. Any failure except the
//! skill update rolls the whole unit back.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use veil_ledger::CurrencyLedger;
use veil_skill::SkillTracker;
use veil_store::{Store, Transactional};
use veil_types::{
    AnswerRecord, Choice, NewAnswerRecord, QuestionId, Reason, SessionId, Tier, Timestamp,
    UserId,
};

use crate::{
    AffinityScorer, DisclosureError, PhotoUpgrade, Result, ScoringConfig, TierThresholds,
    VisibilityGate,
};

/// Everything one answer changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub viewer_id: UserId,
    pub target_id: UserId,
    pub correct: bool,
    pub target_choice: Choice,
    pub delta_affinity: i64,
    /// Currency actually taken, after clamping. Zero or negative.
    pub delta_currency: i64,
    pub score: u64,
    /// Tiers the pair's score reached for the first time. Each tier appears
    /// here at most once over the life of the pair.
    pub stages_reached: BTreeSet<Tier>,
    /// `stages_reached` plus every tier a photo crossed in this call. A photo
    /// approved after the pair advanced reports its catch-up here again.
    pub crossed_tiers: BTreeSet<Tier>,
    pub upgrades: Vec<PhotoUpgrade>,
    pub answer: AnswerRecord,
}

impl AnswerOutcome {
    /// Whether this answer took the pair to the top tier for the first time.
    pub fn reached_top_tier(&self) -> bool {
        self.stages_reached.contains(&Tier::T3)
    }
}

#[derive(Clone, Debug)]
pub struct DisclosureEngine {
    wrong_penalty: u64,
    scorer: AffinityScorer,
    gate: VisibilityGate,
    ledger: CurrencyLedger,
    skills: SkillTracker,
}

impl Default for DisclosureEngine {
    fn default() -> Self {
        Self::new(
            ScoringConfig::default(),
            TierThresholds::default(),
            CurrencyLedger::new(),
            SkillTracker::new(),
        )
    }
}

impl DisclosureEngine {
    pub fn new(
        config: ScoringConfig,
        thresholds: TierThresholds,
        ledger: CurrencyLedger,
        skills: SkillTracker,
    ) -> Self {
        Self {
            wrong_penalty: config.wrong_penalty,
            scorer: AffinityScorer::new(&config, thresholds),
            gate: VisibilityGate::new(thresholds),
            ledger,
            skills,
        }
    }

    pub fn scorer(&self) -> &AffinityScorer {
        &self.scorer
    }

    pub fn gate(&self) -> &VisibilityGate {
        &self.gate
    }

    /// Resolve one answer in its own transaction.
    pub fn submit_answer<D>(
        &self,
        db: &mut D,
        session_id: SessionId,
        question_id: QuestionId,
        guess: Choice,
        now: Timestamp,
    ) -> Result<AnswerOutcome>
    where
        D: Transactional,
    {
        db.atomically(|tx| self.submit_answer_in(tx, session_id, question_id, guess, now))
    }

    /// Resolve one answer inside the caller's transaction.
    ///
    /// # Errors
    ///
    /// - [`DisclosureError::SessionNotFound`] if the session does not exist
    /// - [`DisclosureError::Validation`] if the session has ended
    /// - [`DisclosureError::TargetHasNoAnswer`] if the target never declared
    ///   a choice for `question_id`
    pub fn submit_answer_in<S>(
        &self,
        tx: &mut S,
        session_id: SessionId,
        question_id: QuestionId,
        guess: Choice,
        now: Timestamp,
    ) -> Result<AnswerOutcome>
    where
        S: Store + ?Sized,
    {
        let session = tx
            .session(session_id)?
            .ok_or(DisclosureError::SessionNotFound(session_id))?;
        if session.is_ended() {
            return Err(DisclosureError::Validation(format!(
                "session {session_id} has ended"
            )));
        }
        let (viewer_id, target_id) = (session.asker_id, session.target_id);

        let target_choice = tx.target_choice(target_id, question_id)?.ok_or(
            DisclosureError::TargetHasNoAnswer {
                target_id,
                question_id,
            },
        )?;

        let correct = guess == target_choice;
        let delta_affinity = self.scorer.delta(correct);

        let mut delta_currency: i64 = 0;
        if !correct && self.wrong_penalty > 0 {
            let ref_id = format!("session:{session_id}");
            let penalty = self.ledger.penalize(
                tx,
                viewer_id,
                self.wrong_penalty,
                Reason::QuizWrong,
                Some(&ref_id),
                now,
            )?;
            delta_currency = penalty.entry.map(|e| e.delta).unwrap_or(0);
        }

        let update = self
            .scorer
            .apply(tx, viewer_id, target_id, delta_affinity, now)?;
        let reveal = self
            .gate
            .reveal(tx, viewer_id, target_id, update.score.score, now)?;

        let answer = tx.insert_answer(NewAnswerRecord {
            session_id,
            question_id,
            asker_guess: guess,
            target_choice,
            correct,
            delta_affinity,
            delta_currency,
            created_at: now,
        })?;

        if let Err(e) = self.skills.record(tx, viewer_id, correct, now) {
            tracing::warn!(viewer_id, error = %e, "disclosure: skill update failed");
        }

        let stages_reached = update.new_stages;
        let mut crossed_tiers = stages_reached.clone();
        crossed_tiers.extend(reveal.crossed);

        tracing::debug!(
            session_id,
            question_id,
            correct,
            delta_affinity,
            delta_currency,
            score = update.score.score,
            "disclosure: answer resolved"
        );
        for tier in &stages_reached {
            tracing::info!(viewer_id, target_id, %tier, "disclosure: tier reached");
        }

        Ok(AnswerOutcome {
            viewer_id,
            target_id,
            correct,
            target_choice,
            delta_affinity,
            delta_currency,
            score: update.score.score,
            stages_reached,
            crossed_tiers,
            upgrades: reveal.upgrades,
            answer,
        })
    }

    /// Answers recorded for a session, oldest first.
    pub fn answers<S>(&self, tx: &S, session_id: SessionId) -> Result<Vec<AnswerRecord>>
    where
        S: Store + ?Sized,
    {
        if tx.session(session_id)?.is_none() {
            return Err(DisclosureError::SessionNotFound(session_id));
        }
        Ok(tx.answers(session_id)?)
    }
}
