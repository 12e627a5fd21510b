//! Quiz sessions, target preferences and answer records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AnswerId, ParseError, QuestionId, SessionId, Timestamp, UserId};

/// One side of a binary "this or that" question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Choice {
    Left,
    Right,
}

impl Choice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::Left => "LEFT",
            Choice::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LEFT" => Ok(Choice::Left),
            "RIGHT" => Ok(Choice::Right),
            other => Err(ParseError::new("choice", other)),
        }
    }
}

/// How a quiz session is played.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    /// Free-paced question by question.
    #[default]
    Standard,
    /// Short timed burst of questions.
    Rapid,
}

impl QuizMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizMode::Standard => "standard",
            QuizMode::Rapid => "rapid",
        }
    }
}

impl FromStr for QuizMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(QuizMode::Standard),
            "rapid" => Ok(QuizMode::Rapid),
            other => Err(ParseError::new("quiz mode", other)),
        }
    }
}

/// A paid interaction between an asker and a target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    pub id: SessionId,
    pub asker_id: UserId,
    pub target_id: UserId,
    pub mode: QuizMode,
    /// Snapshot of the entry cost charged at creation.
    pub entry_cost: u64,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

impl QuizSession {
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// A session before the store assigns its id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewQuizSession {
    pub asker_id: UserId,
    pub target_id: UserId,
    pub mode: QuizMode,
    pub entry_cost: u64,
    pub started_at: Timestamp,
}

impl NewQuizSession {
    pub fn into_session(self, id: SessionId) -> QuizSession {
        QuizSession {
            id,
            asker_id: self.asker_id,
            target_id: self.target_id,
            mode: self.mode,
            entry_cost: self.entry_cost,
            started_at: self.started_at,
            ended_at: None,
        }
    }
}

/// A target's pre-declared answer to one question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPreference {
    pub target_id: UserId,
    pub question_id: QuestionId,
    pub choice: Choice,
}

/// Immutable audit row for one submitted answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: AnswerId,
    pub session_id: SessionId,
    pub question_id: QuestionId,
    pub asker_guess: Choice,
    pub target_choice: Choice,
    pub correct: bool,
    pub delta_affinity: i64,
    /// Currency actually moved by this answer (zero or negative).
    pub delta_currency: i64,
    pub created_at: Timestamp,
}

/// An answer record before the store assigns its id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAnswerRecord {
    pub session_id: SessionId,
    pub question_id: QuestionId,
    pub asker_guess: Choice,
    pub target_choice: Choice,
    pub correct: bool,
    pub delta_affinity: i64,
    pub delta_currency: i64,
    pub created_at: Timestamp,
}

impl NewAnswerRecord {
    pub fn into_record(self, id: AnswerId) -> AnswerRecord {
        AnswerRecord {
            id,
            session_id: self.session_id,
            question_id: self.question_id,
            asker_guess: self.asker_guess,
            target_choice: self.target_choice,
            correct: self.correct,
            delta_affinity: self.delta_affinity,
            delta_currency: self.delta_currency,
            created_at: self.created_at,
        }
    }
}
