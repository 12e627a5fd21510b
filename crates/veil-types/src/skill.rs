//! Per-user guessing accuracy.

use serde::{Deserialize, Serialize};

use crate::{Timestamp, UserId};

/// Derived accuracy aggregate. Non-authoritative.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillStat {
    pub user_id: UserId,
    pub correct_count: u64,
    pub total_attempts: u64,
    /// `correct_count / total_attempts`, 0.0 with no attempts.
    pub accuracy: f64,
    pub updated_at: Timestamp,
}

impl SkillStat {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }
}
