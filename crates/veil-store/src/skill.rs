//! Skill storage trait.

use veil_types::{SkillStat, UserId};

use crate::Result;

pub trait SkillRepo {
    fn skill(&self, user_id: UserId) -> Result<Option<SkillStat>>;

    fn put_skill(&mut self, stat: &SkillStat) -> Result<()>;

    /// Best `limit` users by accuracy, ties broken by more attempts then
    /// lower user id.
    fn top_skills(&self, limit: usize) -> Result<Vec<SkillStat>>;
}
