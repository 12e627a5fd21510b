//! Textual profile disclosure.
//!
//! Field groups are gated by the same affinity score as photos, but the
//! readable set is recomputed from the live score on every read and is not
//! persisted. A score drop therefore hides groups again, unlike photo tiers.

use serde::{Deserialize, Serialize};
use veil_store::{AffinityRepo, ProfileRepo};
use veil_types::{ProfileField, ProfileGroup, Tier, UserId};

use crate::{AffinityScorer, Result};

/// What `viewer_id` may currently read of `target_id`'s profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    pub viewer_id: UserId,
    pub target_id: UserId,
    pub score: u64,
    /// Tier the live score earns, not a stored photo tier.
    pub tier: Tier,
    pub groups: Vec<ProfileGroup>,
    pub fields: Vec<ProfileField>,
}

/// Groups readable at `tier`, in declaration order.
pub fn visible_groups(tier: Tier) -> Vec<ProfileGroup> {
    ProfileGroup::ALL
        .into_iter()
        .filter(|g| g.required_tier() <= tier)
        .collect()
}

impl AffinityScorer {
    /// Fields of `target_id` the current score lets `viewer_id` read.
    pub fn disclose_profile<S>(
        &self,
        tx: &S,
        viewer_id: UserId,
        target_id: UserId,
    ) -> Result<ProfileView>
    where
        S: AffinityRepo + ProfileRepo + ?Sized,
    {
        let score = self.score(tx, viewer_id, target_id)?.score;
        let tier = self.thresholds().tier_for(score);
        let groups = visible_groups(tier);
        let fields = tx
            .profile_fields(target_id)?
            .into_iter()
            .filter(|f| groups.contains(&f.group))
            .collect();

        Ok(ProfileView {
            viewer_id,
            target_id,
            score,
            tier,
            groups,
            fields,
        })
    }
}
