//! Photo visibility ratchet.
//!
//! Each (viewer, photo) pair has a stored tier, `Locked` when absent. A
//! score can only push that tier up: the candidate tier for the current
//! score is written only when it is strictly above the stored one, so a
//! later score drop never hides a variant that was already revealed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use veil_store::{PhotoRepo, VisibilityRepo};
use veil_types::{PhotoId, PhotoVariant, Tier, Timestamp, UserId, VisibilityState};

use crate::{Result, TierThresholds};

/// One photo moved up by [`VisibilityGate::reveal`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUpgrade {
    pub photo_id: PhotoId,
    pub from: Tier,
    pub to: Tier,
}

/// Every upgrade applied by one reveal pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealOutcome {
    pub upgrades: Vec<PhotoUpgrade>,
    /// Union of the tiers crossed by each upgrade.
    pub crossed: BTreeSet<Tier>,
}

/// An approved photo as `viewer_id` is allowed to see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryPhoto {
    pub photo_id: PhotoId,
    pub tier: Tier,
    /// Storage keys of the revealed variants. Variants the pipeline has not
    /// produced yet are omitted.
    pub variants: BTreeMap<PhotoVariant, String>,
}

#[derive(Clone, Debug, Default)]
pub struct VisibilityGate {
    thresholds: TierThresholds,
}

impl VisibilityGate {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    /// Stored tier of one photo for one viewer.
    pub fn tier<S>(&self, tx: &S, viewer_id: UserId, photo_id: PhotoId) -> Result<Tier>
    where
        S: VisibilityRepo + ?Sized,
    {
        Ok(tx
            .visibility(viewer_id, photo_id)?
            .map(|v| v.tier)
            .unwrap_or_default())
    }

    /// Raise every approved photo of `target_id` to the tier `score` earns,
    /// skipping photos already at or above it.
    pub fn reveal<S>(
        &self,
        tx: &mut S,
        viewer_id: UserId,
        target_id: UserId,
        score: u64,
        now: Timestamp,
    ) -> Result<RevealOutcome>
    where
        S: PhotoRepo + VisibilityRepo + ?Sized,
    {
        let candidate = self.thresholds.tier_for(score);
        let mut outcome = RevealOutcome::default();
        if candidate == Tier::Locked {
            return Ok(outcome);
        }

        for photo in tx.approved_photos(target_id)? {
            let current = self.tier(tx, viewer_id, photo.id)?;
            if candidate <= current {
                continue;
            }

            tx.put_visibility(&VisibilityState {
                viewer_id,
                photo_id: photo.id,
                tier: candidate,
                updated_at: now,
            })?;
            outcome.crossed.extend(Tier::crossed(current, candidate));
            outcome.upgrades.push(PhotoUpgrade {
                photo_id: photo.id,
                from: current,
                to: candidate,
            });
        }

        if !outcome.upgrades.is_empty() {
            tracing::info!(
                viewer_id,
                target_id,
                photos = outcome.upgrades.len(),
                tier = %candidate,
                "visibility: photos upgraded"
            );
        }
        Ok(outcome)
    }

    /// Approved photos of `target_id` with the variants `viewer_id` has
    /// unlocked, ascending by photo id. Locked photos are listed with no
    /// variants.
    pub fn gallery<S>(
        &self,
        tx: &S,
        viewer_id: UserId,
        target_id: UserId,
    ) -> Result<Vec<GalleryPhoto>>
    where
        S: PhotoRepo + VisibilityRepo + ?Sized,
    {
        tx.approved_photos(target_id)?
            .into_iter()
            .map(|photo| -> Result<GalleryPhoto> {
                let tier = self.tier(tx, viewer_id, photo.id)?;
                let variants = tier
                    .variants()
                    .iter()
                    .filter_map(|v| photo.variant_keys.get(v).map(|key| (*v, key.clone())))
                    .collect();
                Ok(GalleryPhoto {
                    photo_id: photo.id,
                    tier,
                    variants,
                })
            })
            .collect()
    }
}
