//! Affinity, visibility tiers, photos and profile field groups.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ParseError, PhotoId, Timestamp, UserId};

/// Visibility stage. Ordered: `Locked < T1 < T2 < T3`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    #[default]
    Locked,
    T1,
    T2,
    T3,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Locked, Tier::T1, Tier::T2, Tier::T3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Locked => "LOCKED",
            Tier::T1 => "T1",
            Tier::T2 => "T2",
            Tier::T3 => "T3",
        }
    }

    /// Photo variants revealed at this tier. Cumulative.
    pub fn variants(&self) -> &'static [PhotoVariant] {
        match self {
            Tier::Locked => &[],
            Tier::T1 => &[PhotoVariant::Thumbnail, PhotoVariant::HighBlur],
            Tier::T2 => &[
                PhotoVariant::Thumbnail,
                PhotoVariant::HighBlur,
                PhotoVariant::LowBlur,
            ],
            Tier::T3 => &[
                PhotoVariant::Thumbnail,
                PhotoVariant::HighBlur,
                PhotoVariant::LowBlur,
                PhotoVariant::Original,
            ],
        }
    }

    /// Tiers strictly above `from` and at most `to`, ascending.
    ///
    /// A jump from `Locked` to `T2` crosses both `T1` and `T2`.
    pub fn crossed(from: Tier, to: Tier) -> impl Iterator<Item = Tier> {
        Tier::ALL.into_iter().filter(move |t| *t > from && *t <= to)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseError::new("tier", s))
    }
}

/// Image variants produced by the external photo pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoVariant {
    Thumbnail,
    HighBlur,
    LowBlur,
    Original,
}

impl PhotoVariant {
    pub const ALL: [PhotoVariant; 4] = [
        PhotoVariant::Thumbnail,
        PhotoVariant::HighBlur,
        PhotoVariant::LowBlur,
        PhotoVariant::Original,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoVariant::Thumbnail => "thumbnail",
            PhotoVariant::HighBlur => "high_blur",
            PhotoVariant::LowBlur => "low_blur",
            PhotoVariant::Original => "original",
        }
    }
}

impl FromStr for PhotoVariant {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhotoVariant::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseError::new("photo variant", s))
    }
}

/// Moderation status set by the photo pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PhotoStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PhotoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoStatus::Pending => "PENDING",
            PhotoStatus::Approved => "APPROVED",
            PhotoStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for PhotoStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PhotoStatus::Pending),
            "APPROVED" => Ok(PhotoStatus::Approved),
            "REJECTED" => Ok(PhotoStatus::Rejected),
            other => Err(ParseError::new("photo status", other)),
        }
    }
}

/// A photo as known to this core: owner, moderation status and the
/// storage keys of whichever variants the pipeline has produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub owner_id: UserId,
    pub status: PhotoStatus,
    #[serde(default)]
    pub variant_keys: BTreeMap<PhotoVariant, String>,
}

/// Earned affinity of `viewer_id` towards `target_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityScore {
    pub viewer_id: UserId,
    pub target_id: UserId,
    /// Never negative.
    pub score: u64,
    /// Every tier label ever crossed for this pair.
    pub stages_unlocked: BTreeSet<Tier>,
    pub last_interaction_at: Timestamp,
}

impl AffinityScore {
    /// The implicit row for a pair that has never interacted.
    pub fn empty(viewer_id: UserId, target_id: UserId) -> Self {
        Self {
            viewer_id,
            target_id,
            score: 0,
            stages_unlocked: BTreeSet::new(),
            last_interaction_at: 0,
        }
    }
}

/// Stored tier of one photo for one viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityState {
    pub viewer_id: UserId,
    pub photo_id: PhotoId,
    pub tier: Tier,
    pub updated_at: Timestamp,
}

/// Groups of textual profile fields, each gated at a fixed tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileGroup {
    Basic,
    Economic,
    Family,
    Education,
    Lifestyle,
    Marriage,
    Health,
    Verification,
}

impl ProfileGroup {
    pub const ALL: [ProfileGroup; 8] = [
        ProfileGroup::Basic,
        ProfileGroup::Economic,
        ProfileGroup::Family,
        ProfileGroup::Education,
        ProfileGroup::Lifestyle,
        ProfileGroup::Marriage,
        ProfileGroup::Health,
        ProfileGroup::Verification,
    ];

    /// Minimum tier at which the group is readable.
    pub fn required_tier(&self) -> Tier {
        match self {
            ProfileGroup::Basic => Tier::T1,
            ProfileGroup::Economic
            | ProfileGroup::Family
            | ProfileGroup::Education
            | ProfileGroup::Lifestyle => Tier::T2,
            ProfileGroup::Marriage | ProfileGroup::Health | ProfileGroup::Verification => {
                Tier::T3
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileGroup::Basic => "basic",
            ProfileGroup::Economic => "economic",
            ProfileGroup::Family => "family",
            ProfileGroup::Education => "education",
            ProfileGroup::Lifestyle => "lifestyle",
            ProfileGroup::Marriage => "marriage",
            ProfileGroup::Health => "health",
            ProfileGroup::Verification => "verification",
        }
    }
}

impl FromStr for ProfileGroup {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ParseError::new("profile group", s))
    }
}

/// One textual profile field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileField {
    pub user_id: UserId,
    pub group: ProfileGroup,
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Locked < Tier::T1);
        assert!(Tier::T1 < Tier::T2);
        assert!(Tier::T2 < Tier::T3);
        assert_eq!(Tier::default(), Tier::Locked);
    }

    #[test]
    fn test_tier_variants_are_cumulative() {
        assert!(Tier::Locked.variants().is_empty());
        for pair in Tier::ALL.windows(2) {
            let lower = pair[0].variants();
            let higher = pair[1].variants();
            assert!(lower.iter().all(|v| higher.contains(v)));
            assert!(higher.len() > lower.len());
        }
        assert!(Tier::T3.variants().contains(&PhotoVariant::Original));
        assert!(!Tier::T2.variants().contains(&PhotoVariant::Original));
    }

    #[test]
    fn test_crossed_tiers() {
        let jump: Vec<Tier> = Tier::crossed(Tier::Locked, Tier::T2).collect();
        assert_eq!(jump, vec![Tier::T1, Tier::T2]);
        assert_eq!(Tier::crossed(Tier::T2, Tier::T2).count(), 0);
        assert_eq!(Tier::crossed(Tier::T3, Tier::T1).count(), 0);
    }

    #[test]
    fn test_tier_serde_labels() {
        assert_eq!(serde_json::to_string(&Tier::Locked).expect("ser"), "\"LOCKED\"");
        assert_eq!(serde_json::to_string(&Tier::T2).expect("ser"), "\"T2\"");
        assert_eq!("T3".parse::<Tier>().expect("parse"), Tier::T3);
    }

    #[test]
    fn test_profile_group_tiers() {
        assert_eq!(ProfileGroup::Basic.required_tier(), Tier::T1);
        assert_eq!(ProfileGroup::Lifestyle.required_tier(), Tier::T2);
        assert_eq!(ProfileGroup::Verification.required_tier(), Tier::T3);
    }
}
