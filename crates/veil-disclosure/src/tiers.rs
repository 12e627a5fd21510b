//! Score thresholds for the visibility tiers.

use serde::{Deserialize, Serialize};
use veil_types::{Tier, DEFAULT_TIER_THRESHOLDS};

use crate::{DisclosureError, Result};

/// Global minimum scores for T1, T2 and T3. Strictly increasing, non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds", into = "RawThresholds")]
pub struct TierThresholds {
    t1: u64,
    t2: u64,
    t3: u64,
}

#[derive(Serialize, Deserialize)]
struct RawThresholds {
    t1: u64,
    t2: u64,
    t3: u64,
}

impl TryFrom<RawThresholds> for TierThresholds {
    type Error = DisclosureError;

    fn try_from(raw: RawThresholds) -> Result<Self> {
        TierThresholds::new(raw.t1, raw.t2, raw.t3)
    }
}

impl From<TierThresholds> for RawThresholds {
    fn from(t: TierThresholds) -> Self {
        RawThresholds {
            t1: t.t1,
            t2: t.t2,
            t3: t.t3,
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        let [t1, t2, t3] = DEFAULT_TIER_THRESHOLDS;
        Self { t1, t2, t3 }
    }
}

impl TierThresholds {
    pub fn new(t1: u64, t2: u64, t3: u64) -> Result<Self> {
        if t1 == 0 {
            return Err(DisclosureError::Validation(
                "tier thresholds must be positive".into(),
            ));
        }
        if !(t1 < t2 && t2 < t3) {
            return Err(DisclosureError::Validation(format!(
                "tier thresholds must be strictly increasing, got {t1}/{t2}/{t3}"
            )));
        }
        Ok(Self { t1, t2, t3 })
    }

    /// Minimum score for `tier`. `Locked` needs nothing.
    pub fn threshold(&self, tier: Tier) -> u64 {
        match tier {
            Tier::Locked => 0,
            Tier::T1 => self.t1,
            Tier::T2 => self.t2,
            Tier::T3 => self.t3,
        }
    }

    /// Highest tier whose threshold `score` meets.
    pub fn tier_for(&self, score: u64) -> Tier {
        Tier::ALL
            .into_iter()
            .rev()
            .find(|tier| score >= self.threshold(*tier))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let t = TierThresholds::default();
        assert_eq!(t.tier_for(0), Tier::Locked);
        assert_eq!(t.tier_for(19), Tier::Locked);
        assert_eq!(t.tier_for(20), Tier::T1);
        assert_eq!(t.tier_for(39), Tier::T1);
        assert_eq!(t.tier_for(40), Tier::T2);
        assert_eq!(t.tier_for(60), Tier::T3);
        assert_eq!(t.tier_for(u64::MAX), Tier::T3);
    }

    #[test]
    fn test_threshold_lookup() {
        let t = TierThresholds::new(5, 10, 15).expect("valid");
        assert_eq!(t.threshold(Tier::Locked), 0);
        assert_eq!(t.threshold(Tier::T2), 10);
        for tier in Tier::ALL {
            assert_eq!(t.tier_for(t.threshold(tier)), tier);
        }
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        assert!(TierThresholds::new(0, 10, 20).is_err());
        assert!(TierThresholds::new(10, 10, 20).is_err());
        assert!(TierThresholds::new(30, 20, 10).is_err());
    }
}
