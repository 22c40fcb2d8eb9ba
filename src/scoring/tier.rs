use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Leaderboard badge derived from a score.
///
/// Variants are declared lowest first so the derived `Ord` matches score order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    /// All tiers, best first
    pub const ALL: [Tier; 5] = [
        Tier::Diamond,
        Tier::Platinum,
        Tier::Gold,
        Tier::Silver,
        Tier::Bronze,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Diamond => "diamond",
            Tier::Platinum => "platinum",
            Tier::Gold => "gold",
            Tier::Silver => "silver",
            Tier::Bronze => "bronze",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match Tier::ALL.iter().find(|t| t.as_str().eq_ignore_ascii_case(s)) {
            Some(tier) => Ok(*tier),
            None => bail!(
                "Unknown tier '{}'. Expected one of: diamond, platinum, gold, silver, bronze",
                s
            ),
        }
    }
}

/// Lower bounds (inclusive) of each tier above bronze.
///
/// A score qualifies for the highest tier whose threshold it meets;
/// anything below `silver` is bronze.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TierThresholds {
    pub diamond: f64,
    pub platinum: f64,
    pub gold: f64,
    pub silver: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            diamond: 90.0,
            platinum: 75.0,
            gold: 60.0,
            silver: 45.0,
        }
    }
}

impl TierThresholds {
    /// Map a score to its tier. Total over every f64: NaN and anything
    /// below the silver threshold land in bronze.
    pub fn tier_for(&self, score: f64) -> Tier {
        if score >= self.diamond {
            Tier::Diamond
        } else if score >= self.platinum {
            Tier::Platinum
        } else if score >= self.gold {
            Tier::Gold
        } else if score >= self.silver {
            Tier::Silver
        } else {
            Tier::Bronze
        }
    }

    /// Inclusive lower bound of a tier (bronze has none)
    pub fn lower_bound(&self, tier: Tier) -> Option<f64> {
        match tier {
            Tier::Diamond => Some(self.diamond),
            Tier::Platinum => Some(self.platinum),
            Tier::Gold => Some(self.gold),
            Tier::Silver => Some(self.silver),
            Tier::Bronze => None,
        }
    }
}

/// Tier for a score using the default thresholds
pub fn determine_tier(score: f64) -> Tier {
    TierThresholds::default().tier_for(score)
}
