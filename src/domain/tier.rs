//! Performance tiers derived from confidence.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest confidence that counts as [`Tier::Godmode`].
pub const GODMODE_THRESHOLD: f64 = 0.95;

/// Lowest confidence that counts as [`Tier::Elite`].
pub const ELITE_THRESHOLD: f64 = 0.80;

/// Discrete performance class of an agent.
///
/// Ordered from weakest to strongest so `Tier::Godmode > Tier::Learning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Confidence below 0.80.
    Learning,
    /// Confidence in `[0.80, 0.95)`.
    Elite,
    /// Confidence of 0.95 or more.
    Godmode,
}

impl Tier {
    /// All tiers, weakest first.
    pub const ALL: [Tier; 3] = [Tier::Learning, Tier::Elite, Tier::Godmode];

    /// Short label used in tables and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Elite => "elite",
            Self::Godmode => "godmode",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a confidence value onto its tier.
///
/// Stateless; callers re-apply it whenever confidence changes.
#[must_use]
pub fn classify(confidence: f64) -> Tier {
    if confidence >= GODMODE_THRESHOLD {
        Tier::Godmode
    } else if confidence >= ELITE_THRESHOLD {
        Tier::Elite
    } else {
        Tier::Learning
    }
}
