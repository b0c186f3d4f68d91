//! Complexity analysis (C3) and the persistent regime learner (C4).

mod analyzer;
mod learner;

pub use analyzer::ComplexityAnalyzer;
pub use learner::ComplexityLearner;

use serde::{Deserialize, Serialize};

/// The three coarse complexity regimes, totally ordered LOW < MEDIUM < HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityRegime {
    Low,
    Medium,
    High,
}

impl ComplexityRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityRegime::Low => "low",
            ComplexityRegime::Medium => "medium",
            ComplexityRegime::High => "high",
        }
    }

    /// Canonical score used when a prior learner decision is consulted (§4.2 step 2).
    pub fn canonical_score(&self) -> f64 {
        match self {
            ComplexityRegime::Low => 15.0,
            ComplexityRegime::Medium => 50.0,
            ComplexityRegime::High => 85.0,
        }
    }
}

impl std::fmt::Display for ComplexityRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ComplexityRegime {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(ComplexityRegime::Low),
            "medium" => Ok(ComplexityRegime::Medium),
            "high" => Ok(ComplexityRegime::High),
            _ => Err(()),
        }
    }
}
