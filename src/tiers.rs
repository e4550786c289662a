// src/tiers.rs
//
// Three-way color classification of a price or hours value against user
// thresholds. Presentation-only: a wrong tier never affects detection or
// conversion.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which value the thresholds apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierBasis {
    Money,
    Hours,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierColor {
    Green,
    Yellow,
    Red,
}

impl TierColor {
    pub fn as_str(self) -> &'static str {
        match self {
            TierColor::Green => "green",
            TierColor::Yellow => "yellow",
            TierColor::Red => "red",
        }
    }
}

/// User tier thresholds. Well-formed when `0 ≤ green ≤ yellow ≤ red` and all
/// three are finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSettings {
    #[serde(rename = "type")]
    pub basis: TierBasis,
    pub green: f64,
    pub yellow: f64,
    pub red: f64,
}

impl Default for TierSettings {
    fn default() -> Self {
        Self {
            basis: TierBasis::Money,
            green: 0.0,
            yellow: 50.0,
            red: 100.0,
        }
    }
}

impl TierSettings {
    pub fn is_well_formed(&self) -> bool {
        self.green.is_finite()
            && self.yellow.is_finite()
            && self.red.is_finite()
            && self.green >= 0.0
            && self.green <= self.yellow
            && self.yellow <= self.red
    }
}

/// Classify a value against the thresholds.
///
/// Zero is green only when the green threshold is itself zero; any other zero
/// lands in yellow. A positive value equal to the green threshold also lands
/// in yellow. Existing consumers depend on both edges, so they stay.
/// Malformed input or thresholds classify as yellow, the safe default.
pub fn classify(value: f64, settings: &TierSettings) -> TierColor {
    if !value.is_finite() || value < 0.0 || !settings.is_well_formed() {
        debug!(value, "tier classification fell back to yellow");
        return TierColor::Yellow;
    }
    if value == 0.0 {
        return if settings.green == 0.0 {
            TierColor::Green
        } else {
            TierColor::Yellow
        };
    }
    if value < settings.green {
        return TierColor::Green;
    }
    if value <= settings.yellow {
        return TierColor::Yellow;
    }
    TierColor::Red
}
