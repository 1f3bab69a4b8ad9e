//! Prediction result and risk tier classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability at which a customer becomes Medium risk (inclusive)
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.30;
/// Probability at which a customer becomes High risk (inclusive)
pub const HIGH_RISK_THRESHOLD: f64 = 0.60;

/// Risk tier classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Determine risk tier from a default probability.
    ///
    /// Fixed thresholds: `[0, 0.30)` Low, `[0.30, 0.60)` Medium, `[0.60, 1]` High.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_RISK_THRESHOLD {
            RiskTier::High
        } else if probability >= MEDIUM_RISK_THRESHOLD {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            RiskTier::Low => "✅",
            RiskTier::Medium => "⚠️",
            RiskTier::High => "🛑",
        }
    }

    /// One color per tier
    pub fn color(self) -> TierColor {
        match self {
            RiskTier::Low => TierColor::Green,
            RiskTier::Medium => TierColor::Orange,
            RiskTier::High => TierColor::Red,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display color hint for a risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierColor {
    Green,
    Orange,
    Red,
}

impl TierColor {
    /// ANSI SGR foreground code
    pub fn ansi_code(self) -> &'static str {
        match self {
            TierColor::Green => "32",
            TierColor::Orange => "33",
            TierColor::Red => "31",
        }
    }
}

/// Outcome of one prediction request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Probability of the default class (0.0 - 1.0)
    pub default_probability: f64,
    /// Tier derived from `default_probability`
    pub risk_tier: RiskTier,
    /// `avg_payment_amount / (avg_bill_amount + 1)`, computed outside the model
    pub payment_to_bill_ratio: f64,
}
