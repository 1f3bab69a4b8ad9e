//! Assessment report handed to the presentation layer.
//!
//! Everything here is derived from a [`CustomerProfile`] and its
//! [`PredictionResult`]; nothing feeds back into the model.

use crate::types::prediction::{PredictionResult, RiskTier, TierColor};
use crate::types::profile::{CustomerProfile, MAX_DELAY_MONTHS, MAX_LATE_PAYMENTS};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;

/// One labelled bar of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBar {
    pub label: &'static str,
    pub value: f64,
}

/// Tier styling shown next to the probability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierBadge {
    pub tier: RiskTier,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: TierColor,
}

impl From<RiskTier> for TierBadge {
    fn from(tier: RiskTier) -> Self {
        Self {
            tier,
            label: tier.label(),
            icon: tier.icon(),
            color: tier.color(),
        }
    }
}

/// Rendered risk assessment for one customer
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    /// Unique report identifier
    pub report_id: String,
    /// Report generation timestamp
    pub generated_at: DateTime<Utc>,
    pub profile: CustomerProfile,
    pub prediction: PredictionResult,
    /// e.g. "43.30%"
    pub probability_display: String,
    /// e.g. "0.80"
    pub ratio_display: String,
    pub badge: TierBadge,
    /// Average bill vs. average payment
    pub payment_history: Vec<ChartBar>,
    /// Late frequency, delay severity and probability, each in [0, 1]
    pub risk_factors: Vec<ChartBar>,
    pub summary: String,
}

impl AssessmentReport {
    pub fn new(profile: &CustomerProfile, prediction: &PredictionResult) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            profile: profile.clone(),
            prediction: *prediction,
            probability_display: format_percent(prediction.default_probability),
            ratio_display: format!("{:.2}", prediction.payment_to_bill_ratio),
            badge: TierBadge::from(prediction.risk_tier),
            payment_history: payment_history(profile),
            risk_factors: risk_factors(profile, prediction),
            summary: summary(profile),
        }
    }

    /// Plain-text dashboard view. `color` enables ANSI escapes for the tier badge.
    pub fn render_text(&self, color: bool) -> String {
        let mut out = String::new();
        let badge = format!("{} {}", self.badge.icon, self.badge.label);
        let badge = if color {
            format!("\x1b[1;{}m{}\x1b[0m", self.badge.color.ansi_code(), badge)
        } else {
            badge
        };

        let _ = writeln!(out, "Credit Default Risk Predictor");
        let _ = writeln!(out, "═════════════════════════════");
        let _ = writeln!(out, "Default Probability:   {}", self.probability_display);
        let _ = writeln!(out, "Payment-to-Bill Ratio: {}", self.ratio_display);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", badge);
        let _ = writeln!(out);

        let _ = writeln!(out, "Payment vs. Bill History");
        let peak = self
            .payment_history
            .iter()
            .map(|b| b.value)
            .fold(0.0_f64, f64::max);
        for bar in &self.payment_history {
            let fraction = if peak > 0.0 { bar.value / peak } else { 0.0 };
            let _ = writeln!(
                out,
                "  {:<16} {:>12} {}",
                bar.label,
                format_thousands(bar.value),
                render_bar(fraction)
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Risk Factors");
        for bar in &self.risk_factors {
            let _ = writeln!(
                out,
                "  {:<16} {:>12.2} {}",
                bar.label,
                bar.value,
                render_bar(bar.value)
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.summary);
        out
    }
}

/// Probability as a percentage with two decimals
pub fn format_percent(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Whole amount with thousands separators, e.g. 200000 -> "200,000"
pub fn format_thousands(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

fn render_bar(fraction: f64) -> String {
    let width = (fraction.clamp(0.0, 1.0) * 20.0).round() as usize;
    "█".repeat(width)
}

fn payment_history(profile: &CustomerProfile) -> Vec<ChartBar> {
    vec![
        ChartBar {
            label: "Bill Amount",
            value: profile.avg_bill_amount,
        },
        ChartBar {
            label: "Payment Amount",
            value: profile.avg_payment_amount,
        },
    ]
}

fn risk_factors(profile: &CustomerProfile, prediction: &PredictionResult) -> Vec<ChartBar> {
    vec![
        ChartBar {
            label: "Late Frequency",
            value: f64::from(profile.late_payment_count) / f64::from(MAX_LATE_PAYMENTS),
        },
        ChartBar {
            label: "Delay Severity",
            value: f64::from(profile.max_delay_months) / f64::from(MAX_DELAY_MONTHS),
        },
        ChartBar {
            label: "Probability",
            value: prediction.default_probability,
        },
    ]
}

fn summary(profile: &CustomerProfile) -> String {
    format!(
        "Customer Profile:\n\
         - Age: {} | Status: {} | Education: {}\n\
         - Credit Limit: ${}\n\
         \n\
         Behavioral Flags:\n\
         - Has delayed payment {} months maximum.\n\
         - Late payments occurred {} times in the last 6 months.",
        profile.age,
        profile.marriage,
        profile.education,
        format_thousands(profile.credit_limit),
        profile.max_delay_months,
        profile.late_payment_count,
    )
}

/// Landing text shown before any assessment has been requested
pub fn welcome_text() -> &'static str {
    "Welcome to Credit Risk AI\n\
     This tool uses Machine Learning to assess customer default probability.\n\
     \n\
     - Reliable: trained on thousands of historical credit records.\n\
     - Instant: real-time risk predictions and probability scores.\n\
     - Visual: risk factors and payment history shown alongside the score.\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(p: f64, profile: &CustomerProfile) -> PredictionResult {
        PredictionResult {
            default_probability: p,
            risk_tier: RiskTier::from_probability(p),
            payment_to_bill_ratio: profile.payment_to_bill_ratio(),
        }
    }

    #[test]
    fn test_report_displays() {
        let profile = CustomerProfile::default();
        let report = AssessmentReport::new(&profile, &prediction(0.433, &profile));

        assert_eq!(report.probability_display, "43.30%");
        assert_eq!(report.ratio_display, "0.80");
        assert_eq!(report.badge.tier, RiskTier::Medium);
        assert_eq!(report.badge.color, TierColor::Orange);
    }

    #[test]
    fn test_risk_factor_normalization() {
        let profile = CustomerProfile {
            late_payment_count: 3,
            max_delay_months: 5,
            ..CustomerProfile::default()
        };
        let report = AssessmentReport::new(&profile, &prediction(0.7, &profile));

        let values: Vec<f64> = report.risk_factors.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![0.5, 0.5, 0.7]);
        assert_eq!(report.payment_history[0].value, 50_000.0);
        assert_eq!(report.payment_history[1].value, 40_000.0);
    }

    #[test]
    fn test_summary_and_text_render() {
        let profile = CustomerProfile::default();
        let report = AssessmentReport::new(&profile, &prediction(0.1, &profile));

        assert!(report.summary.contains("Credit Limit: $200,000"));
        assert!(report.summary.contains("Education: Graduate School"));

        let text = report.render_text(false);
        assert!(text.contains("Low Risk"));
        assert!(text.contains("10.00%"));
        assert!(!text.contains('\x1b'));
        assert!(report.render_text(true).contains("\x1b[1;32m"));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1_000.0), "1,000");
        assert_eq!(format_thousands(1_234_567.0), "1,234,567");
    }

    #[test]
    fn test_report_json_shape() {
        let profile = CustomerProfile::default();
        let report = AssessmentReport::new(&profile, &prediction(0.65, &profile));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["badge"]["color"], "red");
        assert_eq!(json["prediction"]["risk_tier"], "high");
        assert_eq!(json["profile"]["education"], "Graduate School");
        assert!(uuid::Uuid::parse_str(json["report_id"].as_str().unwrap()).is_ok());
    }
}
