//! Feature derivation for credit default model inference.
//!
//! Turns a [`CustomerProfile`] into the engineered features used when the
//! model was trained, then lays them out in the column order recorded in the
//! model's feature list. Columns are matched by name, never by position.

use crate::error::PredictError;
use crate::types::profile::CustomerProfile;
use std::collections::HashSet;

/// Number of features derived from a profile.
pub const FEATURE_COUNT: usize = 9;

/// Canonical column names of the derived features.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "SEX",
    "EDUCATION",
    "MARRIAGE",
    "AGE",
    "LOG_LIMIT_BAL",
    "LOG_BILL_AMT_AVG",
    "LOG_PAY_AMT_AVG",
    "LATE_PAYMENT_COUNT",
    "MAX_DELAY",
];

/// Model-ready numeric record derived from one profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub sex: f64,
    pub education: f64,
    pub marriage: f64,
    pub age: f64,
    /// ln(1 + credit limit)
    pub log_credit_limit: f64,
    /// ln(1 + average bill amount)
    pub log_avg_bill_amount: f64,
    /// ln(1 + average payment amount)
    pub log_avg_payment_amount: f64,
    pub late_payment_count: f64,
    pub max_delay_months: f64,
}

impl FeatureVector {
    /// Look up a feature by column name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name.trim().to_ascii_uppercase().as_str() {
            "SEX" => self.sex,
            "EDUCATION" => self.education,
            "MARRIAGE" => self.marriage,
            "AGE" => self.age,
            "LOG_LIMIT_BAL" => self.log_credit_limit,
            "LOG_BILL_AMT_AVG" => self.log_avg_bill_amount,
            "LOG_PAY_AMT_AVG" => self.log_avg_payment_amount,
            "LATE_PAYMENT_COUNT" => self.late_payment_count,
            "MAX_DELAY" => self.max_delay_months,
            _ => return None,
        };
        Some(value)
    }

    /// Values in canonical [`FEATURE_NAMES`] order.
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.sex,
            self.education,
            self.marriage,
            self.age,
            self.log_credit_limit,
            self.log_avg_bill_amount,
            self.log_avg_payment_amount,
            self.late_payment_count,
            self.max_delay_months,
        ]
    }

    /// Assemble the row in exactly the order of `feature_names`.
    ///
    /// Every derived feature must be named exactly once; anything else means
    /// the artifacts were produced by a different version of this pipeline.
    pub fn reindex<S: AsRef<str>>(&self, feature_names: &[S]) -> Result<Vec<f64>, PredictError> {
        if feature_names.len() != FEATURE_COUNT {
            return Err(PredictError::FeatureMismatch(format!(
                "model expects {} features, pipeline derives {}",
                feature_names.len(),
                FEATURE_COUNT
            )));
        }

        let mut seen = HashSet::with_capacity(FEATURE_COUNT);
        let mut row = Vec::with_capacity(FEATURE_COUNT);

        for name in feature_names {
            let name = name.as_ref();
            if !seen.insert(name.trim().to_ascii_uppercase()) {
                return Err(PredictError::FeatureMismatch(format!(
                    "feature '{}' listed more than once",
                    name
                )));
            }
            let value = self.get(name).ok_or_else(|| {
                PredictError::FeatureMismatch(format!("unknown feature '{}'", name))
            })?;
            row.push(value);
        }

        Ok(row)
    }
}

/// Feature extractor that transforms profiles into model input features.
///
/// Matches the preprocessing done in the Python training pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Derive the feature vector from a profile.
    ///
    /// Monetary amounts are log1p-compressed; everything else passes through.
    pub fn extract(&self, profile: &CustomerProfile) -> Result<FeatureVector, PredictError> {
        profile.validate()?;

        Ok(FeatureVector {
            sex: f64::from(profile.sex.code()),
            education: f64::from(profile.education.code()),
            marriage: f64::from(profile.marriage.code()),
            age: f64::from(profile.age),
            log_credit_limit: profile.credit_limit.ln_1p(),
            log_avg_bill_amount: profile.avg_bill_amount.ln_1p(),
            log_avg_payment_amount: profile.avg_payment_amount.ln_1p(),
            late_payment_count: f64::from(profile.late_payment_count),
            max_delay_months: f64::from(profile.max_delay_months),
        })
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names in canonical order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        FEATURE_NAMES.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::{Education, MaritalStatus, Sex};

    fn scenario_profile() -> CustomerProfile {
        CustomerProfile {
            sex: Sex::Male,
            education: Education::University,
            marriage: MaritalStatus::Single,
            age: 35,
            credit_limit: 200_000.0,
            avg_bill_amount: 50_000.0,
            avg_payment_amount: 40_000.0,
            late_payment_count: 1,
            max_delay_months: 1,
        }
    }

    #[test]
    fn test_feature_extraction() {
        let extractor = FeatureExtractor::new();
        let features = extractor.extract(&scenario_profile()).unwrap();

        assert_eq!(features.sex, 1.0);
        assert_eq!(features.education, 2.0);
        assert_eq!(features.marriage, 2.0);
        assert_eq!(features.age, 35.0);
        assert_eq!(features.log_credit_limit, 200_001.0_f64.ln());
        assert!((features.log_credit_limit - 12.206).abs() < 1e-3);
        assert!((features.log_avg_bill_amount - 10.820).abs() < 1e-3);
        assert!((features.log_avg_payment_amount - 10.597).abs() < 1e-3);
        assert_eq!(features.late_payment_count, 1.0);
        assert_eq!(features.max_delay_months, 1.0);
    }

    #[test]
    fn test_log_transform_monotonic() {
        let extractor = FeatureExtractor::new();
        let limits = [0.0, 1.0, 10.0, 5_000.0, 200_000.0, 1_000_000.0];

        let logs: Vec<f64> = limits
            .iter()
            .map(|&credit_limit| {
                let profile = CustomerProfile {
                    credit_limit,
                    ..CustomerProfile::default()
                };
                extractor.extract(&profile).unwrap().log_credit_limit
            })
            .collect();

        assert_eq!(logs[0], 0.0);
        assert!(logs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_extraction_rejects_invalid_profile() {
        let profile = CustomerProfile {
            avg_payment_amount: -10.0,
            ..CustomerProfile::default()
        };
        let err = FeatureExtractor::new().extract(&profile).unwrap_err();
        assert!(matches!(err, PredictError::InvalidProfile(_)));
    }

    #[test]
    fn test_reindex_follows_requested_order() {
        let features = FeatureExtractor::new().extract(&scenario_profile()).unwrap();

        let canonical = features.reindex(&FEATURE_NAMES).unwrap();
        assert_eq!(canonical, features.values().to_vec());

        let mut reversed = FEATURE_NAMES.to_vec();
        reversed.reverse();
        let row = features.reindex(&reversed).unwrap();
        assert_eq!(row[0], features.max_delay_months);
        assert_eq!(row[8], features.sex);
    }

    #[test]
    fn test_reindex_is_case_insensitive() {
        let features = FeatureExtractor::new().extract(&scenario_profile()).unwrap();
        let lower: Vec<String> = FEATURE_NAMES.iter().map(|n| n.to_lowercase()).collect();
        assert_eq!(features.reindex(&lower).unwrap(), features.values().to_vec());
    }

    #[test]
    fn test_reindex_mismatches() {
        let features = FeatureExtractor::new().extract(&scenario_profile()).unwrap();

        let short = &FEATURE_NAMES[..8];
        assert!(matches!(
            features.reindex(short),
            Err(PredictError::FeatureMismatch(_))
        ));

        let mut unknown = FEATURE_NAMES.to_vec();
        unknown[4] = "LIMIT_BAL";
        assert!(matches!(
            features.reindex(&unknown),
            Err(PredictError::FeatureMismatch(_))
        ));

        let mut duplicated = FEATURE_NAMES.to_vec();
        duplicated[1] = "SEX";
        assert!(matches!(
            features.reindex(&duplicated),
            Err(PredictError::FeatureMismatch(_))
        ));
    }

    #[test]
    fn test_feature_count() {
        let extractor = FeatureExtractor::new();
        assert_eq!(extractor.feature_count(), 9);
        assert_eq!(extractor.feature_names().len(), 9);
    }
}
