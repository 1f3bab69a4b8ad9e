//! Fitted feature scaling transforms
//!
//! Artifacts are JSON exports of fitted scikit-learn scalers, e.g.
//! `{"kind": "standard", "mean": [...], "scale": [...]}` built from
//! `StandardScaler.mean_` / `StandardScaler.scale_`.

use crate::error::PredictError;
use serde::{Deserialize, Serialize};

/// Standardization: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    /// Column names seen during `fit`, when the scaler was fitted on a DataFrame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names_in: Option<Vec<String>>,
}

/// Min-max rescaling of each feature into `feature_range`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names_in: Option<Vec<String>>,
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// A fitted scaler loaded from the scaler artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaler {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

/// scikit-learn replaces a zero scale with 1 so constant features pass through
fn effective_scale(scale: f64) -> f64 {
    if scale == 0.0 {
        1.0
    } else {
        scale
    }
}

impl FeatureScaler {
    /// Number of features the scaler was fitted on
    pub fn n_features(&self) -> usize {
        match self {
            FeatureScaler::Standard(s) => s.mean.len(),
            FeatureScaler::MinMax(s) => s.data_min.len(),
        }
    }

    pub fn feature_names_in(&self) -> Option<&[String]> {
        match self {
            FeatureScaler::Standard(s) => s.feature_names_in.as_deref(),
            FeatureScaler::MinMax(s) => s.feature_names_in.as_deref(),
        }
    }

    /// Check the fitted parameters are internally consistent and finite
    pub fn validate(&self) -> Result<(), String> {
        let (a, b, what) = match self {
            FeatureScaler::Standard(s) => (&s.mean, &s.scale, "mean/scale"),
            FeatureScaler::MinMax(s) => (&s.data_min, &s.data_max, "data_min/data_max"),
        };
        if a.is_empty() {
            return Err("scaler has no fitted features".to_string());
        }
        if a.len() != b.len() {
            return Err(format!("{} lengths differ ({} vs {})", what, a.len(), b.len()));
        }
        if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
            return Err(format!("{} contain non-finite values", what));
        }
        if let FeatureScaler::Standard(s) = self {
            if s.scale.iter().any(|&v| v < 0.0) {
                return Err("scale contains negative values".to_string());
            }
        }
        if let FeatureScaler::MinMax(s) = self {
            let (lo, hi) = s.feature_range;
            if lo.partial_cmp(&hi) != Some(std::cmp::Ordering::Less) {
                return Err(format!("invalid feature_range ({}, {})", lo, hi));
            }
            if let Some(i) = s
                .data_min
                .iter()
                .zip(&s.data_max)
                .position(|(min, max)| max < min)
            {
                return Err(format!("data_max below data_min for feature {}", i));
            }
        }
        if let Some(names) = self.feature_names_in() {
            if names.len() != a.len() {
                return Err(format!(
                    "feature_names_in has {} names for {} fitted features",
                    names.len(),
                    a.len()
                ));
            }
        }
        Ok(())
    }

    /// Transform one row. Output has the same dimensionality as the input.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictError> {
        if row.len() != self.n_features() {
            return Err(PredictError::Transform(format!(
                "scaler fitted on {} features, got {}",
                self.n_features(),
                row.len()
            )));
        }
        if let Some(pos) = row.iter().position(|v| !v.is_finite()) {
            return Err(PredictError::Transform(format!(
                "non-finite input value {} at position {}",
                row[pos], pos
            )));
        }

        let scaled: Vec<f64> = match self {
            FeatureScaler::Standard(s) => row
                .iter()
                .zip(s.mean.iter().zip(&s.scale))
                .map(|(&x, (&mean, &scale))| (x - mean) / effective_scale(scale))
                .collect(),
            FeatureScaler::MinMax(s) => {
                let (lo, hi) = s.feature_range;
                row.iter()
                    .zip(s.data_min.iter().zip(&s.data_max))
                    .map(|(&x, (&min, &max))| {
                        let unit = (x - min) / effective_scale(max - min);
                        lo + unit * (hi - lo)
                    })
                    .collect()
            }
        };

        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> FeatureScaler {
        FeatureScaler::Standard(StandardScaler {
            mean: vec![10.0, 0.0, 5.0],
            scale: vec![2.0, 1.0, 0.0],
            feature_names_in: None,
        })
    }

    #[test]
    fn test_standard_transform() {
        let scaled = standard().transform(&[14.0, -3.0, 7.0]).unwrap();
        // zero scale falls back to 1
        assert_eq!(scaled, vec![2.0, -3.0, 2.0]);
    }

    #[test]
    fn test_min_max_transform() {
        let scaler = FeatureScaler::MinMax(MinMaxScaler {
            data_min: vec![0.0, 10.0],
            data_max: vec![10.0, 20.0],
            feature_range: (-1.0, 1.0),
            feature_names_in: None,
        });
        let scaled = scaler.transform(&[5.0, 20.0]).unwrap();
        assert_eq!(scaled, vec![0.0, 1.0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = standard().transform(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, PredictError::Transform(_)));
    }

    #[test]
    fn test_rejects_nan() {
        let err = standard().transform(&[1.0, f64::NAN, 2.0]).unwrap_err();
        assert!(matches!(err, PredictError::Transform(_)));
    }

    #[test]
    fn test_deserialize_tagged() {
        let json = r#"{"kind": "standard", "mean": [1.0, 2.0], "scale": [0.5, 4.0]}"#;
        let scaler: FeatureScaler = serde_json::from_str(json).unwrap();
        assert_eq!(scaler.n_features(), 2);
        assert!(scaler.validate().is_ok());

        let json = r#"{"kind": "min_max", "data_min": [0.0], "data_max": [3.0]}"#;
        let scaler: FeatureScaler = serde_json::from_str(json).unwrap();
        assert!(matches!(&scaler, FeatureScaler::MinMax(s) if s.feature_range == (0.0, 1.0)));
    }

    #[test]
    fn test_validate_length_mismatch() {
        let scaler = FeatureScaler::Standard(StandardScaler {
            mean: vec![1.0, 2.0],
            scale: vec![1.0],
            feature_names_in: None,
        });
        assert!(scaler.validate().is_err());
    }

    #[test]
    fn test_validate_inverted_min_max() {
        let scaler = FeatureScaler::MinMax(MinMaxScaler {
            data_min: vec![0.0, 50.0],
            data_max: vec![10.0, 20.0],
            feature_range: (0.0, 1.0),
            feature_names_in: None,
        });
        let err = scaler.validate().unwrap_err();
        assert!(err.contains("feature 1"));

        // a constant column is still valid
        let scaler = FeatureScaler::MinMax(MinMaxScaler {
            data_min: vec![3.0],
            data_max: vec![3.0],
            feature_range: (0.0, 1.0),
            feature_names_in: None,
        });
        assert!(scaler.validate().is_ok());
    }
}
