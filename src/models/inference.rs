//! Credit default inference pipeline

use crate::config::AppConfig;
use crate::error::{AssetLoadError, PredictError};
use crate::feature_extractor::FeatureExtractor;
use crate::models::classifier::DEFAULT_CLASS;
use crate::models::loader::{AssetLoader, ModelAssets};
use crate::types::prediction::{PredictionResult, RiskTier};
use crate::types::profile::CustomerProfile;
use std::sync::Arc;
use tracing::{debug, info};

/// Run one prediction: derive features, reorder them to the model's column
/// list, scale, score and tier.
///
/// Pure and stateless; any failure aborts the request with no partial result.
pub fn predict(
    profile: &CustomerProfile,
    assets: &ModelAssets,
) -> Result<PredictionResult, PredictError> {
    let features = FeatureExtractor::new().extract(profile)?;
    let row = features.reindex(assets.feature_names())?;
    let scaled = assets.scaler().transform(&row)?;

    let classifier = assets.classifier();
    let probabilities = classifier.predict_proba(&scaled)?;

    // Probability mass of the default class, not its complement
    let default_index = classifier
        .classes()
        .iter()
        .position(|&c| c == DEFAULT_CLASS)
        .ok_or_else(|| {
            PredictError::Inference(format!(
                "classifier has no class {} among {:?}",
                DEFAULT_CLASS,
                classifier.classes()
            ))
        })?;
    let default_probability = probabilities.get(default_index).copied().ok_or_else(|| {
        PredictError::Inference(format!(
            "classifier returned {} probabilities for {} classes",
            probabilities.len(),
            classifier.classes().len()
        ))
    })?;

    if !(0.0..=1.0).contains(&default_probability) {
        return Err(PredictError::Inference(format!(
            "probability {} outside [0, 1]",
            default_probability
        )));
    }

    let risk_tier = RiskTier::from_probability(default_probability);
    let payment_to_bill_ratio = profile.payment_to_bill_ratio();

    debug!(
        model = %classifier.name(),
        default_probability = default_probability,
        risk_tier = ?risk_tier,
        payment_to_bill_ratio = payment_to_bill_ratio,
        "Prediction complete"
    );

    Ok(PredictionResult {
        default_probability,
        risk_tier,
        payment_to_bill_ratio,
    })
}

/// Prediction context holding the loaded assets.
///
/// Built once at startup and passed by reference to whatever renders results.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    assets: Arc<ModelAssets>,
}

impl InferenceEngine {
    /// Create an inference engine from configuration
    pub fn new(config: &AppConfig) -> Result<Self, AssetLoadError> {
        Self::from_loader(&AssetLoader::from_config(&config.models))
    }

    /// Create an inference engine from a loader's (memoized) assets
    pub fn from_loader(loader: &AssetLoader) -> Result<Self, AssetLoadError> {
        let assets = loader.load()?;
        info!(
            model = %assets.classifier().name(),
            features = ?assets.feature_names(),
            "Inference engine initialized"
        );
        Ok(Self { assets })
    }

    pub fn with_assets(assets: Arc<ModelAssets>) -> Self {
        Self { assets }
    }

    pub fn assets(&self) -> &ModelAssets {
        &self.assets
    }

    pub fn model_name(&self) -> &str {
        self.assets.classifier().name()
    }

    /// Score a single customer profile
    pub fn predict(&self, profile: &CustomerProfile) -> Result<PredictionResult, PredictError> {
        predict(profile, &self.assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::FEATURE_NAMES;
    use crate::models::classifier::{Classifier, LogisticRegression};
    use crate::models::scaler::{FeatureScaler, StandardScaler};
    use crate::types::profile::{Education, MaritalStatus, Sex};

    const MEAN: [f64; 9] = [1.6, 1.85, 1.55, 35.5, 11.7, 9.0, 7.6, 0.8, 0.7];
    const SCALE: [f64; 9] = [0.49, 0.79, 0.52, 9.2, 0.95, 2.9, 2.1, 1.4, 1.1];
    const COEF: [f64; 9] = [-0.05, -0.03, -0.08, 0.04, -0.25, 0.12, -0.22, 0.55, 0.30];
    const INTERCEPT: f64 = -1.35;

    fn assets_in_order(order: &[usize]) -> ModelAssets {
        let pick = |values: &[f64; 9]| order.iter().map(|&i| values[i]).collect::<Vec<_>>();
        let names = order.iter().map(|&i| FEATURE_NAMES[i].to_string()).collect();
        let scaler = FeatureScaler::Standard(StandardScaler {
            mean: pick(&MEAN),
            scale: pick(&SCALE),
            feature_names_in: None,
        });
        let classifier = LogisticRegression::new(pick(&COEF), INTERCEPT);
        ModelAssets::new(Box::new(classifier), scaler, names).unwrap()
    }

    fn sample_assets() -> ModelAssets {
        assets_in_order(&[0, 1, 2, 3, 4, 5, 6, 7, 8])
    }

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
    fn test_end_to_end_scenario() {
        let result = predict(&scenario_profile(), &sample_assets()).unwrap();

        assert!((0.0..=1.0).contains(&result.default_probability));
        assert_eq!(
            result.risk_tier,
            RiskTier::from_probability(result.default_probability)
        );
        assert_eq!(result.payment_to_bill_ratio, 40_000.0 / 50_001.0);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let assets = sample_assets();
        let profile = scenario_profile();

        let first = predict(&profile, &assets).unwrap();
        for _ in 0..10 {
            let again = predict(&profile, &assets).unwrap();
            assert_eq!(
                first.default_probability.to_bits(),
                again.default_probability.to_bits()
            );
        }
    }

    #[test]
    fn test_column_order_does_not_change_probability() {
        let profile = scenario_profile();
        let canonical = predict(&profile, &sample_assets()).unwrap();

        // Same fitted model, columns 4 and 7 declared in swapped order
        let swapped = predict(&profile, &assets_in_order(&[0, 1, 2, 3, 7, 5, 6, 4, 8])).unwrap();
        assert!((canonical.default_probability - swapped.default_probability).abs() < 1e-12);

        let reversed = predict(&profile, &assets_in_order(&[8, 7, 6, 5, 4, 3, 2, 1, 0])).unwrap();
        assert!((canonical.default_probability - reversed.default_probability).abs() < 1e-12);
    }

    #[test]
    fn test_riskier_profile_scores_higher() {
        let assets = sample_assets();
        let careful = predict(&scenario_profile(), &assets).unwrap();

        let risky = CustomerProfile {
            late_payment_count: 6,
            max_delay_months: 8,
            avg_payment_amount: 500.0,
            credit_limit: 20_000.0,
            ..scenario_profile()
        };
        let risky = predict(&risky, &assets).unwrap();

        assert!(risky.default_probability > careful.default_probability);
        assert_eq!(risky.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_feature_mismatch_is_distinct() {
        let names: Vec<String> = ["SEX", "EDUCATION", "MARRIAGE", "AGE", "LIMIT_BAL", "BILL_AMT1",
            "PAY_AMT1", "LATE_PAYMENT_COUNT", "MAX_DELAY"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let scaler = FeatureScaler::Standard(StandardScaler {
            mean: MEAN.to_vec(),
            scale: SCALE.to_vec(),
            feature_names_in: None,
        });
        let classifier = LogisticRegression::new(COEF.to_vec(), INTERCEPT);
        let assets = ModelAssets::new(Box::new(classifier), scaler, names).unwrap();

        let err = predict(&scenario_profile(), &assets).unwrap_err();
        assert!(matches!(err, PredictError::FeatureMismatch(_)));
    }

    #[test]
    fn test_failed_request_does_not_poison_engine() {
        let engine = InferenceEngine::with_assets(Arc::new(sample_assets()));

        let bad = CustomerProfile {
            age: 95,
            ..scenario_profile()
        };
        assert!(matches!(
            engine.predict(&bad),
            Err(PredictError::InvalidProfile(_))
        ));
        assert!(engine.predict(&scenario_profile()).is_ok());
    }

    struct BrokenClassifier {
        classes: Vec<i64>,
        output: Vec<f64>,
    }

    impl Classifier for BrokenClassifier {
        fn name(&self) -> &str {
            "broken"
        }

        fn classes(&self) -> &[i64] {
            &self.classes
        }

        fn n_features(&self) -> Option<usize> {
            None
        }

        fn predict_proba(&self, _row: &[f64]) -> Result<Vec<f64>, PredictError> {
            Ok(self.output.clone())
        }
    }

    fn assets_with(classifier: BrokenClassifier) -> ModelAssets {
        let names = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        let scaler = FeatureScaler::Standard(StandardScaler {
            mean: MEAN.to_vec(),
            scale: SCALE.to_vec(),
            feature_names_in: None,
        });
        ModelAssets::new(Box::new(classifier), scaler, names).unwrap()
    }

    #[test]
    fn test_positive_class_is_looked_up_by_label() {
        // classes_ reported in reverse order: default class first
        let assets = assets_with(BrokenClassifier {
            classes: vec![1, 0],
            output: vec![0.7, 0.3],
        });
        let result = predict(&scenario_profile(), &assets).unwrap();
        assert_eq!(result.default_probability, 0.7);
        assert_eq!(result.risk_tier, RiskTier::High);
    }

    #[test]
    fn test_invalid_probability_is_inference_error() {
        let assets = assets_with(BrokenClassifier {
            classes: vec![0, 1],
            output: vec![0.5, f64::NAN],
        });
        assert!(matches!(
            predict(&scenario_profile(), &assets),
            Err(PredictError::Inference(_))
        ));

        let assets = assets_with(BrokenClassifier {
            classes: vec![0, 1],
            output: vec![0.5],
        });
        assert!(matches!(
            predict(&scenario_profile(), &assets),
            Err(PredictError::Inference(_))
        ));
    }
}
