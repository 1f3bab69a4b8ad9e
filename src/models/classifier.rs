//! Binary classifiers producing a probability of default

use crate::error::PredictError;
use serde::{Deserialize, Serialize};

/// Class label of the positive ("default") outcome
pub const DEFAULT_CLASS: i64 = 1;

/// A fitted probabilistic classifier.
///
/// Implementations behave like scikit-learn's `predict_proba` for a single
/// row: one probability per entry of [`Classifier::classes`].
pub trait Classifier: Send + Sync {
    /// Short model name for logs
    fn name(&self) -> &str;

    /// Class labels in the order `predict_proba` reports them
    fn classes(&self) -> &[i64];

    /// Number of input features, when the model records it
    fn n_features(&self) -> Option<usize>;

    /// Column names seen during training, when the model records them
    fn feature_names_in(&self) -> Option<&[String]> {
        None
    }

    /// Class probabilities for one already-scaled row
    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, PredictError>;
}

/// Logistic function, stable for large |z|
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

/// Fitted binary logistic regression.
///
/// Mirrors scikit-learn's attributes: `coef` is `coef_` (shape `[1, n]`),
/// `intercept` is `intercept_` (length 1), `classes` is `classes_`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names_in: Option<Vec<String>>,
}

impl LogisticRegression {
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            coef: vec![weights],
            intercept: vec![intercept],
            classes: default_classes(),
            feature_names_in: None,
        }
    }

    fn weights(&self) -> &[f64] {
        self.coef.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check the fitted parameters describe a binary model
    pub fn validate(&self) -> Result<(), String> {
        if self.coef.len() != 1 {
            return Err(format!(
                "expected a binary model with 1 coefficient row, found {}",
                self.coef.len()
            ));
        }
        if self.intercept.len() != 1 {
            return Err(format!(
                "expected 1 intercept, found {}",
                self.intercept.len()
            ));
        }
        if self.classes.len() != 2 {
            return Err(format!("expected 2 classes, found {}", self.classes.len()));
        }
        if self.weights().is_empty() {
            return Err("model has no coefficients".to_string());
        }
        if self
            .weights()
            .iter()
            .chain(self.intercept.iter())
            .any(|v| !v.is_finite())
        {
            return Err("coefficients contain non-finite values".to_string());
        }
        if let Some(names) = &self.feature_names_in {
            if names.len() != self.weights().len() {
                return Err(format!(
                    "feature_names_in has {} names for {} coefficients",
                    names.len(),
                    self.weights().len()
                ));
            }
        }
        Ok(())
    }

    /// Linear decision function `w·x + b`
    pub fn decision_function(&self, row: &[f64]) -> Result<f64, PredictError> {
        let weights = self.weights();
        if row.len() != weights.len() {
            return Err(PredictError::Inference(format!(
                "model expects {} features, got {}",
                weights.len(),
                row.len()
            )));
        }
        let intercept = self.intercept.first().copied().unwrap_or(0.0);
        let z = weights.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + intercept;
        if !z.is_finite() {
            return Err(PredictError::Inference(format!(
                "non-finite decision value {}",
                z
            )));
        }
        Ok(z)
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.weights().len())
    }

    fn feature_names_in(&self) -> Option<&[String]> {
        self.feature_names_in.as_deref()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, PredictError> {
        // Binary case: classes_[1] is the positive side of the decision function
        let p = sigmoid(self.decision_function(row)?);
        Ok(vec![1.0 - p, p])
    }
}
