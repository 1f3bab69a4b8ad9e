//! ONNX classifier backend
//!
//! Loads skl2onnx exports of the classifier. The export must be produced with
//! `options={"zipmap": False}` so probabilities come back as a plain
//! `[batch, n_classes]` tensor.
//!
//! ONNX graphs do not carry scikit-learn's `classes_`, so the model is taken
//! to be a binary `[0, 1]` classifier; a probability output whose static
//! width is neither 1 nor 2 is rejected at load time. The static input width
//! (when the graph declares one) is checked against the scaler like the JSON
//! backend's `coef_` width.

use crate::error::PredictError;
use crate::models::classifier::Classifier;
use anyhow::{bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Tensor, ValueType};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    name: String,
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    n_features: Option<usize>,
    classes: Vec<i64>,
}

/// Last dimension of a declared tensor shape, if static
fn static_width(dims: &[i64]) -> Option<usize> {
    dims.last()
        .copied()
        .filter(|&d| d > 0)
        .map(|d| d as usize)
}

fn declared_width(value_type: &ValueType) -> Option<usize> {
    match value_type {
        ValueType::Tensor { shape, .. } => static_width(shape),
        _ => None,
    }
}

impl OnnxClassifier {
    /// Load an ONNX model from file
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let path = path.as_ref();

        // Committing twice is harmless; the first environment wins.
        let _ = ort::init().commit();

        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX classifier");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input = session
            .inputs
            .first()
            .context("ONNX model declares no inputs")?;
        let input_name = input.name.clone();
        let n_features = declared_width(&input.input_type);

        let output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .context("ONNX model declares no outputs")?;
        let output_name = output.name.clone();

        let classes = vec![0, 1];
        match declared_width(&output.output_type) {
            Some(width) if width != 1 && width != classes.len() => bail!(
                "output '{}' has {} columns, expected a binary classifier",
                output_name,
                width
            ),
            _ => {}
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            n_features = ?n_features,
            "ONNX classifier loaded"
        );

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
            n_features,
            classes,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, PredictError> {
        let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features))
            .map_err(|e| PredictError::Inference(format!("Failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| PredictError::Inference(format!("Lock error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| PredictError::Inference(e.to_string()))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            PredictError::Inference(format!("model has no output '{}'", self.output_name))
        })?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| PredictError::Inference(e.to_string()))?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        debug!(model = %self.name, shape = ?dims, "Extracted probability tensor");

        match dims.last().copied() {
            Some(1) if !data.is_empty() => {
                let p = f64::from(data[0]);
                Ok(vec![1.0 - p, p])
            }
            Some(n) if n as usize == self.classes.len() && data.len() >= n as usize => {
                Ok(data[..n as usize].iter().map(|&v| f64::from(v)).collect())
            }
            _ => Err(PredictError::Inference(format!(
                "unexpected probability tensor shape {:?}",
                dims
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_width() {
        assert_eq!(static_width(&[1, 9]), Some(9));
        assert_eq!(static_width(&[-1, 9]), Some(9));
        // dynamic feature axis
        assert_eq!(static_width(&[-1, -1]), None);
        assert_eq!(static_width(&[]), None);
    }
}
