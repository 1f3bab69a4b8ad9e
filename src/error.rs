//! Error types for asset loading and risk prediction

use std::path::PathBuf;
use thiserror::Error;

/// Which of the three model artifacts an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Classifier,
    Scaler,
    FeatureNames,
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Artifact::Classifier => "classifier",
            Artifact::Scaler => "scaler",
            Artifact::FeatureNames => "feature list",
        })
    }
}

/// Failure to load the model artifacts.
///
/// A failed load is memoized and cloned out to every caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetLoadError {
    /// Artifact file does not exist
    #[error("{artifact} artifact not found at {}", .path.display())]
    Missing { artifact: Artifact, path: PathBuf },

    /// Artifact exists but could not be read
    #[error("failed to read {artifact} artifact {}: {reason}", .path.display())]
    Unreadable {
        artifact: Artifact,
        path: PathBuf,
        reason: String,
    },

    /// Artifact was read but does not describe a fitted object
    #[error("malformed {artifact} artifact {}: {reason}", .path.display())]
    Malformed {
        artifact: Artifact,
        path: PathBuf,
        reason: String,
    },

    /// Artifacts load individually but disagree with each other
    #[error("inconsistent model artifacts: {0}")]
    Inconsistent(String),
}

/// Failure of a single prediction request. Never affects the cached assets.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// Model assets are unavailable
    #[error("prediction unavailable: {0}")]
    AssetLoad(#[from] AssetLoadError),

    /// Derived features do not line up with the loaded feature list
    #[error("feature mismatch between pipeline and model artifacts: {0}")]
    FeatureMismatch(String),

    /// Profile field outside the accepted input range
    #[error("invalid customer profile: {0}")]
    InvalidProfile(String),

    /// Scaler rejected the feature vector
    #[error("feature scaling failed: {0}")]
    Transform(String),

    /// Classifier rejected the scaled vector or produced an unusable output
    #[error("model inference failed: {0}")]
    Inference(String),
}
