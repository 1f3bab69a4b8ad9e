//! Credit Risk Assessor Library
//!
//! Scores a customer's probability of defaulting on a credit card with a
//! pre-trained scikit-learn classifier and maps it to a Low/Medium/High
//! risk tier.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod models;
pub mod report;
pub mod types;

pub use config::AppConfig;
pub use error::{AssetLoadError, PredictError};
pub use feature_extractor::{FeatureExtractor, FeatureVector};
pub use models::inference::{predict, InferenceEngine};
pub use models::loader::{AssetLoader, ModelAssets};
pub use report::AssessmentReport;
pub use types::{prediction::PredictionResult, profile::CustomerProfile};
