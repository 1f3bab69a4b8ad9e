//! Type definitions for credit risk assessment

pub mod prediction;
pub mod profile;

pub use prediction::{PredictionResult, RiskTier, TierColor};
pub use profile::{CustomerProfile, Education, MaritalStatus, Sex};
