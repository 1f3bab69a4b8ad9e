//! Model artifact loader
//!
//! Reads the classifier, the fitted scaler and the ordered feature list from
//! the models directory. The first load result (success or failure) is
//! memoized and shared by every later caller.

use crate::config::ModelsConfig;
use crate::error::{Artifact, AssetLoadError};
use crate::feature_extractor::FEATURE_NAMES;
use crate::models::classifier::{Classifier, LogisticRegression, DEFAULT_CLASS};
use crate::models::scaler::FeatureScaler;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Immutable, process-wide model assets
pub struct ModelAssets {
    classifier: Box<dyn Classifier>,
    scaler: FeatureScaler,
    feature_names: Vec<String>,
}

impl fmt::Debug for ModelAssets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAssets")
            .field("classifier", &self.classifier.name())
            .field("scaler", &self.scaler)
            .field("feature_names", &self.feature_names)
            .finish()
    }
}

impl ModelAssets {
    /// Bundle loaded artifacts, checking they describe the same model.
    pub fn new(
        classifier: Box<dyn Classifier>,
        scaler: FeatureScaler,
        feature_names: Vec<String>,
    ) -> Result<Self, AssetLoadError> {
        if feature_names.is_empty() {
            return Err(AssetLoadError::Inconsistent(
                "feature list is empty".to_string(),
            ));
        }

        {
            let mut seen = HashSet::with_capacity(feature_names.len());
            if let Some(dup) = feature_names.iter().find(|n| !seen.insert(n.as_str())) {
                return Err(AssetLoadError::Inconsistent(format!(
                    "feature '{}' listed more than once",
                    dup
                )));
            }
        }

        scaler
            .validate()
            .map_err(|e| AssetLoadError::Inconsistent(format!("scaler: {}", e)))?;

        if scaler.n_features() != feature_names.len() {
            return Err(AssetLoadError::Inconsistent(format!(
                "scaler fitted on {} features but feature list has {}",
                scaler.n_features(),
                feature_names.len()
            )));
        }

        if let Some(n) = classifier.n_features() {
            if n != feature_names.len() {
                return Err(AssetLoadError::Inconsistent(format!(
                    "classifier expects {} features but feature list has {}",
                    n,
                    feature_names.len()
                )));
            }
        }

        if !classifier.classes().contains(&DEFAULT_CLASS) {
            return Err(AssetLoadError::Inconsistent(format!(
                "classifier classes {:?} do not include the default class {}",
                classifier.classes(),
                DEFAULT_CLASS
            )));
        }

        let fitted_names = [
            ("scaler", scaler.feature_names_in()),
            ("classifier", classifier.feature_names_in()),
        ];
        for (which, names) in fitted_names {
            if let Some(names) = names {
                if names != feature_names.as_slice() {
                    return Err(AssetLoadError::Inconsistent(format!(
                        "{} was fitted on columns {:?}, feature list is {:?}",
                        which, names, feature_names
                    )));
                }
            }
        }

        Ok(Self {
            classifier,
            scaler,
            feature_names,
        })
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    /// Column order the scaler and classifier were fitted with
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

/// Locations of the three model artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub classifier: PathBuf,
    pub scaler: PathBuf,
    pub features: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `models_dir`
    pub fn in_dir<P: AsRef<Path>>(models_dir: P) -> Self {
        let dir = models_dir.as_ref();
        Self {
            classifier: dir.join("logistic_regression_model.json"),
            scaler: dir.join("scaler.json"),
            features: dir.join("model_features.json"),
        }
    }

    pub fn from_config(config: &ModelsConfig) -> Self {
        let dir = Path::new(&config.models_dir);
        Self {
            classifier: dir.join(&config.classifier_file),
            scaler: dir.join(&config.scaler_file),
            features: dir.join(&config.features_file),
        }
    }

    fn entries(&self) -> [(Artifact, &Path); 3] {
        [
            (Artifact::Classifier, self.classifier.as_path()),
            (Artifact::Scaler, self.scaler.as_path()),
            (Artifact::FeatureNames, self.features.as_path()),
        ]
    }
}

/// Loads model assets at most once per loader
pub struct AssetLoader {
    paths: ArtifactPaths,
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    cached: OnceLock<Result<Arc<ModelAssets>, AssetLoadError>>,
    #[cfg(test)]
    loads: AtomicUsize,
}

impl AssetLoader {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self::with_threads(paths, 1)
    }

    pub fn with_threads(paths: ArtifactPaths, onnx_threads: usize) -> Self {
        Self {
            paths,
            onnx_threads: onnx_threads.max(1),
            cached: OnceLock::new(),
            #[cfg(test)]
            loads: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &ModelsConfig) -> Self {
        Self::with_threads(ArtifactPaths::from_config(config), config.onnx_threads)
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Load the assets, or return the memoized outcome of the first load.
    ///
    /// Concurrent first callers block until the single load completes and
    /// all observe the same result.
    pub fn load(&self) -> Result<Arc<ModelAssets>, AssetLoadError> {
        self.cached
            .get_or_init(|| {
                #[cfg(test)]
                self.loads.fetch_add(1, Ordering::Relaxed);
                let result = self.load_uncached().map(Arc::new);
                if let Err(e) = &result {
                    warn!(error = %e, "Model assets unavailable, prediction disabled");
                }
                result
            })
            .clone()
    }

    /// How many times the artifacts were actually read
    #[cfg(test)]
    fn loads_performed(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    fn load_uncached(&self) -> Result<ModelAssets, AssetLoadError> {
        // Report a missing file before reading anything
        for (artifact, path) in self.paths.entries() {
            if !path.exists() {
                return Err(AssetLoadError::Missing {
                    artifact,
                    path: path.to_path_buf(),
                });
            }
        }

        info!(
            classifier = %self.paths.classifier.display(),
            scaler = %self.paths.scaler.display(),
            features = %self.paths.features.display(),
            "Loading model assets"
        );

        let feature_names: Vec<String> =
            read_json(Artifact::FeatureNames, &self.paths.features)?;

        let scaler: FeatureScaler = read_json(Artifact::Scaler, &self.paths.scaler)?;
        scaler
            .validate()
            .map_err(|reason| malformed(Artifact::Scaler, &self.paths.scaler, reason))?;

        let classifier = self.load_classifier()?;

        if !feature_names
            .iter()
            .all(|n| FEATURE_NAMES.iter().any(|c| c.eq_ignore_ascii_case(n.trim())))
        {
            warn!(
                features = ?feature_names,
                "Feature list names columns this pipeline does not derive"
            );
        }

        let assets = ModelAssets::new(classifier, scaler, feature_names)?;

        info!(
            model = %assets.classifier().name(),
            features = assets.feature_names().len(),
            "Model assets loaded successfully"
        );

        Ok(assets)
    }

    fn load_classifier(&self) -> Result<Box<dyn Classifier>, AssetLoadError> {
        let path = &self.paths.classifier;
        let is_onnx = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("onnx"));

        if is_onnx {
            return self.load_onnx_classifier(path);
        }

        let model: LogisticRegression = read_json(Artifact::Classifier, path)?;
        model
            .validate()
            .map_err(|reason| malformed(Artifact::Classifier, path, reason))?;
        Ok(Box::new(model))
    }

    #[cfg(feature = "onnx")]
    fn load_onnx_classifier(&self, path: &Path) -> Result<Box<dyn Classifier>, AssetLoadError> {
        let model = crate::models::onnx::OnnxClassifier::load(path, self.onnx_threads)
            .map_err(|e| AssetLoadError::Unreadable {
                artifact: Artifact::Classifier,
                path: path.to_path_buf(),
                reason: format!("{:#}", e),
            })?;
        Ok(Box::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx_classifier(&self, path: &Path) -> Result<Box<dyn Classifier>, AssetLoadError> {
        Err(malformed(
            Artifact::Classifier,
            path,
            format!(
                "ONNX classifiers need the `onnx` feature ({} threads requested)",
                self.onnx_threads
            ),
        ))
    }
}

fn malformed(artifact: Artifact, path: &Path, reason: String) -> AssetLoadError {
    AssetLoadError::Malformed {
        artifact,
        path: path.to_path_buf(),
        reason,
    }
}

fn read_json<T: DeserializeOwned>(artifact: Artifact, path: &Path) -> Result<T, AssetLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|e| AssetLoadError::Unreadable {
        artifact,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| malformed(artifact, path, e.to_string()))
}
