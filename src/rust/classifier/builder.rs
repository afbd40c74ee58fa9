use std::path::Path;
use std::sync::Arc;

use log::info;

use super::classifier::SpamClassifier;
use super::decision::{validate_threshold, DEFAULT_THRESHOLD};
use super::error::ClassifierError;
use super::model::ProbabilityModel;
use super::vectorizer::FeatureVectorizer;
use crate::asset_loader::{ArtifactPaths, AssetLoader, AssetSource, LoadedAssets};
use crate::runtime::RuntimeConfig;

/// A builder for constructing a SpamClassifier with a fluent interface.
///
/// Exactly one source of components must be given: a loader, artifact
/// paths, or an explicit vectorizer/model pair.
///
/// Only [`with_loader`](Self::with_loader) shares one load between
/// classifiers. Artifact paths given through
/// [`with_models_dir`](Self::with_models_dir) or
/// [`with_artifacts`](Self::with_artifacts) are read by a loader owned by
/// this builder, so every builder that is built reads the files again.
#[derive(Default, Debug)]
pub struct SpamClassifierBuilder {
    artifacts: Option<ArtifactPaths>,
    assets: Option<LoadedAssets>,
    default_threshold: Option<f32>,
    runtime_config: RuntimeConfig,
}

impl SpamClassifierBuilder {
    /// Creates a new empty SpamClassifierBuilder instance with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration used when the builder loads artifacts itself
    ///
    /// # Example
    /// ```
    /// use spam_detector::{SpamClassifierBuilder, RuntimeConfig};
    ///
    /// let builder = SpamClassifierBuilder::new()
    ///     .with_runtime_config(RuntimeConfig::default());
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    fn ensure_unset(&self) -> Result<(), ClassifierError> {
        if self.artifacts.is_some() || self.assets.is_some() {
            return Err(ClassifierError::BuildError("Model components already set".to_string()));
        }
        Ok(())
    }

    /// Reads `vectorizer.json` and `model.onnx` from `models_dir` at build time.
    ///
    /// Each built builder performs its own load. Build several classifiers
    /// from one [`AssetLoader`] with [`with_loader`](Self::with_loader) to
    /// read the artifacts once per process.
    pub fn with_models_dir<P: AsRef<Path>>(self, models_dir: P) -> Result<Self, ClassifierError> {
        self.with_artifacts(ArtifactPaths::from_dir(models_dir))
    }

    /// Sets explicit artifact locations, loaded once when this builder is built
    pub fn with_artifacts(mut self, paths: ArtifactPaths) -> Result<Self, ClassifierError> {
        self.ensure_unset()?;
        if paths.vectorizer_path.as_os_str().is_empty() || paths.model_path.as_os_str().is_empty() {
            return Err(ClassifierError::BuildError(
                "Vectorizer and model paths cannot be empty".to_string(),
            ));
        }
        self.artifacts = Some(paths);
        Ok(self)
    }

    /// Takes the components from an initialize-once loader.
    ///
    /// The loader performs its load on the first call; a cached failure is
    /// returned as [`ClassifierError::ModelLoad`].
    pub fn with_loader<S: AssetSource>(mut self, loader: &AssetLoader<S>) -> Result<Self, ClassifierError> {
        self.ensure_unset()?;
        self.assets = Some(loader.load()?.clone());
        Ok(self)
    }

    /// Uses an already constructed vectorizer and model
    pub fn with_components(
        mut self,
        vectorizer: Arc<dyn FeatureVectorizer>,
        model: Arc<dyn ProbabilityModel>,
    ) -> Result<Self, ClassifierError> {
        self.ensure_unset()?;
        let assets = LoadedAssets::new(vectorizer, model)
            .map_err(|e| ClassifierError::BuildError(e.to_string()))?;
        self.assets = Some(assets);
        Ok(self)
    }

    /// Sets the threshold used by [`SpamClassifier::classify_default`]
    pub fn with_default_threshold(mut self, threshold: f32) -> Result<Self, ClassifierError> {
        self.default_threshold = Some(validate_threshold(threshold)?);
        Ok(self)
    }

    /// Builds and returns the final SpamClassifier instance
    ///
    /// # Returns
    /// * `Result<SpamClassifier, ClassifierError>` - The constructed classifier if successful, or an error if:
    ///   - No loader, artifacts or components have been set
    ///   - The artifacts could not be loaded
    pub fn build(self) -> Result<SpamClassifier, ClassifierError> {
        let assets = match (self.assets, self.artifacts) {
            (Some(assets), _) => assets,
            (None, Some(paths)) => {
                info!("Loading artifacts for classifier build");
                AssetLoader::from_paths(paths, self.runtime_config).load()?.clone()
            }
            (None, None) => {
                return Err(ClassifierError::BuildError(
                    "A loader, artifact paths or components must be set".to_string(),
                ))
            }
        };

        let (vectorizer, model) = assets.components();
        let (vectorizer_path, model_path) = match assets.paths() {
            Some(paths) => (
                Some(paths.vectorizer_path.to_string_lossy().to_string()),
                Some(paths.model_path.to_string_lossy().to_string()),
            ),
            None => (None, None),
        };

        Ok(SpamClassifier {
            vectorizer,
            model,
            default_threshold: self.default_threshold.unwrap_or(DEFAULT_THRESHOLD),
            vectorizer_path,
            model_path,
        })
    }
}
