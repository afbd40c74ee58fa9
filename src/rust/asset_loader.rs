use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::classifier::model::{OnnxModel, ProbabilityModel};
use crate::classifier::vectorizer::{FeatureVectorizer, NgramVectorizer};
use crate::runtime::RuntimeConfig;

pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const MODEL_FILE: &str = "model.onnx";
pub const CHECKSUMS_FILE: &str = "checksums.json";

#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Artifact not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Invalid vectorizer artifact: {0}")]
    InvalidVectorizer(String),
    #[error("Invalid model artifact: {0}")]
    InvalidModel(String),
    #[error("Invalid checksum manifest: {0}")]
    InvalidManifest(String),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
    #[error("ONNX Runtime error: {0}")]
    Runtime(String),
}

impl ModelLoadError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return ModelLoadError::NotFound(path.to_path_buf());
        }
        ModelLoadError::Io {
            path: path.to_path_buf(),
            source: Arc::new(source),
        }
    }
}

/// Locations of the two serialized artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub vectorizer_path: PathBuf,
    pub model_path: PathBuf,
    /// Optional SHA-256 manifest; only checked when the file exists.
    pub checksums_path: Option<PathBuf>,
}

impl ArtifactPaths {
    pub fn new(vectorizer_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            vectorizer_path: vectorizer_path.into(),
            model_path: model_path.into(),
            checksums_path: None,
        }
    }

    /// Resolves the standard file names inside `models_dir`.
    pub fn from_dir<P: AsRef<Path>>(models_dir: P) -> Self {
        let dir = models_dir.as_ref();
        Self {
            vectorizer_path: dir.join(VECTORIZER_FILE),
            model_path: dir.join(MODEL_FILE),
            checksums_path: Some(dir.join(CHECKSUMS_FILE)),
        }
    }

    pub fn with_checksums(mut self, checksums_path: impl Into<PathBuf>) -> Self {
        self.checksums_path = Some(checksums_path.into());
        self
    }

    /// Returns the default models directory path
    pub fn default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("SPAM_DETECTOR_HOME") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("spam-detector").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("spam-detector").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("spam-detector").join("models")
    }

    pub fn new_default() -> Self {
        Self::from_dir(Self::default_models_dir())
    }

    fn missing(&self) -> Option<&Path> {
        [&self.vectorizer_path, &self.model_path]
            .into_iter()
            .find(|path| !path.exists())
            .map(PathBuf::as_path)
    }
}

fn sha256_hex(path: &Path) -> Result<String, ModelLoadError> {
    let bytes = fs::read(path).map_err(|e| ModelLoadError::io(path, e))?;
    log::debug!("Read {} bytes from {:?}", bytes.len(), path);
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Checks both artifacts against the checksum manifest, if there is one.
///
/// The manifest is a JSON object with optional `vectorizer` and `model`
/// entries holding hex SHA-256 digests. Other keys are ignored, whatever
/// their type.
pub fn verify_artifacts(paths: &ArtifactPaths) -> Result<(), ModelLoadError> {
    let manifest_path = match &paths.checksums_path {
        Some(path) if path.exists() => path,
        _ => {
            log::debug!("No checksum manifest, skipping verification");
            return Ok(());
        }
    };

    let raw = fs::read_to_string(manifest_path).map_err(|e| ModelLoadError::io(manifest_path, e))?;
    let manifest: serde_json::Map<String, Value> = serde_json::from_str(&raw)
        .map_err(|e| ModelLoadError::InvalidManifest(format!("{}: {}", manifest_path.display(), e)))?;

    for (file_type, path) in [("vectorizer", &paths.vectorizer_path), ("model", &paths.model_path)] {
        let expected = match manifest.get(file_type) {
            None => continue,
            Some(Value::String(digest)) => digest,
            Some(other) => {
                return Err(ModelLoadError::InvalidManifest(format!(
                    "{}: '{}' must be a hex digest string, found {}",
                    manifest_path.display(),
                    file_type,
                    other
                )))
            }
        };
        let actual = sha256_hex(path)?;
        log::info!("Verifying {} file {:?}", file_type, path);
        if !actual.eq_ignore_ascii_case(expected) {
            log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, actual);
            return Err(ModelLoadError::HashMismatch {
                file_type: file_type.to_string(),
                expected: expected.clone(),
                actual,
            });
        }
    }
    Ok(())
}

/// The loaded vectorizer and classifier, shared read-only.
#[derive(Debug, Clone)]
pub struct LoadedAssets {
    vectorizer: Arc<dyn FeatureVectorizer>,
    model: Arc<dyn ProbabilityModel>,
    paths: Option<ArtifactPaths>,
}

impl LoadedAssets {
    /// Pairs a vectorizer with a model, rejecting a feature width mismatch.
    pub fn new(
        vectorizer: Arc<dyn FeatureVectorizer>,
        model: Arc<dyn ProbabilityModel>,
    ) -> Result<Self, ModelLoadError> {
        if let Some(expected) = model.expected_features() {
            if expected != vectorizer.dimension() {
                return Err(ModelLoadError::InvalidModel(format!(
                    "Model expects {} features but the vectorizer produces {}",
                    expected,
                    vectorizer.dimension()
                )));
            }
        }
        Ok(Self { vectorizer, model, paths: None })
    }

    fn with_paths(mut self, paths: ArtifactPaths) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn vectorizer(&self) -> &Arc<dyn FeatureVectorizer> {
        &self.vectorizer
    }

    pub fn model(&self) -> &Arc<dyn ProbabilityModel> {
        &self.model
    }

    pub fn paths(&self) -> Option<&ArtifactPaths> {
        self.paths.as_ref()
    }

    /// Returns the `(vectorizer, classifier)` pair.
    pub fn components(&self) -> (Arc<dyn FeatureVectorizer>, Arc<dyn ProbabilityModel>) {
        (Arc::clone(&self.vectorizer), Arc::clone(&self.model))
    }
}

/// Where the artifacts come from. Every call performs the underlying I/O.
pub trait AssetSource: Send + Sync {
    fn load_assets(&self) -> Result<LoadedAssets, ModelLoadError>;

    /// Short human-readable description used in log lines.
    fn describe(&self) -> String;
}

/// Reads `vectorizer.json` and `model.onnx` from disk.
#[derive(Debug, Clone)]
pub struct FileAssetSource {
    paths: ArtifactPaths,
    runtime_config: RuntimeConfig,
}

impl FileAssetSource {
    pub fn new(paths: ArtifactPaths, runtime_config: RuntimeConfig) -> Self {
        Self { paths, runtime_config }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }
}

impl AssetSource for FileAssetSource {
    fn load_assets(&self) -> Result<LoadedAssets, ModelLoadError> {
        if let Some(path) = self.paths.missing() {
            log::error!("Artifact missing: {:?}", path);
            return Err(ModelLoadError::NotFound(path.to_path_buf()));
        }

        verify_artifacts(&self.paths)?;

        let vectorizer = NgramVectorizer::from_file(&self.paths.vectorizer_path)?;
        log::info!("Vectorizer loaded ({} features)", vectorizer.dimension());

        let model = OnnxModel::from_file(&self.paths.model_path, &self.runtime_config)?;
        log::info!("Model loaded and validated");

        Ok(LoadedAssets::new(Arc::new(vectorizer), Arc::new(model))?.with_paths(self.paths.clone()))
    }

    fn describe(&self) -> String {
        format!(
            "vectorizer {:?}, model {:?}",
            self.paths.vectorizer_path, self.paths.model_path
        )
    }
}

/// Observable state of an [`AssetLoader`].
#[derive(Debug, Clone)]
pub enum LoadState {
    NotAttempted,
    Failed(ModelLoadError),
    Loaded,
}

/// Loads the artifacts at most once and hands out the cached result.
///
/// Concurrent first calls block until the single load finishes. A failed
/// load is cached too: retrying a missing or corrupt artifact cannot succeed
/// without outside intervention, so later calls return the same error
/// without touching storage.
pub struct AssetLoader<S: AssetSource = FileAssetSource> {
    source: S,
    cell: OnceLock<Result<LoadedAssets, ModelLoadError>>,
}

impl AssetLoader<FileAssetSource> {
    /// Creates a loader reading from the default models directory
    pub fn new_default() -> Self {
        Self::from_paths(ArtifactPaths::new_default(), RuntimeConfig::default())
    }

    pub fn from_models_dir<P: AsRef<Path>>(models_dir: P, runtime_config: RuntimeConfig) -> Self {
        Self::from_paths(ArtifactPaths::from_dir(models_dir), runtime_config)
    }

    pub fn from_paths(paths: ArtifactPaths, runtime_config: RuntimeConfig) -> Self {
        Self::new(FileAssetSource::new(paths, runtime_config))
    }
}

impl<S: AssetSource> AssetLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cell: OnceLock::new(),
        }
    }

    /// Returns the cached assets, loading them on the first call.
    pub fn load(&self) -> Result<&LoadedAssets, ModelLoadError> {
        self.cell
            .get_or_init(|| {
                log::info!("Loading model artifacts ({})", self.source.describe());
                let result = self.source.load_assets();
                match &result {
                    Ok(_) => log::info!("Model artifacts ready to use"),
                    Err(e) => log::error!("Failed to load model artifacts: {}", e),
                }
                result
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn state(&self) -> LoadState {
        match self.cell.get() {
            None => LoadState::NotAttempted,
            Some(Ok(_)) => LoadState::Loaded,
            Some(Err(e)) => LoadState::Failed(e.clone()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: AssetSource> fmt::Debug for AssetLoader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetLoader")
            .field("source", &self.source.describe())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models_dir() {
        // Test with environment variable
        env::set_var("SPAM_DETECTOR_HOME", "/tmp/test-spam-home");
        let path = ArtifactPaths::default_models_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-spam-home/models"));
        env::remove_var("SPAM_DETECTOR_HOME");

        // Test without environment variable
        let path = ArtifactPaths::default_models_dir();
        assert!(path.to_str().unwrap().contains("spam-detector/models"));
    }

    #[test]
    fn test_paths_from_dir() {
        let paths = ArtifactPaths::from_dir("/opt/models");
        assert!(paths.vectorizer_path.ends_with("vectorizer.json"));
        assert!(paths.model_path.ends_with("model.onnx"));
        assert_eq!(paths.checksums_path, Some(PathBuf::from("/opt/models/checksums.json")));
    }

    #[test]
    fn test_not_found_io_error_maps_to_not_found() {
        let err = ModelLoadError::io(
            Path::new("/nowhere/model.onnx"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ModelLoadError::NotFound(_)));

        let err = ModelLoadError::io(
            Path::new("/nowhere/model.onnx"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ModelLoadError::Io { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
