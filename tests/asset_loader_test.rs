use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use ndarray::Array2;
use sha2::{Digest, Sha256};
use spam_detector::asset_loader::verify_artifacts;
use spam_detector::{
    ArtifactPaths, AssetLoader, AssetSource, ClassifierError, FeatureVector, FeatureVectorizer, LoadState,
    LoadedAssets, ModelLoadError, ProbabilityModel, ProbabilityPair, RuntimeConfig, SpamClassifier,
};

#[derive(Debug)]
struct ZeroVectorizer;

impl FeatureVectorizer for ZeroVectorizer {
    fn dimension(&self) -> usize {
        2
    }

    fn vectorize(&self, _text: &str) -> Result<FeatureVector, ClassifierError> {
        Ok(Array2::zeros((1, 2)))
    }
}

#[derive(Debug)]
struct HamModel;

impl ProbabilityModel for HamModel {
    fn predict_probabilities(&self, _features: &FeatureVector) -> Result<ProbabilityPair, ClassifierError> {
        Ok(ProbabilityPair::new(0.9, 0.1))
    }
}

/// Counts every underlying read.
struct CountingSource {
    reads: AtomicUsize,
    fail: bool,
}

impl CountingSource {
    fn new(fail: bool) -> Self {
        Self {
            reads: AtomicUsize::new(0),
            fail,
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl AssetSource for CountingSource {
    fn load_assets(&self) -> Result<LoadedAssets, ModelLoadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ModelLoadError::InvalidModel("corrupt artifact".into()));
        }
        LoadedAssets::new(Arc::new(ZeroVectorizer), Arc::new(HamModel))
    }

    fn describe(&self) -> String {
        "counting source".to_string()
    }
}

fn sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn write_artifacts(dir: &Path, vectorizer: &str, model: &[u8]) {
    fs::write(dir.join("vectorizer.json"), vectorizer).unwrap();
    fs::write(dir.join("model.onnx"), model).unwrap();
}

#[test]
fn test_two_loads_read_once() {
    let loader = AssetLoader::new(CountingSource::new(false));
    assert!(matches!(loader.state(), LoadState::NotAttempted));

    let first = loader.load().expect("first load");
    let second = loader.load().expect("second load");
    assert!(std::ptr::eq(first, second));
    assert_eq!(loader.source().reads(), 1);
    assert!(matches!(loader.state(), LoadState::Loaded));
    assert!(loader.is_loaded());
}

#[test]
fn test_failure_is_cached_without_retry() {
    let loader = AssetLoader::new(CountingSource::new(true));

    let first = loader.load().unwrap_err();
    let second = loader.load().unwrap_err();
    assert!(matches!(first, ModelLoadError::InvalidModel(_)));
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(loader.source().reads(), 1);
    assert!(matches!(loader.state(), LoadState::Failed(ModelLoadError::InvalidModel(_))));
    assert!(!loader.is_loaded());
}

#[test]
fn test_concurrent_first_access_loads_once() {
    let loader = Arc::new(AssetLoader::new(CountingSource::new(false)));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let loader = Arc::clone(&loader);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                loader.load().map(|_| ()).map_err(|e| e.to_string())
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }
    assert_eq!(loader.source().reads(), 1);
}

#[test]
fn test_builder_surfaces_cached_failure() {
    let loader = AssetLoader::new(CountingSource::new(true));
    for _ in 0..2 {
        let err = SpamClassifier::builder().with_loader(&loader).unwrap_err();
        assert!(matches!(err, ClassifierError::ModelLoad(ModelLoadError::InvalidModel(_))));
        assert!(std::error::Error::source(&err).is_some());
    }
    assert_eq!(loader.source().reads(), 1);
}

#[test]
fn test_loader_feeds_classifier() -> Result<(), Box<dyn std::error::Error>> {
    let loader = AssetLoader::new(CountingSource::new(false));
    let first = SpamClassifier::builder().with_loader(&loader)?.build()?;
    let second = SpamClassifier::builder().with_loader(&loader)?.build()?;

    assert!(!first.classify("salut, ça va ?", 0.5)?.is_spam());
    assert!(!second.classify("see you at 6", 0.5)?.is_spam());
    assert_eq!(loader.source().reads(), 1);
    Ok(())
}

#[test]
fn test_missing_directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let loader = AssetLoader::from_models_dir(dir.path().join("absent"), RuntimeConfig::default());

    let err = loader.load().unwrap_err();
    assert!(matches!(err, ModelLoadError::NotFound(ref p) if p.ends_with("vectorizer.json")));
    assert!(matches!(loader.state(), LoadState::Failed(_)));
}

#[test]
fn test_missing_model_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("vectorizer.json"), r#"{"vocabulary": {"win": 0}}"#).unwrap();

    let loader = AssetLoader::from_models_dir(dir.path(), RuntimeConfig::default());
    let err = loader.load().unwrap_err();
    assert!(matches!(err, ModelLoadError::NotFound(ref p) if p.ends_with("model.onnx")));
}

#[test]
fn test_corrupt_vectorizer_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path(), "{ this is not json", b"onnx");

    let loader = AssetLoader::from_models_dir(dir.path(), RuntimeConfig::default());
    assert!(matches!(loader.load(), Err(ModelLoadError::InvalidVectorizer(_))));
}

#[test]
fn test_checksum_mismatch_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let vectorizer = r#"{"vocabulary": {"win": 0}}"#;
    write_artifacts(dir.path(), vectorizer, b"onnx");
    fs::write(
        dir.path().join("checksums.json"),
        format!(r#"{{"vectorizer": "{}", "model": "{}"}}"#, sha256(vectorizer.as_bytes()), "0".repeat(64)),
    )
    .unwrap();

    let loader = AssetLoader::from_models_dir(dir.path(), RuntimeConfig::default());
    match loader.load() {
        Err(ModelLoadError::HashMismatch { file_type, actual, .. }) => {
            assert_eq!(file_type, "model");
            assert_eq!(actual, sha256(b"onnx"));
        }
        other => panic!("expected hash mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_checksums_verified_when_matching() {
    let dir = tempfile::tempdir().unwrap();
    let vectorizer = r#"{"vocabulary": {"win": 0}}"#;
    write_artifacts(dir.path(), vectorizer, b"onnx");
    fs::write(
        dir.path().join("checksums.json"),
        format!(r#"{{"vectorizer": "{}", "model": "{}"}}"#, sha256(vectorizer.as_bytes()), sha256(b"onnx")),
    )
    .unwrap();

    assert!(verify_artifacts(&ArtifactPaths::from_dir(dir.path())).is_ok());
}

#[test]
fn test_verification_skipped_without_manifest() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path(), "{}", b"onnx");
    assert!(verify_artifacts(&ArtifactPaths::from_dir(dir.path())).is_ok());
    assert!(verify_artifacts(&ArtifactPaths::new(
        dir.path().join("vectorizer.json"),
        dir.path().join("model.onnx")
    ))
    .is_ok());
}

#[test]
fn test_malformed_manifest_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path(), "{}", b"onnx");
    let paths = ArtifactPaths::from_dir(dir.path());

    for manifest in ["[1, 2, 3]", "{ not json", r#"{"model": 5}"#, r#"{"vectorizer": null}"#] {
        fs::write(dir.path().join("checksums.json"), manifest).unwrap();
        let err = verify_artifacts(&paths).unwrap_err();
        assert!(
            matches!(err, ModelLoadError::InvalidManifest(_)),
            "{} gave {:?}",
            manifest,
            err
        );
    }
}

#[test]
fn test_manifest_ignores_unrelated_entries() {
    let dir = tempfile::tempdir().unwrap();
    let vectorizer = r#"{"vocabulary": {"win": 0}}"#;
    write_artifacts(dir.path(), vectorizer, b"onnx");
    fs::write(
        dir.path().join("checksums.json"),
        format!(
            r#"{{"version": 2, "generated": {{"by": "export.py"}}, "vectorizer": "{}", "model": "{}"}}"#,
            sha256(vectorizer.as_bytes()),
            sha256(b"onnx")
        ),
    )
    .unwrap();

    assert!(verify_artifacts(&ArtifactPaths::from_dir(dir.path())).is_ok());
}

#[test]
fn test_loader_reports_malformed_manifest() {
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path(), r#"{"vocabulary": {"win": 0}}"#, b"onnx");
    fs::write(dir.path().join("checksums.json"), r#"{"model": ["abc"]}"#).unwrap();

    let loader = AssetLoader::from_models_dir(dir.path(), RuntimeConfig::default());
    assert!(matches!(loader.load(), Err(ModelLoadError::InvalidManifest(_))));
    assert!(matches!(loader.state(), LoadState::Failed(ModelLoadError::InvalidManifest(_))));
}
