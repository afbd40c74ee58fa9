//! A bilingual (French/English) SMS spam detector.
//!
//! Messages go through a fixed inference pipeline: normalization, N-gram
//! vectorization, probability scoring by a pre-trained ONNX model, and a
//! threshold decision.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use spam_detector::{AssetLoader, RuntimeConfig, SpamClassifier};
//!
//! // Loads models/vectorizer.json and models/model.onnx once
//! let loader = AssetLoader::from_models_dir("models", RuntimeConfig::default());
//! let classifier = SpamClassifier::builder()
//!     .with_loader(&loader)?
//!     .build()?;
//!
//! let result = classifier.classify("Félicitations, vous avez gagné un lot !", 0.5)?;
//! println!("{}: {:.2}%", result.label(), result.confidence() * 100.0);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The loaded components are immutable, so a classifier can be shared across
//! threads using `Arc`:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use spam_detector::{AssetLoader, SpamClassifier};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let loader = AssetLoader::new_default();
//! let classifier = Arc::new(SpamClassifier::builder().with_loader(&loader)?.build()?);
//!
//! let mut handles = vec![];
//! for text in ["Call me back", "WIN a FREE cruise now"] {
//!     let classifier = Arc::clone(&classifier);
//!     handles.push(thread::spawn(move || {
//!         classifier.classify(text, 0.5).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod asset_loader;
pub mod classifier;
mod runtime;

pub use asset_loader::{
    ArtifactPaths, AssetLoader, AssetSource, FileAssetSource, LoadState, LoadedAssets, ModelLoadError,
};
pub use classifier::{
    classify, decide, normalize, validate_threshold, ClassificationResult, ClassifierError, ClassifierInfo,
    FeatureVector, FeatureVectorizer, Label, NgramVectorizer, OnnxModel, ProbabilityModel, ProbabilityPair,
    SpamClassifier, SpamClassifierBuilder, DEFAULT_THRESHOLD,
};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
