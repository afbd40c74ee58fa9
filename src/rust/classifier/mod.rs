mod builder;
#[allow(clippy::module_inception)]
mod classifier;
pub mod decision;
mod error;
pub mod model;
pub mod normalizer;
mod utils;
pub mod vectorizer;

pub use builder::SpamClassifierBuilder;
pub use classifier::{classify, SpamClassifier};
pub use decision::{decide, validate_threshold, ClassificationResult, Label, DEFAULT_THRESHOLD};
pub use error::ClassifierError;
pub use model::{OnnxModel, ProbabilityModel, ProbabilityPair};
pub use normalizer::normalize;
pub use vectorizer::{FeatureVector, FeatureVectorizer, NgramVectorizer};

/// Information about a classifier's configuration
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    pub vectorizer_path: Option<String>,
    pub model_path: Option<String>,
    pub feature_dimension: usize,
    pub default_threshold: f32,
}
