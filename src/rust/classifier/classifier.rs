use std::sync::Arc;

use super::decision::{decide, validate_threshold, ClassificationResult};
use super::error::ClassifierError;
use super::model::ProbabilityModel;
use super::normalizer::{is_message_whitespace, normalize};
use super::vectorizer::FeatureVectorizer;

/// Runs one message through the whole inference pipeline.
///
/// The message is rejected with [`ClassifierError::EmptyInput`] when it is
/// empty or made only of whitespace (as [`is_message_whitespace`] defines
/// it); that check looks at the raw text, before normalization. Otherwise the text is normalized, vectorized into a
/// single-row batch, scored, and the spam probability (second class) is
/// compared against `threshold`.
pub fn classify(
    raw: &str,
    threshold: f32,
    vectorizer: &dyn FeatureVectorizer,
    model: &dyn ProbabilityModel,
) -> Result<ClassificationResult, ClassifierError> {
    if raw.chars().all(is_message_whitespace) {
        return Err(ClassifierError::EmptyInput);
    }
    let threshold = validate_threshold(threshold)?;

    let normalized = normalize(raw);
    let features = vectorizer.vectorize(&normalized)?;
    let probabilities = model.predict_probabilities(&features)?;

    let result = decide(probabilities.spam, threshold);
    log::debug!(
        "Classified message ({} chars) as {} with p(spam)={:.4} at threshold {}",
        raw.chars().count(),
        result.label(),
        result.spam_probability(),
        threshold
    );
    Ok(result)
}

/// A thread-safe SMS spam classifier.
///
/// # Thread Safety
///
/// The vectorizer and model are immutable after loading and shared through
/// `Arc`, so a `SpamClassifier` can be cloned cheaply or wrapped in an `Arc`
/// and used from several threads at once.
///
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use spam_detector::{AssetLoader, SpamClassifier};
///
/// let loader = AssetLoader::new_default();
/// let classifier = SpamClassifier::builder()
///     .with_loader(&loader)?
///     .build()?;
///
/// let result = classifier.classify("FÉLICITATIONS vous avez GAGNÉ 1000€!!!", 0.5)?;
/// println!("{} ({:.2}%)", result.label(), result.confidence() * 100.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SpamClassifier {
    pub(crate) vectorizer: Arc<dyn FeatureVectorizer>,
    pub(crate) model: Arc<dyn ProbabilityModel>,
    pub(crate) default_threshold: f32,
    pub(crate) vectorizer_path: Option<String>,
    pub(crate) model_path: Option<String>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<SpamClassifier>();
    }
};

impl SpamClassifier {
    /// Creates a new SpamClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::SpamClassifierBuilder {
        super::builder::SpamClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            vectorizer_path: self.vectorizer_path.clone(),
            model_path: self.model_path.clone(),
            feature_dimension: self.vectorizer.dimension(),
            default_threshold: self.default_threshold,
        }
    }

    /// Classifies `raw` against an explicit threshold in `[0, 1]`.
    ///
    /// # Errors
    /// * `EmptyInput` if the message is empty or whitespace only
    /// * `ValidationError` if the threshold is NaN or outside `[0, 1]`
    /// * `VectorizationError` / `PredictionError` if a model component fails
    pub fn classify(&self, raw: &str, threshold: f32) -> Result<ClassificationResult, ClassifierError> {
        classify(raw, threshold, self.vectorizer.as_ref(), self.model.as_ref())
    }

    /// Classifies `raw` against the threshold chosen at build time.
    pub fn classify_default(&self, raw: &str) -> Result<ClassificationResult, ClassifierError> {
        self.classify(raw, self.default_threshold)
    }

    pub fn default_threshold(&self) -> f32 {
        self.default_threshold
    }
}
