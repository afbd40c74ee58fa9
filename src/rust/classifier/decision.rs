use std::fmt;

use serde::Serialize;

use super::error::ClassifierError;

/// Threshold used when the caller does not pick one.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Ham,
    Spam,
}

impl Label {
    pub fn is_spam(self) -> bool {
        self == Label::Spam
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Ham => write!(f, "HAM"),
            Label::Spam => write!(f, "SPAM"),
        }
    }
}

/// Outcome of one classification request.
///
/// `confidence` is the probability of the chosen label: `spam_probability`
/// for SPAM, `1 - spam_probability` for HAM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationResult {
    label: Label,
    spam_probability: f32,
    confidence: f32,
    threshold_used: f32,
}

impl ClassificationResult {
    pub fn label(&self) -> Label {
        self.label
    }

    pub fn is_spam(&self) -> bool {
        self.label.is_spam()
    }

    pub fn spam_probability(&self) -> f32 {
        self.spam_probability
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn threshold_used(&self) -> f32 {
        self.threshold_used
    }
}

/// Applies `threshold` to a spam probability.
///
/// The label is SPAM when `spam_probability >= threshold`, so a tie goes to
/// SPAM. Inputs are not clamped: `spam_probability` is assumed to lie in
/// `[0, 1]` as the model contract promises.
pub fn decide(spam_probability: f32, threshold: f32) -> ClassificationResult {
    let (label, confidence) = if spam_probability >= threshold {
        (Label::Spam, spam_probability)
    } else {
        (Label::Ham, 1.0 - spam_probability)
    };
    ClassificationResult {
        label,
        spam_probability,
        confidence,
        threshold_used: threshold,
    }
}

/// Accepts any threshold in `[0, 1]`; NaN and out-of-range values are rejected.
pub fn validate_threshold(threshold: f32) -> Result<f32, ClassifierError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ClassifierError::ValidationError(format!(
            "Threshold must be between 0 and 1, got {}",
            threshold
        )))
    }
}
