use ort::Error as OrtError;
use std::fmt;

use crate::asset_loader::ModelLoadError;

/// Represents the different types of errors that can occur while classifying a message.
#[derive(Debug, Clone)]
pub enum ClassifierError {
    /// The message was empty or contained only whitespace
    EmptyInput,
    /// The vectorizer could not turn the text into features
    VectorizationError(String),
    /// The model could not score the feature vector
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// Error occurred during the build phase
    BuildError(String),
    /// The model artifacts could not be loaded
    ModelLoad(ModelLoadError),
}

impl ClassifierError {
    /// True for errors the user can fix by changing the input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::ValidationError(_))
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Input message cannot be empty"),
            Self::VectorizationError(msg) => write!(f, "Vectorization error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::ModelLoad(err) => write!(f, "Model load error: {}", err),
        }
    }
}

impl std::error::Error for ClassifierError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ModelLoad(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelLoadError> for ClassifierError {
    fn from(err: ModelLoadError) -> Self {
        ClassifierError::ModelLoad(err)
    }
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::PredictionError(err.to_string())
    }
}
