use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use ort::session::Session;
use ort::value::{Tensor, ValueType};
use serde::Serialize;

use super::error::ClassifierError;
use super::vectorizer::FeatureVector;
use crate::asset_loader::ModelLoadError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Name skl2onnx gives the class-probability output.
const PROBABILITIES_OUTPUT: &str = "probabilities";

/// Class probabilities `[P(ham), P(spam)]` for one message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbabilityPair {
    pub ham: f32,
    pub spam: f32,
}

impl ProbabilityPair {
    pub fn new(ham: f32, spam: f32) -> Self {
        Self { ham, spam }
    }

    /// Builds a pair from a model output row, which must hold exactly two values.
    pub fn from_slice(values: &[f32]) -> Result<Self, ClassifierError> {
        match values {
            [ham, spam] => Ok(Self::new(*ham, *spam)),
            _ => Err(ClassifierError::PredictionError(format!(
                "Expected 2 class probabilities, got {}",
                values.len()
            ))),
        }
    }

    pub fn as_array(&self) -> [f32; 2] {
        [self.ham, self.spam]
    }
}

/// Scores a feature batch and returns the two class probabilities.
pub trait ProbabilityModel: Send + Sync + fmt::Debug {
    fn predict_probabilities(&self, features: &FeatureVector) -> Result<ProbabilityPair, ClassifierError>;

    /// Feature width the model was exported with, when it declares one.
    fn expected_features(&self) -> Option<usize> {
        None
    }
}

/// A classifier exported to ONNX (e.g. a scikit-learn forest via skl2onnx).
///
/// The model takes one float tensor `[batch, n_features]`. Probabilities are
/// read from the `probabilities` output when it exists, otherwise from the
/// last output.
#[derive(Debug)]
pub struct OnnxModel {
    session: Session,
    model_path: PathBuf,
    input_name: String,
    output_name: String,
    expected_features: Option<usize>,
}

impl OnnxModel {
    pub fn from_file<P: AsRef<Path>>(path: P, config: &RuntimeConfig) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let session = create_session_builder(config)
            .map_err(ModelLoadError::Runtime)?
            .commit_from_file(path)
            .map_err(|e| {
                log::error!("Failed to load model {:?}: {}", path, e);
                ModelLoadError::InvalidModel(format!("Failed to load {}: {}", path.display(), e))
            })?;

        Self::validate_model(&session)?;
        log::info!("Model structure validated successfully");

        let input = &session.inputs[0];
        let expected_features = match &input.input_type {
            ValueType::Tensor { dimensions, .. } => dimensions
                .last()
                .and_then(|&d| usize::try_from(d).ok())
                .filter(|&d| d > 0),
            _ => None,
        };
        let input_name = input.name.clone();
        let output_name = session
            .outputs
            .iter()
            .find(|output| output.name == PROBABILITIES_OUTPUT)
            .or_else(|| session.outputs.last())
            .map(|output| output.name.clone())
            .ok_or_else(|| ModelLoadError::InvalidModel("Model has no outputs".into()))?;

        log::debug!(
            "Model input '{}' ({:?} features), probabilities from '{}'",
            input_name,
            expected_features,
            output_name
        );

        Ok(Self {
            session,
            model_path: path.to_path_buf(),
            input_name,
            output_name,
            expected_features,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Name of the feature-matrix input.
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Name of the output the probabilities are read from.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ModelLoadError> {
        if session.inputs.len() != 1 {
            return Err(ModelLoadError::InvalidModel(format!(
                "Model must have exactly 1 input (the feature matrix), found {}",
                session.inputs.len()
            )));
        }
        if session.outputs.is_empty() {
            return Err(ModelLoadError::InvalidModel(
                "Model must have at least 1 output for class probabilities".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProbabilityModel for OnnxModel {
    fn predict_probabilities(&self, features: &FeatureVector) -> Result<ProbabilityPair, ClassifierError> {
        if let Some(expected) = self.expected_features {
            if features.ncols() != expected {
                return Err(ClassifierError::PredictionError(format!(
                    "Model expects {} features, got {}",
                    expected,
                    features.ncols()
                )));
            }
        }

        let input_dyn = features.clone().into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| ClassifierError::PredictionError(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to run model: {}", e)))?;
        let probabilities = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to extract probabilities: {}", e)))?;

        let row: Vec<f32> = probabilities.iter().copied().collect();
        ProbabilityPair::from_slice(&row)
    }

    fn expected_features(&self) -> Option<usize> {
        self.expected_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_from_slice() {
        let pair = ProbabilityPair::from_slice(&[0.25, 0.75]).unwrap();
        assert_eq!(pair.ham, 0.25);
        assert_eq!(pair.spam, 0.75);
        assert_eq!(pair.as_array(), [0.25, 0.75]);
    }

    #[test]
    fn test_pair_requires_two_values() {
        for values in [&[][..], &[1.0][..], &[0.2, 0.3, 0.5][..]] {
            let err = ProbabilityPair::from_slice(values).unwrap_err();
            assert!(matches!(err, ClassifierError::PredictionError(_)));
        }
    }

    #[test]
    fn test_missing_model_file_is_a_load_error() {
        let result = OnnxModel::from_file("/nonexistent/model.onnx", &RuntimeConfig::default());
        assert!(result.is_err());
    }
}
