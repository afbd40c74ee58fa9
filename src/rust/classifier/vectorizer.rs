use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use serde::Deserialize;

use super::error::ClassifierError;
use super::normalizer::is_message_whitespace;
use super::utils::{collapse_whitespace_runs, l1_normalize_vector, normalize_vector};
use crate::asset_loader::ModelLoadError;

/// A single-row batch of features, shape `[1, dimension]`.
pub type FeatureVector = Array2<f32>;

/// Turns normalized text into a fixed-width feature vector.
///
/// Implementations are opaque to the pipeline: it only relies on
/// `vectorize` returning a `[1, dimension()]` batch.
pub trait FeatureVectorizer: Send + Sync + fmt::Debug {
    /// Width of every vector this vectorizer produces.
    fn dimension(&self) -> usize;

    fn vectorize(&self, text: &str) -> Result<FeatureVector, ClassifierError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    #[default]
    Word,
    Char,
    CharWb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

/// On-disk form of a fitted scikit-learn `CountVectorizer` / `TfidfVectorizer`.
#[derive(Debug, Deserialize)]
struct VectorizerFile {
    vocabulary: HashMap<String, usize>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    analyzer: Analyzer,
    #[serde(default = "default_true")]
    lowercase: bool,
    #[serde(default)]
    idf: Option<Vec<f32>>,
    #[serde(default)]
    norm: Option<Norm>,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    binary: bool,
}

/// Bag-of-N-grams vectorizer with optional TF-IDF weighting.
#[derive(Debug, Clone)]
pub struct NgramVectorizer {
    vocabulary: HashMap<String, usize>,
    ngram_range: (usize, usize),
    analyzer: Analyzer,
    lowercase: bool,
    idf: Option<Array1<f32>>,
    norm: Option<Norm>,
    sublinear_tf: bool,
    binary: bool,
}

impl NgramVectorizer {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| ModelLoadError::io(path, e))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ModelLoadError> {
        let file: VectorizerFile = serde_json::from_str(raw)
            .map_err(|e| ModelLoadError::InvalidVectorizer(e.to_string()))?;
        Self::validate(&file)?;

        Ok(Self {
            vocabulary: file.vocabulary,
            ngram_range: file.ngram_range,
            analyzer: file.analyzer,
            lowercase: file.lowercase,
            idf: file.idf.map(Array1::from),
            norm: file.norm,
            sublinear_tf: file.sublinear_tf,
            binary: file.binary,
        })
    }

    fn validate(file: &VectorizerFile) -> Result<(), ModelLoadError> {
        let size = file.vocabulary.len();
        if size == 0 {
            return Err(ModelLoadError::InvalidVectorizer("Vocabulary is empty".into()));
        }
        let (min_n, max_n) = file.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ModelLoadError::InvalidVectorizer(format!(
                "Invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }
        if let Some((term, &index)) = file.vocabulary.iter().find(|(_, index)| **index >= size) {
            return Err(ModelLoadError::InvalidVectorizer(format!(
                "Term '{}' has column {} outside a vocabulary of {}",
                term, index, size
            )));
        }
        if let Some(idf) = &file.idf {
            if idf.len() != size {
                return Err(ModelLoadError::InvalidVectorizer(format!(
                    "idf has {} weights for a vocabulary of {}",
                    idf.len(),
                    size
                )));
            }
        }
        Ok(())
    }

    pub fn analyzer(&self) -> Analyzer {
        self.analyzer
    }

    /// Splits text into the terms that are looked up in the vocabulary.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase { text.to_lowercase() } else { text.to_string() };
        match self.analyzer {
            Analyzer::Word => word_ngrams(&tokenize_words(&text), self.ngram_range),
            Analyzer::Char => char_ngrams(&text, self.ngram_range),
            Analyzer::CharWb => char_wb_ngrams(&text, self.ngram_range),
        }
    }

    fn term_counts(&self, text: &str) -> Array1<f32> {
        let mut counts = Array1::<f32>::zeros(self.vocabulary.len());
        for term in self.analyze(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                counts[column] += 1.0;
            }
        }
        counts
    }
}

impl FeatureVectorizer for NgramVectorizer {
    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    fn vectorize(&self, text: &str) -> Result<FeatureVector, ClassifierError> {
        let mut row = self.term_counts(text);

        if self.binary {
            row.mapv_inplace(|c| if c > 0.0 { 1.0 } else { 0.0 });
        }
        if self.sublinear_tf {
            row.mapv_inplace(|c| if c > 0.0 { 1.0 + c.ln() } else { 0.0 });
        }
        if let Some(idf) = &self.idf {
            row *= idf;
        }
        let row = match self.norm {
            Some(Norm::L2) => normalize_vector(&row),
            Some(Norm::L1) => l1_normalize_vector(&row),
            None => row,
        };

        log::trace!("Vectorized {} chars into {} features", text.len(), row.len());
        Ok(row.insert_axis(Axis(0)))
    }
}

/// Maximal runs of two or more word characters (letters, digits, `_`).
fn tokenize_words(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().nth(1).is_some())
        .collect()
}

fn word_ngrams(tokens: &[&str], (min_n, max_n): (usize, usize)) -> Vec<String> {
    let mut terms = Vec::new();
    for n in min_n..=max_n.min(tokens.len()) {
        terms.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    terms
}

fn char_ngrams(text: &str, (min_n, max_n): (usize, usize)) -> Vec<String> {
    let chars: Vec<char> = collapse_whitespace_runs(text).chars().collect();
    let mut terms = Vec::new();
    for n in min_n..=max_n.min(chars.len()) {
        terms.extend(chars.windows(n).map(|window| window.iter().collect::<String>()));
    }
    terms
}

/// Character n-grams taken only inside words, each word padded with a space.
/// A word whose padded form is no longer than `n` yields it once and stops the
/// larger sizes for that word.
fn char_wb_ngrams(text: &str, (min_n, max_n): (usize, usize)) -> Vec<String> {
    let mut terms = Vec::new();
    for word in text.split(is_message_whitespace).filter(|word| !word.is_empty()) {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for n in min_n..=max_n {
            if padded.len() <= n {
                terms.push(padded.iter().collect());
                break;
            }
            terms.extend(padded.windows(n).map(|window| window.iter().collect::<String>()));
        }
    }
    terms
}
