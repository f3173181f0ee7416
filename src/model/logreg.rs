use ndarray::{Array1, ArrayView1};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::Model;
use crate::error::ModelError;

/// Logistic regression: a single linear layer followed by a sigmoid
#[derive(Debug, Clone, PartialEq)]
pub struct LogregClassifier {
    pub coef: Array1<f64>,
    pub intercept: f64,
}

impl LogregClassifier {
    pub fn new(coef: Array1<f64>, intercept: f64) -> LogregClassifier {
        LogregClassifier { coef, intercept }
    }

    /// Build from a list of the form <intercept> <w1> <w2> ...
    pub fn from_coefficients(values: &[f64]) -> Result<LogregClassifier, ModelError> {
        match values.split_first() {
            Some((intercept, coef)) => Ok(LogregClassifier::new(
                Array1::from(coef.to_vec()),
                *intercept,
            )),
            None => Err(ModelError::InvalidWeights("no coefficients".to_string())),
        }
    }

    /// Load weights in the JSON format written for single layer models:
    /// {"W0": [w1, w2, ...], "b0": [intercept]}
    pub fn from_json(contents: &str) -> Result<LogregClassifier, ModelError> {
        let data =
            json::parse(contents).map_err(|e| ModelError::InvalidWeights(e.to_string()))?;

        if !data["W0"].is_array() {
            return Err(ModelError::InvalidWeights("missing W0 array".to_string()));
        }

        let coef = data["W0"]
            .members()
            .map(|w| {
                w.as_f64()
                    .ok_or_else(|| ModelError::InvalidWeights(format!("bad weight {}", w)))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        let intercept = match data["b0"].members().next() {
            Some(b) => b
                .as_f64()
                .ok_or_else(|| ModelError::InvalidWeights(format!("bad bias {}", b)))?,
            None if data["b0"].is_null() => 0f64,
            None => data["b0"].as_f64().ok_or_else(|| {
                ModelError::InvalidWeights(format!("bad bias {}", data["b0"]))
            })?,
        };

        Ok(LogregClassifier::new(Array1::from(coef), intercept))
    }

    /// Load whitespace separated coefficients, intercept first
    pub fn from_text(contents: &str) -> Result<LogregClassifier, ModelError> {
        let values = contents
            .split_whitespace()
            .map(|x| {
                parse_value::<f64>(x)
                    .ok_or_else(|| ModelError::InvalidWeights(format!("bad coefficient {}", x)))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        LogregClassifier::from_coefficients(&values)
    }

    /// Load weights from a file, JSON if the extension is .json and text otherwise
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LogregClassifier, ModelError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let model = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => LogregClassifier::from_json(&contents)?,
            _ => LogregClassifier::from_text(&contents)?,
        };
        debug!(features = model.coef.len(), "Loaded logistic regression weights");

        Ok(model)
    }

    pub fn num_features(&self) -> usize {
        self.coef.len()
    }
}

impl Model for LogregClassifier {
    fn predict_proba(&self, features: &ArrayView1<f64>) -> Result<f64, ModelError> {
        if features.len() != self.coef.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.coef.len(),
                actual: features.len(),
            });
        }

        Ok(sigmoid(self.intercept + features.dot(&self.coef)))
    }
}

fn sigmoid(z: f64) -> f64 {
    (1f64 + (-z).exp()).recip()
}

fn parse_value<T: FromStr>(s: &str) -> Option<T> {
    T::from_str(s).ok()
}
