use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use crate::error::ModelError;
use crate::parsing::record::{Element, Record};

pub mod logreg;

/// A binary classifier scoring one feature vector at a time
pub trait Model {
    /// Probability that `features` belongs to the positive class
    fn predict_proba(&self, features: &ArrayView1<f64>) -> Result<f64, ModelError>;

    /// Probabilities for a set of instances - each instance is a row in "inputs"
    fn predict(&self, inputs: &ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        inputs
            .axis_iter(Axis(0))
            .map(|row| self.predict_proba(&row))
            .collect()
    }
}

/// Feature vector of a decoded image, in row-major pixel order
pub fn features<R: Record>(record: &R) -> Array1<f64> {
    (0..record.len()).map(|i| record.value(i).to_f64()).collect()
}
