//! A position-wise feed-forward network with a residual connection.

use crate::error::{Result, VitError};
use crate::matrix::Matrix;
use crate::nn::linear::Linear;
use crate::nn::Module;
use tracing::debug;

/// Computes `X + relu(X·W1)·W2`. No biases and no normalization.
#[derive(Debug, Clone)]
pub struct FeedForward {
    linear1: Linear,
    linear2: Linear,
}

impl FeedForward {
    pub fn new(w1: Matrix, w2: Matrix) -> Self {
        debug!("Initializing FeedForward network with d_model={}", w1.rows());
        Self {
            linear1: Linear::new(w1),
            linear2: Linear::new(w2),
        }
    }
}

impl Module for FeedForward {
    fn forward(&self, input: &Matrix) -> Result<Matrix> {
        let x = self.linear1.forward(input)?;
        let x = x.relu();
        let x = self.linear2.forward(&x)?;

        if x.shape() != input.shape() {
            return Err(VitError::shape_mismatch("residual_add", input.shape(), x.shape()));
        }
        input.add(&x)
    }

    fn parameters(&self) -> Vec<&Matrix> {
        vec![self.linear1.weights(), self.linear2.weights()]
    }
}
