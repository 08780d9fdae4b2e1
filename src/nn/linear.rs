//! A bias-free linear projection.

use crate::error::Result;
use crate::matrix::Matrix;
use crate::nn::Module;
use tracing::debug;

/// Maps `(n, in_features)` inputs to `(n, out_features)` by right-multiplying with a fixed
/// weight matrix.
#[derive(Debug, Clone)]
pub struct Linear {
    weights: Matrix,
}

impl Linear {
    pub fn new(weights: Matrix) -> Self {
        debug!(
            "Initializing Linear layer with in_features={}, out_features={}",
            weights.rows(),
            weights.cols()
        );
        Self { weights }
    }

    pub fn in_features(&self) -> usize {
        self.weights.rows()
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }
}

impl Module for Linear {
    fn forward(&self, input: &Matrix) -> Result<Matrix> {
        input.matmul(&self.weights)
    }

    fn parameters(&self) -> Vec<&Matrix> {
        vec![&self.weights]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projects_feature_width() {
        let layer = Linear::new(Matrix::filled(3, 5, 0.5));
        let out = layer.forward(&Matrix::filled(2, 3, 2.0)).unwrap();
        assert_eq!(layer.in_features(), 3);
        assert_eq!(out.shape(), (2, 5));
        assert!(out.to_vec().iter().all(|&v| v == 3.0));
        assert_eq!(layer.num_parameters(), 15);
    }

    #[test]
    fn test_rejects_wrong_input_width() {
        let layer = Linear::new(Matrix::zeros(3, 5));
        assert!(layer.forward(&Matrix::zeros(2, 4)).is_err());
    }
}
