pub mod attention;
pub mod classifier;
pub mod feed_forward;
pub mod linear;
pub mod patch_embedding;

use crate::error::Result;
use crate::matrix::Matrix;

/// A token-sequence transform: `(n, d_in)` in, `(n, d_out)` out.
pub trait Module {
    /// Performs a forward pass on the module.
    fn forward(&self, input: &Matrix) -> Result<Matrix>;

    /// Returns every weight matrix the module reads.
    fn parameters(&self) -> Vec<&Matrix>;

    /// Total number of scalar weights.
    fn num_parameters(&self) -> usize {
        self.parameters()
            .iter()
            .map(|p| p.rows() * p.cols())
            .sum()
    }
}
