//! Classification head.

use crate::error::{Result, VitError};
use crate::matrix::Matrix;
use crate::nn::linear::Linear;
use crate::nn::Module;
use ndarray::Axis;
use tracing::debug;

/// Reads the class token (index 0) of the final token sequence and projects it to
/// `num_classes` raw logits. Other tokens are ignored.
#[derive(Debug, Clone)]
pub struct ClassificationHead {
    projection: Linear,
}

impl ClassificationHead {
    /// `weights` has shape `(d_model, num_classes)`.
    pub fn new(weights: Matrix) -> Self {
        debug!("Initializing ClassificationHead with num_classes={}", weights.cols());
        Self {
            projection: Linear::new(weights),
        }
    }

    pub fn forward(&self, tokens: &Matrix) -> Result<Vec<f32>> {
        if tokens.rows() == 0 {
            return Err(VitError::shape_mismatch(
                "classify",
                (1, self.projection.in_features()),
                tokens.shape(),
            ));
        }
        let pooled = Matrix::from_data(tokens.row(0).to_owned().insert_axis(Axis(0)));
        Ok(self.projection.forward(&pooled)?.to_vec())
    }

    pub fn parameters(&self) -> Vec<&Matrix> {
        self.projection.parameters()
    }
}

/// Softmax over a logit vector. Callers use this to turn logits into class probabilities;
/// the head itself returns raw scores.
pub fn softmax_probabilities(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

/// Index of the largest logit; the first one wins ties.
pub fn argmax(logits: &[f32]) -> Option<usize> {
    logits
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
