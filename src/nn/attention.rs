//! Single-head self-attention.

use crate::config::AttentionScaling;
use crate::error::Result;
use crate::matrix::Matrix;
use crate::nn::linear::Linear;
use crate::nn::Module;
use tracing::debug;

/// Self-attention over a token sequence. Every token attends to every token, itself
/// included; there is no mask and no output projection.
#[derive(Debug, Clone)]
pub struct SelfAttention {
    w_q: Linear,
    w_k: Linear,
    w_v: Linear,
    scaling: AttentionScaling,
}

impl SelfAttention {
    /// Each weight matrix is `(d_model, d_model)`.
    pub fn new(w_q: Matrix, w_k: Matrix, w_v: Matrix, scaling: AttentionScaling) -> Self {
        debug!("Initializing SelfAttention with d_model={}, scaling={:?}", w_q.rows(), scaling);
        Self {
            w_q: Linear::new(w_q),
            w_k: Linear::new(w_k),
            w_v: Linear::new(w_v),
            scaling,
        }
    }

    /// Row-stochastic `(n, n)` matrix of attention weights for `input`.
    pub fn attention_weights(&self, input: &Matrix) -> Result<Matrix> {
        let q = self.w_q.forward(input)?;
        let k = self.w_k.forward(input)?;
        self.weights_from(&q, &k)
    }

    fn weights_from(&self, q: &Matrix, k: &Matrix) -> Result<Matrix> {
        // S[i][j] = q_i · k_j
        let scores = q.matmul_transposed(k)?;
        let scores = match self.scaling {
            AttentionScaling::None => scores,
            AttentionScaling::InverseSqrtDim => scores.scale(1.0 / (q.cols() as f32).sqrt()),
        };
        Ok(scores.softmax_rows())
    }
}

impl Module for SelfAttention {
    fn forward(&self, input: &Matrix) -> Result<Matrix> {
        let q = self.w_q.forward(input)?;
        let k = self.w_k.forward(input)?;
        let v = self.w_v.forward(input)?;

        // Each output row is a convex combination of the rows of V.
        self.weights_from(&q, &k)?.matmul(&v)
    }

    fn parameters(&self) -> Vec<&Matrix> {
        vec![self.w_q.weights(), self.w_k.weights(), self.w_v.weights()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> Matrix {
        Matrix::from_rows(vec![
            vec![0.5, -1.0, 2.0],
            vec![1.5, 0.0, -0.5],
            vec![-2.0, 1.0, 0.25],
            vec![0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    fn attention(scaling: AttentionScaling) -> SelfAttention {
        SelfAttention::new(
            Matrix::identity(3),
            Matrix::identity(3).scale(2.0),
            Matrix::identity(3),
            scaling,
        )
    }

    #[test]
    fn test_weights_are_row_stochastic() {
        let w = attention(AttentionScaling::None).attention_weights(&tokens()).unwrap();
        assert_eq!(w.shape(), (4, 4));
        for row in w.data().outer_iter() {
            assert!((row.sum() - 1.0).abs() < 1e-5);
            assert!(row.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn test_scores_are_unscaled_by_default() {
        // Q = X, K = 2X, so S[i][j] = 2 * x_i · x_j; the last token is all zeros so its
        // row of scores is uniform.
        let x = tokens();
        let w = attention(AttentionScaling::None).attention_weights(&x).unwrap();
        let s01 = 2.0f32 * (0.5 * 1.5 + 0.0 + 2.0 * -0.5);
        let s00 = 2.0f32 * (0.25 + 1.0 + 4.0);
        let s02 = 2.0f32 * (-1.0 - 1.0 + 0.5);
        let s03 = 0.0f32;
        let denom = s00.exp() + s01.exp() + s02.exp() + s03.exp();
        assert!((w.get(0, 1).unwrap() - s01.exp() / denom).abs() < 1e-6);
        for j in 0..4 {
            assert!((w.get(3, j).unwrap() - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_inverse_sqrt_scaling_flattens_weights() {
        let x = tokens();
        let raw = attention(AttentionScaling::None).attention_weights(&x).unwrap();
        let scaled = attention(AttentionScaling::InverseSqrtDim).attention_weights(&x).unwrap();
        // Token 0 attends mostly to itself; scaling the scores down softens that peak.
        assert!(scaled.get(0, 0).unwrap() < raw.get(0, 0).unwrap());
    }

    #[test]
    fn test_output_is_convex_combination_of_values() {
        let x = tokens();
        let attn = attention(AttentionScaling::None);
        let out = attn.forward(&x).unwrap();
        assert_eq!(out.shape(), x.shape());
        // V = X, so each output column lies between that column's min and max.
        for t in 0..3 {
            let col: Vec<f32> = (0..4).map(|i| x.get(i, t).unwrap()).collect();
            let lo = col.iter().cloned().fold(f32::INFINITY, f32::min);
            let hi = col.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            for i in 0..4 {
                let v = out.get(i, t).unwrap();
                assert!(v >= lo - 1e-5 && v <= hi + 1e-5);
            }
        }
    }

    #[test]
    fn test_identical_tokens_give_identical_outputs() {
        let x = Matrix::filled(5, 3, 0.7);
        let out = attention(AttentionScaling::None).forward(&x).unwrap();
        for v in out.to_vec() {
            assert!((v - 0.7).abs() < 1e-6);
        }
    }
}
