//! The transformer block.

use crate::error::Result;
use crate::matrix::Matrix;
use crate::nn::attention::SelfAttention;
use crate::nn::feed_forward::FeedForward;
use crate::nn::Module;
use tracing::debug;

/// Attention with a residual connection, then the residual feed-forward network:
///
/// ```text
/// x'  = x + Attention(x)
/// x'' = FeedForward(x')   // FeedForward adds its own residual
/// ```
#[derive(Debug, Clone)]
pub struct TransformerBlock {
    attention: SelfAttention,
    feed_forward: FeedForward,
}

impl TransformerBlock {
    pub fn new(attention: SelfAttention, feed_forward: FeedForward) -> Self {
        Self {
            attention,
            feed_forward,
        }
    }
}

impl Module for TransformerBlock {
    fn forward(&self, input: &Matrix) -> Result<Matrix> {
        let attn_out = self.attention.forward(input)?;
        debug!(value = attn_out.get(0, 0).unwrap_or_default(), "Token[0] after attention");

        let x = input.add(&attn_out)?;
        debug!(value = x.get(0, 0).unwrap_or_default(), "Token[0] after residual");

        let x = self.feed_forward.forward(&x)?;
        debug!(value = x.get(0, 0).unwrap_or_default(), "Token[0] after feed-forward");
        Ok(x)
    }

    fn parameters(&self) -> Vec<&Matrix> {
        let mut params = self.attention.parameters();
        params.extend(self.feed_forward.parameters());
        params
    }
}
