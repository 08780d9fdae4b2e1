//! The complete vision-transformer classifier.

use crate::config::VitConfig;
use crate::data::ImageBuffer;
use crate::error::{Result, VitError};
use crate::matrix::Matrix;
use crate::models::transformer::TransformerBlock;
use crate::nn::attention::SelfAttention;
use crate::nn::classifier::ClassificationHead;
use crate::nn::feed_forward::FeedForward;
use crate::nn::patch_embedding::PatchEmbedding;
use crate::nn::Module;
use crate::weights::{VitWeights, WeightProvider};
use tracing::{debug, info};

/// Patch embedding, class token, one transformer block and a classification head.
#[derive(Debug, Clone)]
pub struct VisionTransformer {
    config: VitConfig,
    patch_embedding: PatchEmbedding,
    class_token: Vec<f32>,
    block: TransformerBlock,
    head: ClassificationHead,
}

impl VisionTransformer {
    /// Builds the model after checking every weight shape against `config`.
    pub fn new(config: VitConfig, weights: VitWeights) -> Result<Self> {
        weights.validate(&config)?;
        let VitWeights {
            patch_embedding,
            w_q,
            w_k,
            w_v,
            w_ff1,
            w_ff2,
            w_cls,
            class_token,
        } = weights;

        let model = Self {
            config,
            patch_embedding: PatchEmbedding::new(config.patch_size(), patch_embedding),
            class_token,
            block: TransformerBlock::new(
                SelfAttention::new(w_q, w_k, w_v, config.attention_scaling()),
                FeedForward::new(w_ff1, w_ff2),
            ),
            head: ClassificationHead::new(w_cls),
        };
        info!(
            "Initialized VisionTransformer: image_size={}, patch_size={}, d_model={}, num_classes={}, parameters={}",
            config.image_size(),
            config.patch_size(),
            config.d_model(),
            config.num_classes(),
            model.num_parameters()
        );
        Ok(model)
    }

    pub fn from_provider<P: WeightProvider + ?Sized>(config: VitConfig, provider: &P) -> Result<Self> {
        let weights = provider.provide(&config)?;
        Self::new(config, weights)
    }

    pub fn config(&self) -> &VitConfig {
        &self.config
    }

    /// Total number of scalar weights, class token included.
    pub fn num_parameters(&self) -> usize {
        let matrices: usize = self
            .patch_embedding
            .parameters()
            .into_iter()
            .chain(self.block.parameters())
            .chain(self.head.parameters())
            .map(|p| p.rows() * p.cols())
            .sum();
        matrices + self.class_token.len()
    }

    /// Token sequence entering the transformer block: class token at index 0 followed by
    /// the embedded patches, `(num_patches + 1, d_model)`.
    pub fn embed(&self, image: &ImageBuffer) -> Result<Matrix> {
        if image.side() != self.config.image_size() {
            return Err(VitError::shape_mismatch(
                "embed",
                self.config.image_size(),
                image.side(),
            ));
        }
        let tokens = self.patch_embedding.forward(image)?;
        debug!(value = tokens.get(0, 0).unwrap_or_default(), "Token[0] after patch embedding");
        tokens.prepend_row(&self.class_token)
    }

    /// Runs the full forward pass for one image and returns `num_classes` raw logits.
    pub fn forward(&self, image: &ImageBuffer) -> Result<Vec<f32>> {
        let tokens = self.embed(image)?;
        let tokens = self.block.forward(&tokens)?;
        let logits = self.head.forward(&tokens)?;
        debug!(?logits, "Logits");
        Ok(logits)
    }
}
