//! Model configuration.

use crate::error::{Result, VitError};
use serde::Serialize;

/// Scaling applied to raw attention scores before the softmax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionScaling {
    /// Raw query/key dot products.
    #[default]
    None,
    /// Divide scores by `√d_model`.
    InverseSqrtDim,
}

/// Structural constants of the classifier.
///
/// Fields are private so a `VitConfig` always satisfies `image_size % patch_size == 0`;
/// build one with [`VitConfig::new`] or start from [`VitConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VitConfig {
    image_size: usize,
    patch_size: usize,
    d_model: usize,
    num_classes: usize,
    attention_scaling: AttentionScaling,
}

impl Default for VitConfig {
    fn default() -> Self {
        Self {
            image_size: 32,
            patch_size: 4,
            d_model: 64,
            num_classes: 2,
            attention_scaling: AttentionScaling::None,
        }
    }
}

impl VitConfig {
    pub fn new(image_size: usize, patch_size: usize, d_model: usize, num_classes: usize) -> Result<Self> {
        for (name, value) in [
            ("image_size", image_size),
            ("patch_size", patch_size),
            ("d_model", d_model),
            ("num_classes", num_classes),
        ] {
            if value == 0 {
                return Err(VitError::Config(format!("{} must be positive", name)));
            }
        }
        if image_size % patch_size != 0 {
            return Err(VitError::Config(format!(
                "patch size {} does not evenly divide image size {}",
                patch_size, image_size
            )));
        }
        Ok(Self {
            image_size,
            patch_size,
            d_model,
            num_classes,
            attention_scaling: AttentionScaling::None,
        })
    }

    pub fn with_attention_scaling(mut self, scaling: AttentionScaling) -> Self {
        self.attention_scaling = scaling;
        self
    }

    pub fn image_size(&self) -> usize {
        self.image_size
    }
    pub fn patch_size(&self) -> usize {
        self.patch_size
    }
    pub fn d_model(&self) -> usize {
        self.d_model
    }
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
    pub fn attention_scaling(&self) -> AttentionScaling {
        self.attention_scaling
    }

    /// Patches per side of the patch grid.
    pub fn grid_size(&self) -> usize {
        self.image_size / self.patch_size
    }

    /// `(image_size / patch_size)²`
    pub fn num_patches(&self) -> usize {
        self.grid_size() * self.grid_size()
    }

    /// `patch_size² × 3`
    pub fn patch_dim(&self) -> usize {
        self.patch_size * self.patch_size * 3
    }

    /// Patches plus the class token.
    pub fn num_tokens(&self) -> usize {
        self.num_patches() + 1
    }

    /// Length of a flattened `image_size × image_size × 3` pixel buffer.
    pub fn pixel_len(&self) -> usize {
        self.image_size * self.image_size * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_derived_sizes() {
        let config = VitConfig::default();
        assert_eq!(config.num_patches(), 64);
        assert_eq!(config.patch_dim(), 48);
        assert_eq!(config.num_tokens(), 65);
        assert_eq!(config.pixel_len(), 32 * 32 * 3);
        assert_eq!(config.attention_scaling(), AttentionScaling::None);
    }

    #[test]
    fn test_rejects_non_dividing_patch() {
        let err = VitConfig::new(32, 5, 64, 2).unwrap_err();
        assert!(matches!(err, VitError::Config(_)));
        assert!(err.to_string().contains("does not evenly divide"));
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(VitConfig::new(32, 0, 64, 2).is_err());
        assert!(VitConfig::new(32, 4, 0, 2).is_err());
        assert!(VitConfig::new(32, 4, 64, 0).is_err());
    }

    #[test]
    fn test_serializes_scaling_as_snake_case() {
        let config = VitConfig::default().with_attention_scaling(AttentionScaling::InverseSqrtDim);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"patch_size\":4"));
        assert!(json.contains("\"attention_scaling\":\"inverse_sqrt_dim\""));
    }

    #[test]
    fn test_new_matches_default() {
        assert_eq!(VitConfig::new(32, 4, 64, 2).unwrap(), VitConfig::default());
    }
}
