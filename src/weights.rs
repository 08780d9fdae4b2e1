//! Weight bundles and the providers that build them.

use crate::config::VitConfig;
use crate::error::{Result, VitError};
use crate::matrix::Matrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Every weight the forward pass reads. Immutable once built; the model takes ownership and
/// shares it read-only across all images of a batch.
#[derive(Debug, Clone)]
pub struct VitWeights {
    /// `(patch_dim, d_model)`
    pub patch_embedding: Matrix,
    /// `(d_model, d_model)`
    pub w_q: Matrix,
    pub w_k: Matrix,
    pub w_v: Matrix,
    pub w_ff1: Matrix,
    pub w_ff2: Matrix,
    /// `(d_model, num_classes)`
    pub w_cls: Matrix,
    /// `d_model` values prepended as token 0.
    pub class_token: Vec<f32>,
}

impl VitWeights {
    /// Checks every shape against `config`. Values are not inspected.
    pub fn validate(&self, config: &VitConfig) -> Result<()> {
        let d = config.d_model();
        let expected = [
            ("patch_embedding", &self.patch_embedding, (config.patch_dim(), d)),
            ("w_q", &self.w_q, (d, d)),
            ("w_k", &self.w_k, (d, d)),
            ("w_v", &self.w_v, (d, d)),
            ("w_ff1", &self.w_ff1, (d, d)),
            ("w_ff2", &self.w_ff2, (d, d)),
            ("w_cls", &self.w_cls, (d, config.num_classes())),
        ];
        for (name, matrix, shape) in expected {
            if matrix.shape() != shape {
                return Err(VitError::InvalidWeights {
                    name,
                    expected: shape,
                    actual: matrix.shape(),
                });
            }
        }
        if self.class_token.len() != d {
            return Err(VitError::InvalidWeights {
                name: "class_token",
                expected: (1, d),
                actual: (1, self.class_token.len()),
            });
        }
        Ok(())
    }

    fn build(config: &VitConfig, mut make: impl FnMut(usize, usize) -> Matrix) -> Self {
        let d = config.d_model();
        let patch_embedding = make(config.patch_dim(), d);
        let w_q = make(d, d);
        let w_k = make(d, d);
        let w_v = make(d, d);
        let w_ff1 = make(d, d);
        let w_ff2 = make(d, d);
        let w_cls = make(d, config.num_classes());
        let class_token = make(1, d).to_vec();
        Self {
            patch_embedding,
            w_q,
            w_k,
            w_v,
            w_ff1,
            w_ff2,
            w_cls,
            class_token,
        }
    }
}

/// Supplies a complete weight bundle for a configuration.
pub trait WeightProvider {
    fn provide(&self, config: &VitConfig) -> Result<VitWeights>;
}

/// Every weight and the class token set to the same value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantWeights {
    pub value: f32,
}

impl Default for ConstantWeights {
    fn default() -> Self {
        Self { value: 0.01 }
    }
}

impl WeightProvider for ConstantWeights {
    fn provide(&self, config: &VitConfig) -> Result<VitWeights> {
        info!("Initializing constant weights with value={}", self.value);
        Ok(VitWeights::build(config, |r, c| Matrix::filled(r, c, self.value)))
    }
}

/// Weights drawn uniformly from `[-range, range)`, reproducible for a given seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomWeights {
    pub seed: u64,
    pub range: f32,
}

impl RandomWeights {
    pub fn new(seed: u64) -> Self {
        Self { seed, range: 0.02 }
    }
}

impl WeightProvider for RandomWeights {
    fn provide(&self, config: &VitConfig) -> Result<VitWeights> {
        if !(self.range > 0.0 && self.range.is_finite()) {
            return Err(VitError::Config(format!(
                "random weight range must be positive and finite, got {}",
                self.range
            )));
        }
        info!(
            "Initializing random weights with seed={}, range=±{}",
            self.seed, self.range
        );
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok(VitWeights::build(config, |r, c| {
            Matrix::rand(r, c, -self.range, self.range, &mut rng)
        }))
    }
}
