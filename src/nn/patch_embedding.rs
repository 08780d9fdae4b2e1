//! Patch extraction and embedding for the vision transformer.

use crate::data::ImageBuffer;
use crate::error::{Result, VitError};
use crate::matrix::Matrix;
use crate::nn::linear::Linear;
use crate::nn::Module;
use tracing::debug;

fn check_divisible(side: usize, patch: usize) -> Result<()> {
    if patch == 0 || side % patch != 0 {
        return Err(VitError::ShapeMismatch {
            op: "patchify",
            expected: format!("patch size dividing {}", side),
            actual: patch.to_string(),
        });
    }
    Ok(())
}

/// Slices an image into a `(num_patches, patch² × 3)` matrix.
///
/// Patches are taken row-major over the patch grid (patch-row outer, patch-column inner).
/// Inside a patch, values are flattened row-major over (local row, local column, channel).
pub fn patchify(image: &ImageBuffer, patch: usize) -> Result<Matrix> {
    let side = image.side();
    check_divisible(side, patch)?;

    let grid = side / patch;
    let patch_dim = patch * patch * 3;
    let mut data = Vec::with_capacity(grid * grid * patch_dim);
    for py in (0..side).step_by(patch) {
        for px in (0..side).step_by(patch) {
            for y in 0..patch {
                // One local row of a patch is a contiguous run of `patch * 3` values.
                let start = ((py + y) * side + px) * 3;
                data.extend_from_slice(&image.pixels()[start..start + patch * 3]);
            }
        }
    }
    Matrix::new(data, grid * grid, patch_dim)
}

/// Inverse of [`patchify`]: reassembles the `side × side × 3` buffer from its patches.
pub fn unpatchify(patches: &Matrix, side: usize, patch: usize) -> Result<ImageBuffer> {
    check_divisible(side, patch)?;
    let grid = side / patch;
    let expected = (grid * grid, patch * patch * 3);
    if patches.shape() != expected {
        return Err(VitError::shape_mismatch("unpatchify", expected, patches.shape()));
    }

    let mut pixels = vec![0.0f32; side * side * 3];
    for (idx, row) in patches.data().outer_iter().enumerate() {
        let (py, px) = ((idx / grid) * patch, (idx % grid) * patch);
        for y in 0..patch {
            let start = ((py + y) * side + px) * 3;
            for (dst, src) in pixels[start..start + patch * 3]
                .iter_mut()
                .zip(row.iter().skip(y * patch * 3))
            {
                *dst = *src;
            }
        }
    }
    ImageBuffer::new(side, pixels)
}

/// Turns an image into a sequence of patch tokens in model-width feature space.
#[derive(Debug, Clone)]
pub struct PatchEmbedding {
    patch_size: usize,
    projection: Linear,
}

impl PatchEmbedding {
    /// `weights` has shape `(patch_size² × 3, d_model)`.
    pub fn new(patch_size: usize, weights: Matrix) -> Self {
        debug!(
            "Initializing PatchEmbedding with patch_size={}, d_model={}",
            patch_size,
            weights.cols()
        );
        Self {
            patch_size,
            projection: Linear::new(weights),
        }
    }

    /// Patchifies `image` and projects each patch: `(num_patches, d_model)`.
    pub fn forward(&self, image: &ImageBuffer) -> Result<Matrix> {
        let patches = patchify(image, self.patch_size)?;
        debug!(
            num_patches = patches.rows(),
            first_value = patches.get(0, 0).unwrap_or_default(),
            "Extracted patches"
        );
        self.projection.forward(&patches)
    }

    pub fn parameters(&self) -> Vec<&Matrix> {
        self.projection.parameters()
    }
}
