//! Batch orchestration: decode each image, run the forward pass, collect per-image results.

use crate::data::{load_batch_images, ImageDecoder, ImageFailure};
use crate::models::vit::VisionTransformer;
use std::path::{Path, PathBuf};
use tracing::info;

/// Logits for one successfully classified image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLogits {
    pub path: PathBuf,
    pub logits: Vec<f32>,
}

/// Outcome of a batch. `logits` keeps input order; images that failed to decode or whose
/// forward pass hit a shape error are listed in `failures` instead.
#[derive(Debug, Default)]
pub struct BatchOutput {
    pub logits: Vec<ImageLogits>,
    pub failures: Vec<ImageFailure>,
}

impl BatchOutput {
    pub fn is_empty(&self) -> bool {
        self.logits.is_empty() && self.failures.is_empty()
    }
}

/// Runs the classifier over every path. A failing image never aborts the batch.
pub fn classify_batch<D, P>(model: &VisionTransformer, decoder: &D, paths: &[P]) -> BatchOutput
where
    D: ImageDecoder + ?Sized,
    P: AsRef<Path>,
{
    let (images, mut failures) = load_batch_images(decoder, paths);
    info!(
        "Loaded {} of {} images ({} failed)",
        images.len(),
        paths.len(),
        failures.len()
    );

    let mut logits = Vec::with_capacity(images.len());
    for (path, image) in images {
        match model.forward(&image) {
            Ok(values) => logits.push(ImageLogits { path, logits: values }),
            Err(error) => failures.push(ImageFailure { path, error }),
        }
    }
    BatchOutput { logits, failures }
}
