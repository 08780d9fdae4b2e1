//! Image loading: decoding files into normalized pixel buffers.

use crate::config::VitConfig;
use crate::error::{Result, VitError};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A flattened `side × side × 3` buffer of values in `[0, 1]`, row-major by
/// (row, column, channel).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    side: usize,
    pixels: Vec<f32>,
}

impl ImageBuffer {
    pub fn new(side: usize, pixels: Vec<f32>) -> Result<Self> {
        if pixels.len() != side * side * 3 {
            return Err(VitError::shape_mismatch(
                "image_buffer",
                side * side * 3,
                pixels.len(),
            ));
        }
        Ok(Self { side, pixels })
    }

    /// Builds a buffer from 8-bit RGB bytes, normalizing each by `/255`.
    pub fn from_rgb_bytes(side: usize, bytes: &[u8]) -> Result<Self> {
        Self::new(side, bytes.iter().map(|&b| b as f32 / 255.0).collect())
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Value at `(row, col, channel)`, or `None` outside the image.
    pub fn at(&self, row: usize, col: usize, channel: usize) -> Option<f32> {
        if row >= self.side || col >= self.side || channel >= 3 {
            return None;
        }
        self.pixels.get((row * self.side + col) * 3 + channel).copied()
    }
}

/// Produces pixel buffers from image paths.
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<ImageBuffer>;
}

/// What to do with images whose dimensions differ from the configured side length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizePolicy {
    /// Fail with a decode error.
    #[default]
    Reject,
    /// Resize to `side × side`, ignoring aspect ratio.
    Stretch,
}

/// Decodes image files (PNG, JPEG, PNM, BMP) into 3-channel normalized buffers.
/// Grayscale sources have their single channel replicated.
#[derive(Debug, Clone)]
pub struct FileImageDecoder {
    side: usize,
    resize: ResizePolicy,
}

impl FileImageDecoder {
    pub fn new(config: &VitConfig) -> Self {
        Self {
            side: config.image_size(),
            resize: ResizePolicy::default(),
        }
    }

    pub fn with_resize(mut self, resize: ResizePolicy) -> Self {
        self.resize = resize;
        self
    }
}

impl ImageDecoder for FileImageDecoder {
    fn decode(&self, path: &Path) -> Result<ImageBuffer> {
        let img = image::open(path).map_err(|e| VitError::decode(path, e))?;
        let mut rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let side = self.side as u32;

        if (width, height) != (side, side) {
            match self.resize {
                ResizePolicy::Reject => {
                    return Err(VitError::decode(
                        path,
                        format!("expected {}x{} pixels, got {}x{}", side, side, width, height),
                    ));
                }
                ResizePolicy::Stretch => {
                    debug!("Resizing {} from {}x{} to {}x{}", path.display(), width, height, side, side);
                    rgb = image::imageops::resize(&rgb, side, side, FilterType::Triangle);
                }
            }
        }

        ImageBuffer::from_rgb_bytes(self.side, rgb.as_raw())
            .map_err(|e| VitError::decode(path, e))
    }
}

/// An image that failed to load, with the reason.
#[derive(Debug)]
pub struct ImageFailure {
    pub path: PathBuf,
    pub error: VitError,
}

/// Decodes every path, keeping the ones that succeed in input order and collecting the rest
/// as failures instead of aborting.
pub fn load_batch_images<D, P>(decoder: &D, paths: &[P]) -> (Vec<(PathBuf, ImageBuffer)>, Vec<ImageFailure>)
where
    D: ImageDecoder + ?Sized,
    P: AsRef<Path>,
{
    let mut images = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match decoder.decode(path) {
            Ok(img) => images.push((path.to_path_buf(), img)),
            Err(error) => failures.push(ImageFailure {
                path: path.to_path_buf(),
                error,
            }),
        }
    }
    (images, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_image_buffer_rejects_wrong_length() {
        assert!(ImageBuffer::new(2, vec![0.0; 11]).is_err());
        assert!(ImageBuffer::new(2, vec![0.0; 12]).is_ok());
    }

    #[test]
    fn test_from_rgb_bytes_normalizes() {
        let buf = ImageBuffer::from_rgb_bytes(1, &[0, 255, 51]).unwrap();
        assert_eq!(buf.pixels(), &[0.0, 1.0, 0.2]);
    }

    #[test]
    fn test_at_is_row_major_by_channel() {
        let pixels: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let buf = ImageBuffer::new(2, pixels).unwrap();
        assert_eq!(buf.at(0, 0, 0), Some(0.0));
        assert_eq!(buf.at(0, 1, 2), Some(5.0));
        assert_eq!(buf.at(1, 0, 1), Some(7.0));
    }

    #[test]
    fn test_at_out_of_range_is_none() {
        let buf = ImageBuffer::new(2, vec![0.5; 12]).unwrap();
        assert_eq!(buf.at(1, 1, 2), Some(0.5));
        assert_eq!(buf.at(2, 0, 0), None);
        // Column overflow must not wrap into the next row.
        assert_eq!(buf.at(0, 2, 0), None);
        assert_eq!(buf.at(0, 0, 3), None);
    }

    #[test]
    fn test_decode_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])).save(&path).unwrap();

        let config = VitConfig::new(4, 2, 8, 2).unwrap();
        let buf = FileImageDecoder::new(&config).decode(&path).unwrap();
        assert_eq!(buf.side(), 4);
        assert_eq!(buf.at(3, 3, 0), Some(1.0));
        assert_eq!(buf.at(3, 3, 1), Some(0.0));
    }

    #[test]
    fn test_decode_grayscale_replicates_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.pgm");
        GrayImage::from_pixel(4, 4, Luma([255])).save(&path).unwrap();

        let config = VitConfig::new(4, 2, 8, 2).unwrap();
        let buf = FileImageDecoder::new(&config).decode(&path).unwrap();
        assert!(buf.pixels().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_dimension_mismatch_rejected_or_resized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        RgbImage::from_pixel(8, 6, Rgb([0, 255, 0])).save(&path).unwrap();

        let config = VitConfig::new(4, 2, 8, 2).unwrap();
        let err = FileImageDecoder::new(&config).decode(&path).unwrap_err();
        assert!(matches!(err, VitError::Decode { .. }));
        assert!(err.to_string().contains("8x6"));

        let buf = FileImageDecoder::new(&config)
            .with_resize(ResizePolicy::Stretch)
            .decode(&path)
            .unwrap();
        assert_eq!(buf.pixels().len(), 4 * 4 * 3);
        assert_eq!(buf.at(2, 2, 1), Some(1.0));
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let decoder = FileImageDecoder::new(&VitConfig::default());
        let err = decoder.decode(Path::new("does/not/exist.jpg")).unwrap_err();
        match err {
            VitError::Decode { path, .. } => assert_eq!(path, PathBuf::from("does/not/exist.jpg")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_batch_images_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])).save(&good).unwrap();
        let bad = dir.path().join("missing.png");

        let config = VitConfig::new(4, 2, 8, 2).unwrap();
        let decoder = FileImageDecoder::new(&config);
        let (images, failures) = load_batch_images(&decoder, &[&good, &bad, &good]);
        assert_eq!(images.len(), 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, bad);
    }
}
