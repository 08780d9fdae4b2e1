//! Error types for the forward pass and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VitError {
    #[error("shape mismatch in {op}: expected {expected}, got {actual}")]
    ShapeMismatch {
        op: &'static str,
        expected: String,
        actual: String,
    },

    #[error("failed to decode image {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("inconsistent configuration: {0}")]
    Config(String),

    #[error("invalid weight `{name}`: expected shape {expected:?}, got {actual:?}")]
    InvalidWeights {
        name: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

pub type Result<T> = std::result::Result<T, VitError>;

impl VitError {
    pub(crate) fn shape_mismatch(
        op: &'static str,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        VitError::ShapeMismatch {
            op,
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        VitError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
