use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the adversarial pipeline.
///
/// Nothing in the crate retries: the first error aborts the run and is returned
/// to the caller as-is.
#[derive(Error, Debug)]
pub enum AdversarialError {
    /// An image could not be read, decoded or written.
    #[error("failed to process image `{}`: {source}", path.display())]
    ImageIo {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A filesystem operation outside of image decoding failed.
    #[error("i/o error at `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The depth model could not be constructed or its weights loaded.
    #[error("model initialization failed: {0}")]
    Initialization(String),

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// The model provider does not expose the requested capability.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Tensor or pixel data that cannot represent an image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("config error: {0}")]
    Config(String),
}

impl AdversarialError {
    pub fn shape_mismatch<const D: usize>(expected: [usize; D], actual: [usize; D]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdversarialError>;

/// Fails with [`AdversarialError::ShapeMismatch`] unless both shapes are equal.
pub fn ensure_same_shape<const D: usize>(expected: [usize; D], actual: [usize; D]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(AdversarialError::shape_mismatch(expected, actual))
    }
}
