pub mod tiny_depth;

use std::path::Path;

use burn::{prelude::*, tensor::backend::AutodiffBackend};

use crate::{error::Result, inference::ImageTensor};

pub use tiny_depth::{TinyDepth, TinyDepthConfig, TinyDepthProvider};

/// Batch size used by `predict` when the caller has no preference.
pub const DEFAULT_BATCH_SIZE: usize = 2;

/// Differentiable view of a model's last layer.
///
/// Evaluating it on an input that requires gradients yields an output from
/// which gradients with respect to that input can be taken.
pub struct FinalLayer<'a, B: Backend> {
    forward: Box<dyn Fn(Tensor<B, 4>) -> Tensor<B, 4> + 'a>,
}

impl<'a, B: Backend> FinalLayer<'a, B> {
    pub fn new(forward: impl Fn(Tensor<B, 4>) -> Tensor<B, 4> + 'a) -> Self {
        Self {
            forward: Box::new(forward),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        (self.forward)(input)
    }
}

impl<B: Backend> std::fmt::Debug for FinalLayer<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalLayer").finish_non_exhaustive()
    }
}

/// Capabilities a depth model must expose to be attacked.
///
/// Images and predictions live on the inner (non-differentiable) backend; only
/// [`FinalLayer`] runs on the autodiff backend `B`.
pub trait DepthModelProvider<B: AutodiffBackend> {
    /// Handle to an initialized model, owned by the caller.
    type Model;

    /// Loads an image file as a `[1, height, width, channels]` tensor.
    ///
    /// Fails with [`AdversarialError::ImageIo`](crate::AdversarialError::ImageIo)
    /// when the path is unreadable or not an image.
    fn load_image(&self, path: &Path) -> Result<ImageTensor<B::InnerBackend>>;

    /// Builds the model, loading any weights it needs. Called once per run.
    fn initialize_model(&self) -> Result<Self::Model>;

    /// Predicts a depth map for `image`.
    ///
    /// Must be deterministic for a fixed model and image. `batch_size` only
    /// controls how the batch is chunked and never changes the output.
    fn predict(
        &self,
        model: &Self::Model,
        image: ImageTensor<B::InnerBackend>,
        batch_size: usize,
    ) -> Result<ImageTensor<B::InnerBackend>>;

    /// Returns the model's last layer in inference mode.
    ///
    /// Providers without such a hook return
    /// [`AdversarialError::NotSupported`](crate::AdversarialError::NotSupported).
    fn get_final_layer<'a>(&'a self, model: &'a Self::Model) -> Result<FinalLayer<'a, B>>;
}
