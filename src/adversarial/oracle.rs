use burn::{prelude::*, tensor::backend::AutodiffBackend};

use crate::{
    error::{AdversarialError, Result, ensure_same_shape},
    inference::ImageTensor,
    model::FinalLayer,
};

/// Lower bound on the gradient scale used during normalization.
pub const GRADIENT_EPSILON: f32 = 1e-7;

/// Loss and input gradient for one image.
#[derive(Clone, Debug)]
pub struct LossAndGradient<B: Backend> {
    pub loss: f32,
    pub gradient: ImageTensor<B>,
}

/// Maps an image to a scalar loss and a gradient of the same shape.
///
/// Implementations must be pure: evaluating the same image twice yields the
/// same result.
pub trait LossGradientOracle<B: Backend> {
    fn evaluate(&self, image: ImageTensor<B>) -> Result<LossAndGradient<B>>;
}

impl<B, F> LossGradientOracle<B> for F
where
    B: Backend,
    F: Fn(ImageTensor<B>) -> Result<LossAndGradient<B>>,
{
    fn evaluate(&self, image: ImageTensor<B>) -> Result<LossAndGradient<B>> {
        self(image)
    }
}

/// Mean squared error between a model's final layer and a target depth map,
/// with the input gradient normalized by its mean absolute value.
pub struct DepthLossOracle<'a, B: AutodiffBackend> {
    final_layer: FinalLayer<'a, B>,
    target: ImageTensor<B::InnerBackend>,
}

impl<'a, B: AutodiffBackend> DepthLossOracle<'a, B> {
    pub fn new(final_layer: FinalLayer<'a, B>, target: ImageTensor<B::InnerBackend>) -> Self {
        Self {
            final_layer,
            target,
        }
    }
}

impl<B: AutodiffBackend> LossGradientOracle<B::InnerBackend> for DepthLossOracle<'_, B> {
    fn evaluate(&self, image: ImageTensor<B::InnerBackend>) -> Result<LossAndGradient<B::InnerBackend>> {
        let input_dims = image.dims();
        let input = Tensor::<B, 4>::from_inner(image).require_grad();

        let output = self.final_layer.forward(input.clone());
        ensure_same_shape(self.target.dims(), output.dims())?;

        let element_count = output.shape().num_elements() as f32;
        let diff = output - Tensor::from_inner(self.target.clone());
        let loss = (diff.clone() * diff).sum().div_scalar(element_count);

        let grads = loss.backward();
        let gradient = input.grad(&grads).ok_or_else(|| {
            AdversarialError::NotSupported(
                "final layer output does not depend on the model input".to_string(),
            )
        })?;
        ensure_same_shape(input_dims, gradient.dims())?;

        let scale = gradient
            .clone()
            .abs()
            .mean()
            .into_scalar()
            .elem::<f32>()
            .max(GRADIENT_EPSILON);

        Ok(LossAndGradient {
            loss: loss.into_scalar().elem::<f32>(),
            gradient: gradient.div_scalar(scale),
        })
    }
}
