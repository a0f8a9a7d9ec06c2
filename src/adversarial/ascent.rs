use burn::prelude::*;

use super::oracle::{LossAndGradient, LossGradientOracle};
use crate::{
    error::{Result, ensure_same_shape},
    inference::ImageTensor,
};

/// Runs `iterations` gradient steps on `image` and returns the altered image.
///
/// Each step evaluates `oracle` on the current image and subtracts
/// `step_size * gradient` from it. There is no convergence check or early
/// exit. The loop owns the working image; callers keep their own copy if they
/// need the original afterwards.
pub fn gradient_ascent<B, O>(
    mut image: ImageTensor<B>,
    oracle: &O,
    iterations: usize,
    step_size: f32,
) -> Result<ImageTensor<B>>
where
    B: Backend,
    O: LossGradientOracle<B> + ?Sized,
{
    let dims = image.dims();

    for iteration in 0..iterations {
        let LossAndGradient { loss, gradient } = oracle.evaluate(image.clone())?;
        ensure_same_shape(dims, gradient.dims())?;

        log::info!("Loss at {iteration}: {loss:.3}");
        image = image - gradient.mul_scalar(step_size);
    }

    Ok(image)
}
