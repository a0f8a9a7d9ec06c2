use std::path::Path;

use burn::tensor::backend::AutodiffBackend;

use crate::{error::Result, inference::ImageTensor, model::DepthModelProvider};

/// Reference input: a sink.
pub const SINK_IMAGE: &str = "images/sink.png";

/// Reference target: a bathtub.
pub const BATHTUB_IMAGE: &str = "images/bathtub.png";

/// Loads the image to perturb and the depth map it should be pushed towards.
///
/// Missing paths fall back to [`SINK_IMAGE`] and [`BATHTUB_IMAGE`]. The target
/// depth is the model's own prediction for the target image.
pub fn get_inputs<B, P>(
    provider: &P,
    model: &P::Model,
    input_path: Option<&Path>,
    target_path: Option<&Path>,
    batch_size: usize,
) -> Result<(ImageTensor<B::InnerBackend>, ImageTensor<B::InnerBackend>)>
where
    B: AutodiffBackend,
    P: DepthModelProvider<B> + ?Sized,
{
    let input_path = input_path.unwrap_or(Path::new(SINK_IMAGE));
    let target_path = target_path.unwrap_or(Path::new(BATHTUB_IMAGE));

    let input_image = provider.load_image(input_path)?;
    let target_image = provider.load_image(target_path)?;
    let target_depth = provider.predict(model, target_image, batch_size)?;

    log::debug!(
        "input `{}` {:?}, target `{}` depth {:?}",
        input_path.display(),
        input_image.dims(),
        target_path.display(),
        target_depth.dims()
    );

    Ok((input_image, target_depth))
}
