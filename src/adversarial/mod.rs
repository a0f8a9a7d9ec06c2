//! Adversarial examples for depth models.
//!
//! An input image is altered step by step until the model's depth prediction
//! for it approaches the depth the model predicts for a different target
//! image.

mod ascent;
mod inputs;
mod oracle;

pub use ascent::gradient_ascent;
pub use inputs::{BATHTUB_IMAGE, SINK_IMAGE, get_inputs};
pub use oracle::{DepthLossOracle, GRADIENT_EPSILON, LossAndGradient, LossGradientOracle};

use burn::{prelude::*, tensor::backend::AutodiffBackend};

use crate::{
    config::AdversarialConfig,
    display::{DisplaySink, Prediction},
    error::Result,
    model::DepthModelProvider,
};

/// Outcome of a completed run.
#[derive(Clone, Debug)]
pub struct AdversarialExample<B: Backend> {
    pub original: Prediction<B>,
    pub altered: Prediction<B>,
}

/// Generates an adversarial example end to end.
///
/// Initializes the model, resolves the input image and target depth, runs
/// [`gradient_ascent`] on a copy of the input and predicts depth for both the
/// original and the altered image. Both predictions go to `sink` when one is
/// given. Any failure aborts the run.
pub fn generate_adversarial_example<B, P>(
    provider: &P,
    config: &AdversarialConfig,
    sink: Option<&mut dyn DisplaySink<B::InnerBackend>>,
) -> Result<AdversarialExample<B::InnerBackend>>
where
    B: AutodiffBackend,
    P: DepthModelProvider<B> + ?Sized,
{
    config.validate()?;

    let model = provider.initialize_model()?;
    let (input_image, target_depth) = get_inputs::<B, P>(
        provider,
        &model,
        config.input_path(),
        config.target_path(),
        config.batch_size,
    )?;

    let oracle = DepthLossOracle::new(provider.get_final_layer(&model)?, target_depth);

    log::info!(
        "running {} iterations with step size {}",
        config.iterations,
        config.step_size
    );
    let original_image = input_image.clone();
    let altered_image = gradient_ascent(input_image, &oracle, config.iterations, config.step_size)?;

    let original = Prediction {
        depth: provider.predict(&model, original_image.clone(), config.batch_size)?,
        image: original_image,
    };
    let altered = Prediction {
        depth: provider.predict(&model, altered_image.clone(), config.batch_size)?,
        image: altered_image,
    };

    if let Some(sink) = sink {
        sink.display(&original, &altered)?;
    }

    Ok(AdversarialExample { original, altered })
}
