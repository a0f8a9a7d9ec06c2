#![recursion_limit = "256"]

//! Attacks a hand-written "brightness is near" depth model.
//!
//! Shows the minimum a [`DepthModelProvider`] needs: no weights, no network,
//! just a differentiable final layer.

use std::path::{Path, PathBuf};

use burn::{prelude::*, tensor::backend::AutodiffBackend};
use burn_depth_adversarial::{
    AdversarialBackend, AdversarialConfig, Result, generate_adversarial_example,
    display::{LogSink, mean_abs_perturbation},
    inference::{ImageTensor, load_image_tensor},
    logging::init_logging,
    model::{DepthModelProvider, FinalLayer},
};
use clap::Parser;
use log::LevelFilter;

#[derive(Clone, Debug, Parser)]
#[command(about = "adversarial example against an analytic depth model", long_about = None)]
struct Args {
    #[arg(long, default_value = "images/sink.png")]
    input: PathBuf,

    #[arg(long, default_value = "images/bathtub.png")]
    target: PathBuf,

    #[arg(long, default_value_t = 50)]
    iterations: usize,

    #[arg(long, default_value_t = 0.01)]
    step_size: f32,

    #[arg(long, default_value_t = 64)]
    size: usize,
}

fn brightness_depth<B: Backend>(image: Tensor<B, 4>) -> Tensor<B, 4> {
    image.mean_dim(3).neg().add_scalar(1.0)
}

struct BrightnessProvider<B: AutodiffBackend> {
    size: usize,
    device: B::Device,
}

impl<B: AutodiffBackend> DepthModelProvider<B> for BrightnessProvider<B> {
    type Model = ();

    fn load_image(&self, path: &Path) -> Result<ImageTensor<B::InnerBackend>> {
        load_image_tensor(path, Some((self.size, self.size)), &self.device)
    }

    fn initialize_model(&self) -> Result<()> {
        Ok(())
    }

    fn predict(
        &self,
        _model: &(),
        image: ImageTensor<B::InnerBackend>,
        _batch_size: usize,
    ) -> Result<ImageTensor<B::InnerBackend>> {
        Ok(brightness_depth(image))
    }

    fn get_final_layer<'a>(&'a self, _model: &'a ()) -> Result<FinalLayer<'a, B>> {
        Ok(FinalLayer::new(brightness_depth::<B>))
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(LevelFilter::Info)?;

    let provider = BrightnessProvider::<AdversarialBackend> {
        size: args.size,
        device: Default::default(),
    };
    let config = AdversarialConfig::new()
        .with_iterations(args.iterations)
        .with_step_size(args.step_size)
        .with_input_path(Some(args.input.to_string_lossy().into_owned()))
        .with_target_path(Some(args.target.to_string_lossy().into_owned()));

    let example = generate_adversarial_example::<AdversarialBackend, _>(
        &provider,
        &config,
        Some(&mut LogSink),
    )?;

    println!(
        "mean abs perturbation: {:.6}",
        mean_abs_perturbation(&example.original.image, &example.altered.image)
    );

    Ok(())
}
