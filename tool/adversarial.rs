#![recursion_limit = "256"]

use std::path::PathBuf;

use burn::prelude::*;
use burn_depth_adversarial::{
    AdversarialBackend, AdversarialConfig, InferenceBackend, generate_adversarial_example,
    display::{DisplaySink, LogSink, PngSink, mean_abs_perturbation},
    logging::init_logging,
    model::{TinyDepthConfig, TinyDepthProvider},
};
use clap::Parser;
use log::LevelFilter;

#[derive(Clone, Debug, Parser)]
#[command(about = "adversarial examples for depth models", version, long_about = None)]
pub struct AdversarialArgs {
    /// JSON run config; flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON config for the tiny depth model.
    #[arg(long)]
    pub model_config: Option<PathBuf>,

    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub target: Option<String>,

    #[arg(long)]
    pub iterations: Option<usize>,

    #[arg(long)]
    pub step_size: Option<f32>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Tiny depth checkpoint (`.mpk`).
    #[arg(long)]
    pub checkpoint: Option<String>,

    #[arg(long, default_value = "assets/adversarial")]
    pub output_dir: PathBuf,

    /// Only log statistics instead of writing images.
    #[arg(long, default_value = "false")]
    pub no_images: bool,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

impl AdversarialArgs {
    fn run_config(&self) -> Result<AdversarialConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => AdversarialConfig::from_file(path)?,
            None => AdversarialConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input_path = Some(input.clone());
        }
        if let Some(target) = &self.target {
            config.target_path = Some(target.clone());
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(step_size) = self.step_size {
            config.step_size = step_size;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }

        Ok(config)
    }

    fn model_config(&self) -> Result<TinyDepthConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.model_config {
            Some(path) => TinyDepthConfig::load(path)
                .map_err(|err| format!("Failed to load model config `{}`: {err}", path.display()))?,
            None => TinyDepthConfig::new(),
        };
        if self.checkpoint.is_some() {
            config.checkpoint = self.checkpoint.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = AdversarialArgs::parse();
    init_logging(args.log_level)?;

    let config = args.run_config()?;
    let model_config = args.model_config()?;

    let device = <AdversarialBackend as Backend>::Device::default();
    let provider = TinyDepthProvider::<AdversarialBackend>::new(model_config, device);

    let mut png_sink = PngSink::new(&args.output_dir);
    let mut log_sink = LogSink;
    let sink: &mut dyn DisplaySink<InferenceBackend> = if args.no_images {
        &mut log_sink
    } else {
        &mut png_sink
    };

    let example = generate_adversarial_example::<AdversarialBackend, _>(&provider, &config, Some(sink))?;

    log::info!(
        "done: mean abs perturbation {:.6}",
        mean_abs_perturbation(&example.original.image, &example.altered.image)
    );
    if !args.no_images {
        log::info!("images written to `{}`", png_sink.output_dir().display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("adversarial_tool_{name}_{}.json", std::process::id()))
    }

    #[test]
    fn flags_override_run_config_file() {
        let path = scratch_file("run");
        AdversarialConfig::new()
            .with_iterations(7)
            .with_step_size(0.25)
            .with_batch_size(4)
            .with_input_path(Some("file_input.png".to_string()))
            .with_target_path(Some("file_target.png".to_string()))
            .save(&path)
            .unwrap();

        let args = AdversarialArgs::try_parse_from([
            "adversarial",
            "--config",
            path.to_str().unwrap(),
            "--iterations",
            "3",
            "--input",
            "flag_input.png",
        ])
        .unwrap();
        let config = args.run_config().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.iterations, 3);
        assert_eq!(config.input_path.as_deref(), Some("flag_input.png"));
        assert_eq!(config.step_size, 0.25);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.target_path.as_deref(), Some("file_target.png"));
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        let args = AdversarialArgs::try_parse_from(["adversarial", "--step-size", "0.5"]).unwrap();
        let config = args.run_config().unwrap();

        assert_eq!(config.step_size, 0.5);
        assert_eq!(config.iterations, AdversarialConfig::default().iterations);
        assert!(config.input_path.is_none());
        assert_eq!(args.output_dir, PathBuf::from("assets/adversarial"));
        assert!(!args.no_images);
    }

    #[test]
    fn checkpoint_flag_overrides_model_config_file() {
        let path = scratch_file("model");
        TinyDepthConfig::new()
            .with_hidden_channels(4)
            .with_height(32)
            .with_checkpoint(Some("file.mpk".to_string()))
            .save(&path)
            .unwrap();

        let args = AdversarialArgs::try_parse_from([
            "adversarial",
            "--model-config",
            path.to_str().unwrap(),
            "--checkpoint",
            "flag.mpk",
        ])
        .unwrap();
        let model_config = args.model_config().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(model_config.checkpoint.as_deref(), Some("flag.mpk"));
        assert_eq!(model_config.hidden_channels, 4);
        assert_eq!(model_config.height, 32);
        assert_eq!(model_config.width, TinyDepthConfig::new().width);
    }

    #[test]
    fn model_config_file_checkpoint_survives_without_flag() {
        let path = scratch_file("model_kept");
        TinyDepthConfig::new()
            .with_checkpoint(Some("file.mpk".to_string()))
            .save(&path)
            .unwrap();

        let args =
            AdversarialArgs::try_parse_from(["adversarial", "--model-config", path.to_str().unwrap()])
                .unwrap();
        let model_config = args.model_config().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(model_config.checkpoint.as_deref(), Some("file.mpk"));
    }

    #[test]
    fn missing_run_config_file_is_an_error() {
        let args =
            AdversarialArgs::try_parse_from(["adversarial", "--config", "does/not/exist.json"]).unwrap();
        assert!(args.run_config().is_err());
    }
}
