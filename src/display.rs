use std::path::{Path, PathBuf};

use burn::prelude::*;

use crate::{
    error::{AdversarialError, Result},
    inference::{ImageTensor, depth_to_gray_image, image_tensor_to_rgb, validate_image_shape},
};

/// An image together with the depth the model predicts for it.
#[derive(Clone, Debug)]
pub struct Prediction<B: Backend> {
    pub image: ImageTensor<B>,
    pub depth: ImageTensor<B>,
}

/// Presents the unaltered and the adversarial prediction side by side.
pub trait DisplaySink<B: Backend> {
    fn display(&mut self, original: &Prediction<B>, altered: &Prediction<B>) -> Result<()>;
}

/// Writes both predictions as PNG files into a directory.
#[derive(Clone, Debug)]
pub struct PngSink {
    output_dir: PathBuf,
}

impl PngSink {
    pub const ORIGINAL_INPUT: &'static str = "original_input.png";
    pub const ORIGINAL_DEPTH: &'static str = "original_depth.png";
    pub const ALTERED_INPUT: &'static str = "altered_input.png";
    pub const ALTERED_DEPTH: &'static str = "altered_depth.png";

    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write<B: Backend>(&self, prediction: &Prediction<B>, image_name: &str, depth_name: &str) -> Result<()> {
        let image_path = self.output_dir.join(image_name);
        image_tensor_to_rgb(prediction.image.clone())?
            .save(&image_path)
            .map_err(|source| AdversarialError::ImageIo {
                path: image_path.clone(),
                source,
            })?;

        let depth_path = self.output_dir.join(depth_name);
        depth_to_gray_image(prediction.depth.clone())?
            .save(&depth_path)
            .map_err(|source| AdversarialError::ImageIo {
                path: depth_path.clone(),
                source,
            })?;

        log::info!(
            "saved {} and {}",
            image_path.display(),
            depth_path.display()
        );
        Ok(())
    }
}

impl<B: Backend> DisplaySink<B> for PngSink {
    fn display(&mut self, original: &Prediction<B>, altered: &Prediction<B>) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| AdversarialError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        self.write(original, Self::ORIGINAL_INPUT, Self::ORIGINAL_DEPTH)?;
        self.write(altered, Self::ALTERED_INPUT, Self::ALTERED_DEPTH)
    }
}

/// Summary statistics of a depth map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

impl DepthStats {
    pub fn from_depth<B: Backend>(depth: &ImageTensor<B>) -> Result<Self> {
        validate_image_shape(depth)?;
        Ok(Self {
            min: depth.clone().min().into_scalar().elem::<f32>(),
            max: depth.clone().max().into_scalar().elem::<f32>(),
            mean: depth.clone().mean().into_scalar().elem::<f32>(),
        })
    }
}

/// Mean absolute per-element difference between two images.
pub fn mean_abs_perturbation<B: Backend>(original: &ImageTensor<B>, altered: &ImageTensor<B>) -> f32 {
    (altered.clone() - original.clone())
        .abs()
        .mean()
        .into_scalar()
        .elem::<f32>()
}

/// Logs depth statistics and the size of the perturbation.
#[derive(Clone, Debug, Default)]
pub struct LogSink;

impl<B: Backend> DisplaySink<B> for LogSink {
    fn display(&mut self, original: &Prediction<B>, altered: &Prediction<B>) -> Result<()> {
        for (label, prediction) in [("original", original), ("altered", altered)] {
            let stats = DepthStats::from_depth(&prediction.depth)?;
            log::info!(
                "{label} depth: min={:.4} max={:.4} mean={:.4}",
                stats.min,
                stats.max,
                stats.mean
            );
        }
        log::info!(
            "mean abs perturbation: {:.6}",
            mean_abs_perturbation(&original.image, &altered.image)
        );
        Ok(())
    }
}
