use std::path::Path;

use burn::{
    module::{AutodiffModule, Ignored, Module},
    nn::{
        PaddingConfig2d,
        conv::{Conv2d, Conv2dConfig},
    },
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::{
        activation::{relu, sigmoid},
        backend::AutodiffBackend,
    },
};

use super::{DepthModelProvider, FinalLayer};
// See `config.rs`: the `Config` derive needs std's `Result` in scope.
use crate::{
    error::AdversarialError,
    inference::{ImageTensor, load_image_tensor, validate_image_shape},
};

/// Configuration for [`TinyDepth`] and the images fed to it.
#[derive(Config, Debug)]
pub struct TinyDepthConfig {
    #[config(default = 16)]
    pub hidden_channels: usize,

    /// Images are resized to `height x width` when loaded.
    #[config(default = 240)]
    pub height: usize,

    #[config(default = 320)]
    pub width: usize,

    /// Upper bound of the predicted depth.
    #[config(default = 10.0)]
    pub max_depth: f32,

    #[config(default = "None")]
    pub checkpoint: Option<String>,
}

impl TinyDepthConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.hidden_channels == 0 {
            return Err(AdversarialError::Initialization(
                "tiny depth requires at least one hidden channel".to_string(),
            ));
        }
        if self.height == 0 || self.width == 0 {
            return Err(AdversarialError::Initialization(format!(
                "tiny depth requires a non-zero resolution, got {}x{}",
                self.height, self.width
            )));
        }
        if !self.max_depth.is_finite() || self.max_depth <= 0.0 {
            return Err(AdversarialError::Initialization(format!(
                "max depth must be positive, got {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> TinyDepth<B> {
        TinyDepth::new(device, self)
    }
}

/// Small fully convolutional depth network.
///
/// Maps an `NHWC` RGB (or grayscale) image in `[0, 1]` to an `NHWC` depth map
/// with one channel and the same resolution. It holds no dropout or other
/// stochastic layers, so training and inference forward passes coincide.
#[derive(Module, Debug)]
pub struct TinyDepth<B: Backend> {
    conv_in: Conv2d<B>,
    conv_hidden: Conv2d<B>,
    conv_out: Conv2d<B>,
    max_depth: Ignored<f32>,
}

impl<B: Backend> TinyDepth<B> {
    pub fn new(device: &B::Device, config: &TinyDepthConfig) -> Self {
        let hidden = config.hidden_channels;
        let conv_in = Conv2dConfig::new([3, hidden], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv_hidden = Conv2dConfig::new([hidden, hidden], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv_out = Conv2dConfig::new([hidden, 1], [1, 1])
            .with_bias(true)
            .init(device);

        Self {
            conv_in,
            conv_hidden,
            conv_out,
            max_depth: Ignored(config.max_depth),
        }
    }

    pub fn forward(&self, image: Tensor<B, 4>) -> Tensor<B, 4> {
        let image = if image.dims()[3] == 1 {
            image.repeat_dim(3, 3)
        } else {
            image
        };

        let x = image.permute([0, 3, 1, 2]);
        let x = relu(self.conv_in.forward(x));
        let x = relu(self.conv_hidden.forward(x));
        let x = sigmoid(self.conv_out.forward(x)).mul_scalar(self.max_depth.0);
        x.permute([0, 2, 3, 1])
    }

    pub fn max_depth(&self) -> f32 {
        self.max_depth.0
    }
}

/// [`DepthModelProvider`] backed by [`TinyDepth`].
///
/// Weights come from a `NamedMpkFileRecorder` checkpoint when one is
/// configured and are randomly initialized otherwise.
#[derive(Clone, Debug)]
pub struct TinyDepthProvider<B: Backend> {
    config: TinyDepthConfig,
    device: B::Device,
}

impl<B: Backend> TinyDepthProvider<B> {
    pub fn new(config: TinyDepthConfig, device: B::Device) -> Self {
        Self { config, device }
    }
}

impl<B: AutodiffBackend> DepthModelProvider<B> for TinyDepthProvider<B> {
    type Model = TinyDepth<B>;

    fn load_image(&self, path: &Path) -> crate::Result<ImageTensor<B::InnerBackend>> {
        load_image_tensor(
            path,
            Some((self.config.height, self.config.width)),
            &self.device,
        )
    }

    fn initialize_model(&self) -> crate::Result<TinyDepth<B>> {
        self.config.validate()?;
        let model = self.config.init::<B>(&self.device);

        match self.config.checkpoint.as_deref() {
            Some(checkpoint) => {
                let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
                let model = model
                    .load_file(checkpoint, &recorder, &self.device)
                    .map_err(|err| {
                        AdversarialError::Initialization(format!(
                            "failed to load checkpoint `{checkpoint}`: {err}"
                        ))
                    })?;
                log::info!("loaded tiny depth checkpoint `{checkpoint}`");
                Ok(model)
            }
            None => {
                log::warn!("no checkpoint configured, tiny depth uses random weights");
                Ok(model)
            }
        }
    }

    fn predict(
        &self,
        model: &TinyDepth<B>,
        image: ImageTensor<B::InnerBackend>,
        batch_size: usize,
    ) -> crate::Result<ImageTensor<B::InnerBackend>> {
        validate_image_shape(&image)?;
        if batch_size == 0 {
            return Err(AdversarialError::Config(
                "batch size must be positive".to_string(),
            ));
        }

        let model = model.valid();
        let batch = image.dims()[0];
        let outputs: Vec<_> = (0..batch)
            .step_by(batch_size)
            .map(|start| {
                let len = batch_size.min(batch - start);
                model.forward(image.clone().narrow(0, start, len))
            })
            .collect();

        Ok(Tensor::cat(outputs, 0))
    }

    fn get_final_layer<'a>(&'a self, model: &'a TinyDepth<B>) -> crate::Result<FinalLayer<'a, B>> {
        let model = model.clone().no_grad();
        Ok(FinalLayer::new(move |input| model.forward(input)))
    }
}
