#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    path::{Path, PathBuf},
};

use burn::{
    backend::{Autodiff, NdArray},
    prelude::*,
};
use burn_depth_adversarial::{
    AdversarialError, Result,
    display::{DisplaySink, Prediction},
    inference::ImageTensor,
    model::{DepthModelProvider, FinalLayer},
};

pub type TestBackend = Autodiff<NdArray<f32>>;
pub type InnerBackend = NdArray<f32>;

pub fn tensor(data: Vec<f32>, shape: [usize; 4]) -> Tensor<InnerBackend, 4> {
    Tensor::from_data(TensorData::new(data, shape), &Default::default())
}

pub fn values(tensor: Tensor<InnerBackend, 4>) -> Vec<f32> {
    tensor.into_data().convert::<f32>().to_vec::<f32>().unwrap()
}

pub fn input_image() -> Tensor<InnerBackend, 4> {
    tensor(
        vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 4.0],
        [1, 2, 2, 3],
    )
}

pub fn target_image() -> Tensor<InnerBackend, 4> {
    tensor(
        vec![0.0, 0.0, 0.0, 2.0, 2.0, 2.0, 0.0, 0.0, 0.0, 6.0, 6.0, 6.0],
        [1, 2, 2, 3],
    )
}

/// Provider whose behavior is scripted by the test.
///
/// Images are looked up by path (falling back to `default_image`), `predict`
/// returns the scripted prediction or echoes its input, and the final layer is
/// the identity.
#[derive(Default)]
pub struct MockProvider {
    images: HashMap<PathBuf, Tensor<InnerBackend, 4>>,
    default_image: Option<Tensor<InnerBackend, 4>>,
    prediction: Option<Tensor<InnerBackend, 4>>,
    final_layer_unsupported: bool,
    init_failure: Option<String>,
    pub loaded_paths: RefCell<Vec<PathBuf>>,
    pub init_calls: Cell<usize>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, path: &str, image: Tensor<InnerBackend, 4>) -> Self {
        self.images.insert(PathBuf::from(path), image);
        self
    }

    pub fn with_default_image(mut self, image: Tensor<InnerBackend, 4>) -> Self {
        self.default_image = Some(image);
        self
    }

    pub fn with_prediction(mut self, prediction: Tensor<InnerBackend, 4>) -> Self {
        self.prediction = Some(prediction);
        self
    }

    pub fn without_final_layer(mut self) -> Self {
        self.final_layer_unsupported = true;
        self
    }

    pub fn failing_init(mut self, reason: &str) -> Self {
        self.init_failure = Some(reason.to_string());
        self
    }
}

impl DepthModelProvider<TestBackend> for MockProvider {
    type Model = ();

    fn load_image(&self, path: &Path) -> Result<ImageTensor<InnerBackend>> {
        self.loaded_paths.borrow_mut().push(path.to_path_buf());
        self.images
            .get(path)
            .or(self.default_image.as_ref())
            .cloned()
            .ok_or_else(|| AdversarialError::ImageIo {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no scripted image",
                )),
            })
    }

    fn initialize_model(&self) -> Result<()> {
        self.init_calls.set(self.init_calls.get() + 1);
        match &self.init_failure {
            Some(reason) => Err(AdversarialError::Initialization(reason.clone())),
            None => Ok(()),
        }
    }

    fn predict(
        &self,
        _model: &(),
        image: ImageTensor<InnerBackend>,
        _batch_size: usize,
    ) -> Result<ImageTensor<InnerBackend>> {
        Ok(self.prediction.clone().unwrap_or(image))
    }

    fn get_final_layer<'a>(&'a self, _model: &'a ()) -> Result<FinalLayer<'a, TestBackend>> {
        if self.final_layer_unsupported {
            return Err(AdversarialError::NotSupported(
                "mock provider has no final layer".to_string(),
            ));
        }
        Ok(FinalLayer::new(|input: Tensor<TestBackend, 4>| input))
    }
}

/// Sink that keeps what it was shown.
#[derive(Default)]
pub struct RecordingSink {
    pub shown: Vec<(Prediction<InnerBackend>, Prediction<InnerBackend>)>,
}

impl DisplaySink<InnerBackend> for RecordingSink {
    fn display(
        &mut self,
        original: &Prediction<InnerBackend>,
        altered: &Prediction<InnerBackend>,
    ) -> Result<()> {
        self.shown.push((original.clone(), altered.clone()));
        Ok(())
    }
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "burn_depth_adversarial_{name}_{}",
        std::process::id()
    ));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
