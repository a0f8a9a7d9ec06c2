#![recursion_limit = "256"]

pub mod adversarial;
pub mod config;
pub mod display;
pub mod error;
pub mod inference;
pub mod logging;
pub mod model;

pub use adversarial::{AdversarialExample, generate_adversarial_example};
pub use config::AdversarialConfig;
pub use error::{AdversarialError, Result};

#[cfg(feature = "backend_wgpu")]
pub type InferenceBackend = burn::backend::Wgpu<f32>;

#[cfg(not(feature = "backend_wgpu"))]
pub type InferenceBackend = burn::backend::NdArray<f32>;

/// Backend used to differentiate through the depth model.
pub type AdversarialBackend = burn::backend::Autodiff<InferenceBackend>;
