use std::path::Path;

use burn::prelude::*;

// `Result` stays unimported: the `Config` derive expands to code naming std's `Result`.
use crate::{error::AdversarialError, model::DEFAULT_BATCH_SIZE};

/// Settings for a single adversarial example run.
#[derive(Config, Debug)]
pub struct AdversarialConfig {
    /// Number of gradient steps; the loop never stops early.
    #[config(default = 100)]
    pub iterations: usize,

    #[config(default = 0.001)]
    pub step_size: f32,

    #[config(default = 2)]
    pub batch_size: usize,

    /// Image to perturb. Falls back to the sink reference image.
    #[config(default = "None")]
    pub input_path: Option<String>,

    /// Image whose predicted depth is the goal. Falls back to the bathtub
    /// reference image.
    #[config(default = "None")]
    pub target_path: Option<String>,
}

impl Default for AdversarialConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            step_size: 0.001,
            batch_size: DEFAULT_BATCH_SIZE,
            input_path: None,
            target_path: None,
        }
    }
}

impl AdversarialConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(AdversarialError::Config(format!(
                "step size must be a positive number, got {}",
                self.step_size
            )));
        }
        if self.batch_size == 0 {
            return Err(AdversarialError::Config(
                "batch size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads a JSON config file written by [`Config::save`].
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        Self::load(path).map_err(|err| {
            AdversarialError::Config(format!("failed to read `{}`: {err}", path.display()))
        })
    }

    pub fn input_path(&self) -> Option<&Path> {
        self.input_path.as_deref().map(Path::new)
    }

    pub fn target_path(&self) -> Option<&Path> {
        self.target_path.as_deref().map(Path::new)
    }
}
