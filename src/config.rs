//! The reduction input document.
//!
//! A single YAML file describes one reduction run: the detailed model, the error
//! tolerance, the graph method, target and safe species, the sensitivity-analysis
//! switches and the autoignition conditions. Validation happens against the loaded
//! model and is fatal before any reduction begins.

use crate::chem::Model;
use crate::error::ReductionError;
use crate::graph::Method;
use crate::sampling::SamplingCondition;
use crate::sensitivity::SensitivityType;
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_starting_error() -> f64 {
    0.02
}

fn default_num_threads() -> usize {
    1
}

/// The parsed input document. See the field docs for the schema.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct InputConfig {
    /// Path to the detailed model file.
    pub model: PathBuf,
    /// Ignition-delay error tolerance in percent (> 0).
    pub error: f64,
    /// Graph-based reduction method; may be omitted for a sensitivity-only run.
    #[serde(default)]
    pub method: Option<Method>,
    /// Species whose behavior must be preserved; graph searches start here.
    pub targets: Vec<String>,
    /// Safe species that are never eliminated (default: empty).
    #[serde(default)]
    pub retained_species: Vec<String>,
    /// Optional upper threshold seeding the sensitivity limbo list (DRG/DRGEP only).
    #[serde(default)]
    pub upper_threshold: Option<f64>,
    /// Run the sensitivity refiner after the threshold sweep (default: false).
    #[serde(default)]
    pub sensitivity_analysis: bool,
    #[serde(default)]
    pub sensitivity_type: SensitivityType,
    /// Viable-start error for threshold calibration in percent (default: 0.02).
    #[serde(default = "default_starting_error")]
    pub starting_error: f64,
    /// Sampler worker count (default: 1).
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    /// Directory for reduced models and the sample cache (default: current directory).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    pub autoignition_conditions: Vec<SamplingCondition>,
}

impl InputConfig {
    /// Load and parse an input document.
    pub fn load(path: &Path) -> Result<InputConfig, ReductionError> {
        let text = std::fs::read_to_string(path)?;
        let config: InputConfig = serde_yaml::from_str(&text)
            .map_err(|e| ReductionError::Parse(format!("{}: {}", path.display(), e)))?;
        info!("Loaded input configuration from {}.", path.display());
        Ok(config)
    }

    /// Validate the document against the detailed model.
    pub fn validate(&self, model: &Model) -> Result<(), ReductionError> {
        if !(self.error > 0.0) || !self.error.is_finite() {
            return Err(ReductionError::InvalidInput(format!(
                "error tolerance must be positive, got {}",
                self.error
            )));
        }
        if !(self.starting_error > 0.0) {
            return Err(ReductionError::InvalidInput(
                "starting-error must be positive".to_string(),
            ));
        }
        if self.num_threads == 0 {
            return Err(ReductionError::InvalidInput(
                "num-threads must be at least 1".to_string(),
            ));
        }

        if self.method.is_none() && !self.sensitivity_analysis {
            return Err(ReductionError::InvalidInput(
                "no reduction method and no sensitivity analysis requested".to_string(),
            ));
        }

        if self.targets.is_empty() {
            return Err(ReductionError::InvalidInput(
                "at least one target species is required".to_string(),
            ));
        }
        for name in self.targets.iter().chain(self.retained_species.iter()) {
            if !model.has_species(name) {
                return Err(ReductionError::InvalidInput(format!(
                    "species `{}` is not in the model",
                    name
                )));
            }
        }

        if let Some(upper) = self.upper_threshold {
            if !(upper > 0.0) {
                return Err(ReductionError::InvalidInput(
                    "upper-threshold must be positive".to_string(),
                ));
            }
            if !matches!(self.method, Some(Method::Drg) | Some(Method::Drgep)) {
                return Err(ReductionError::InvalidInput(
                    "upper-threshold requires the DRG or DRGEP method".to_string(),
                ));
            }
        }

        if self.autoignition_conditions.is_empty() {
            return Err(ReductionError::InvalidInput(
                "at least one autoignition condition is required".to_string(),
            ));
        }
        for condition in &self.autoignition_conditions {
            condition.validate(model)?;
        }
        Ok(())
    }
}
