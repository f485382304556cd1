//! The error type shared by all stages of the reduction pipeline.

use thiserror::Error;

/// Calibration aborts once the pruning threshold falls below this value.
pub const THRESHOLD_FLOOR: f64 = 1e-5;

/// Errors produced by the reduction pipeline.
///
/// Only [`ReductionError::SimulationFailure`] and [`ReductionError::NoIgnition`] are
/// recoverable, and only while evaluating a *candidate* reduced model: the driver maps
/// them to a 100% trial error, which rejects the candidate. Every other kind (and any
/// kind raised while bootstrapping the detailed model) aborts the run.
#[derive(Debug, Error)]
pub enum ReductionError {
    /// The input document or a sampling condition violates the configuration schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An autoignition condition never crossed the ignition temperature.
    #[error("no ignition for condition #{index} (T = {temperature} K, P = {pressure} atm)")]
    NoIgnition {
        index: usize,
        temperature: f64,
        pressure: f64,
    },

    /// The reactor integration failed (step underflow, non-finite state).
    #[error("simulation failure: {0}")]
    SimulationFailure(String),

    /// Threshold calibration fell below [`THRESHOLD_FLOOR`] without finding a viable
    /// starting point.
    #[error("threshold underflow: no viable starting threshold above {THRESHOLD_FLOOR:e}")]
    ThresholdUnderflow,

    /// A model could not be constructed (empty species set, dangling species reference).
    #[error("model construction failed: {0}")]
    ModelConstruction(String),

    /// A model or input file could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReductionError {
    /// True for error kinds that a candidate-model trial absorbs as a 100% error
    /// instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReductionError::SimulationFailure(_) | ReductionError::NoIgnition { .. }
        )
    }
}
