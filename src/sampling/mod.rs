//! Autoignition sampling of thermochemical state trajectories.
//!
//! This module answers two questions about a model under a list of
//! [`SamplingCondition`]s:
//!
//! - [`sample`]: ignition delays *and* 20 state snapshots per condition, used to
//!   bootstrap reduction (and optionally reused from an on-disk cache);
//! - [`sample_metrics`]: ignition delays only, used to measure the error of candidate
//!   reduced models.
//!
//! Conditions are independent, so sampling is embarrassingly parallel: with more than
//! one worker, conditions are distributed across a dedicated thread pool and results
//! are reassembled by condition index. A failure in any worker aborts the whole
//! sampling call; no partial results are used.

mod autoignition;
mod cache;
mod condition;

pub use autoignition::{
    DEFAULT_MAX_STEPS, IGNITION_TEMPERATURE_RISE, IgnitionRun, SNAPSHOTS_PER_CONDITION, Snapshot,
    simulate,
};
pub use condition::{CompositionType, SamplingCondition};

use crate::chem::KineticModel;
use crate::error::ReductionError;
use log::info;
use rayon::prelude::*;
use std::path::Path;

/// Baseline sampling output: one ignition delay and one snapshot list per condition,
/// in condition order.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledData {
    pub ignition_delays: Vec<f64>,
    pub snapshots: Vec<Vec<Snapshot>>,
}

/// Sample ignition delays and state snapshots for every condition.
///
/// When `cache_dir` is given, a previously stored result with a matching shape is
/// reused, and fresh results are stored there for the next run.
pub fn sample(
    kin: &KineticModel,
    conditions: &[SamplingCondition],
    workers: usize,
    cache_dir: Option<&Path>,
) -> Result<SampledData, ReductionError> {
    if let Some(dir) = cache_dir {
        if let Some(cached) = cache::load(dir, conditions.len(), kin.n_species()) {
            return Ok(cached);
        }
    }

    let runs = run_conditions(kin, conditions, workers, true)?;
    let data = SampledData {
        ignition_delays: runs.iter().map(|r| r.ignition_delay).collect(),
        snapshots: runs.into_iter().map(|r| r.snapshots).collect(),
    };
    info!(
        "Sampled {} conditions: ignition delays {:?} s.",
        conditions.len(),
        data.ignition_delays
    );

    if let Some(dir) = cache_dir {
        cache::store(dir, kin.species_names(), &data)?;
    }
    Ok(data)
}

/// Sample only ignition delays; snapshot collection is skipped.
pub fn sample_metrics(
    kin: &KineticModel,
    conditions: &[SamplingCondition],
    workers: usize,
) -> Result<Vec<f64>, ReductionError> {
    let runs = run_conditions(kin, conditions, workers, false)?;
    Ok(runs.into_iter().map(|r| r.ignition_delay).collect())
}

fn run_conditions(
    kin: &KineticModel,
    conditions: &[SamplingCondition],
    workers: usize,
    collect_snapshots: bool,
) -> Result<Vec<IgnitionRun>, ReductionError> {
    if workers <= 1 || conditions.len() <= 1 {
        return conditions
            .iter()
            .enumerate()
            .map(|(index, condition)| simulate(kin, condition, index, collect_snapshots))
            .collect();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| ReductionError::SimulationFailure(format!("worker pool: {}", e)))?;
    pool.install(|| {
        conditions
            .par_iter()
            .enumerate()
            .map(|(index, condition)| simulate(kin, condition, index, collect_snapshots))
            .collect()
    })
}
