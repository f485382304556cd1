//! The reduction driver: bootstrap sampling, interaction matrices, threshold search,
//! limbo extraction and output-file lifecycle.
//!
//! The driver is generic over the [`InteractionMethod`]; the [`run`] entry point
//! dispatches on the configured [`Method`] and optionally hands the result to the
//! sensitivity refiner.

mod threshold_sweep;

pub use threshold_sweep::{ThresholdSweep, Trial, TrialEvaluator};

use crate::chem::{KineticModel, Model, io};
use crate::config::InputConfig;
use crate::error::ReductionError;
use crate::graph::{AdjacencyMatrix, Drg, Drgep, InteractionMethod, Method, Pfa};
use crate::sampling::{SampledData, SamplingCondition, sample, sample_metrics};
use crate::trim::trim;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Flat configuration shared by the driver and the sensitivity refiner.
#[derive(Debug, Clone)]
pub struct ReductionConfig {
    /// Species whose behavior the reduced model must preserve; graph searches start
    /// here.
    pub targets: Vec<String>,
    /// Species the user forbids eliminating regardless of importance.
    pub retained_species: Vec<String>,
    /// Ignition-delay error tolerance in percent.
    pub tolerance: f64,
    /// A calibration trial is a viable start once its error drops to this value
    /// (default: 0.02).
    pub starting_error: f64,
    /// Optional upper threshold seeding the limbo list for sensitivity refinement.
    pub upper_threshold: Option<f64>,
    pub conditions: Vec<SamplingCondition>,
    /// Sampler worker count (default: 1).
    pub num_threads: usize,
    /// Directory receiving reduced-model files and the sample cache.
    pub output_dir: PathBuf,
}

impl ReductionConfig {
    pub fn from_input(input: &InputConfig) -> ReductionConfig {
        ReductionConfig {
            targets: input.targets.clone(),
            retained_species: input.retained_species.clone(),
            tolerance: input.error,
            starting_error: input.starting_error,
            upper_threshold: input.upper_threshold,
            conditions: input.autoignition_conditions.clone(),
            num_threads: input.num_threads,
            output_dir: input.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Targets and safe species: never eliminated by any stage.
    pub fn protected(&self) -> BTreeSet<String> {
        self.targets
            .iter()
            .chain(self.retained_species.iter())
            .cloned()
            .collect()
    }
}

/// A reduced model together with its measured error and reduction metadata.
#[derive(Debug, Clone)]
pub struct ReducedModel {
    pub model: Model,
    /// Ignition-delay error against the detailed baseline, in percent.
    pub error: f64,
    /// The reduced-model file, once written.
    pub path: Option<PathBuf>,
    /// Species between the final and the upper threshold, candidates for the
    /// sensitivity refiner. In detailed-model species order.
    pub limbo: Vec<String>,
}

/// Ignition-delay error in percent: `100 * max_c |tau_red - tau_det| / tau_det`.
///
/// A missing or zero detailed delay forces 100 (the baseline is unusable as a
/// reference); a vanishing reduced delay naturally evaluates to 100.
pub fn ignition_error(detailed: &[f64], reduced: &[f64]) -> f64 {
    debug_assert_eq!(detailed.len(), reduced.len());
    let mut worst = 0.0_f64;
    for (&baseline, &candidate) in detailed.iter().zip(reduced) {
        if !(baseline > 0.0) || !baseline.is_finite() {
            return 100.0;
        }
        worst = worst.max(100.0 * (candidate - baseline).abs() / baseline);
    }
    worst
}

/// Measure a candidate model against baseline delays, absorbing recoverable
/// simulation failures into a 100% error.
pub(crate) fn candidate_error(
    candidate: &Model,
    conditions: &[SamplingCondition],
    workers: usize,
    baseline: &[f64],
) -> Result<f64, ReductionError> {
    let result = KineticModel::new(candidate)
        .and_then(|kin| sample_metrics(&kin, conditions, workers));
    match result {
        Ok(delays) => Ok(ignition_error(baseline, &delays)),
        Err(e) if e.is_recoverable() => {
            debug!("Candidate rejected: {}.", e);
            Ok(100.0)
        }
        Err(e) => Err(e),
    }
}

/// The production trial evaluator: prune the interaction graphs, trim the detailed
/// model, re-simulate, measure. Implements the idempotence shortcut by caching the
/// previous trial.
struct ModelEvaluator<'a, M: InteractionMethod> {
    config: &'a ReductionConfig,
    model: &'a Model,
    matrices: &'a [AdjacencyMatrix],
    target_indices: Vec<usize>,
    protected: BTreeSet<String>,
    baseline: &'a [f64],
    previous: Option<Trial>,
    _method: PhantomData<M>,
}

impl<'a, M: InteractionMethod> ModelEvaluator<'a, M> {
    fn new(
        config: &'a ReductionConfig,
        model: &'a Model,
        matrices: &'a [AdjacencyMatrix],
        baseline: &'a [f64],
    ) -> ModelEvaluator<'a, M> {
        let target_indices = config
            .targets
            .iter()
            .filter_map(|name| model.species_index(name))
            .collect();
        ModelEvaluator {
            config,
            model,
            matrices,
            target_indices,
            protected: config.protected(),
            baseline,
            previous: None,
            _method: PhantomData,
        }
    }

    /// Retained species names at a threshold: graph survivors plus protected species.
    fn retained_at(&self, threshold: f64) -> BTreeSet<String> {
        let survivors = M::survivors(self.matrices, &self.target_indices, threshold);
        let mut retained: BTreeSet<String> = survivors
            .into_iter()
            .map(|i| self.model.species[i].name.clone())
            .collect();
        retained.extend(self.protected.iter().cloned());
        retained
    }
}

impl<M: InteractionMethod> TrialEvaluator for ModelEvaluator<'_, M> {
    fn evaluate(&mut self, threshold: f64) -> Result<Trial, ReductionError> {
        let retained = self.retained_at(threshold);

        if let Some(previous) = &self.previous {
            if previous.retained == retained {
                debug!(
                    "[threshold {:.4e}] identical retained set, reusing previous result.",
                    threshold
                );
                let mut trial = previous.clone();
                trial.threshold = threshold;
                return Ok(trial);
            }
        }

        let exclusion: BTreeSet<String> = self
            .model
            .species_names()
            .filter(|name| !retained.contains(*name))
            .map(str::to_string)
            .collect();
        let candidate = trim(self.model, &exclusion)?;
        let error = candidate_error(
            &candidate,
            &self.config.conditions,
            self.config.num_threads,
            self.baseline,
        )?;
        info!(
            "[threshold {:.4e}] {} species, error {:.2}%.",
            threshold,
            retained.len(),
            error
        );

        let trial = Trial {
            threshold,
            error,
            retained,
            model: candidate,
        };
        self.previous = Some(trial.clone());
        Ok(trial)
    }
}

/// Run the threshold search for one interaction method and assemble the result.
pub fn reduce_with<M: InteractionMethod>(
    config: &ReductionConfig,
    model: &Model,
    kin: &KineticModel,
    baseline: &SampledData,
) -> Result<ReducedModel, ReductionError> {
    let matrices: Vec<AdjacencyMatrix> = baseline
        .snapshots
        .iter()
        .flatten()
        .map(|snapshot| M::build(kin, snapshot))
        .collect();
    info!(
        "Built {} {} interaction matrices over {} conditions.",
        matrices.len(),
        M::NAME,
        baseline.snapshots.len()
    );

    let mut evaluator = ModelEvaluator::<M>::new(config, model, &matrices, &baseline.ignition_delays);
    let mut sweep = ThresholdSweep::new(config.tolerance, config.starting_error);
    let first = sweep.calibrate(&mut evaluator)?;

    let protected = config.protected();
    let mut last_written: Option<PathBuf> = None;
    let best = sweep.sweep(&mut evaluator, first, &protected, |trial| {
        let path = write_reduced(&config.output_dir, &trial.model)?;
        if let Some(previous) = last_written.replace(path) {
            if Some(&previous) != last_written.as_ref() {
                remove_superseded(&previous);
            }
        }
        Ok(())
    })?;
    let best = best.ok_or_else(|| {
        ReductionError::InvalidInput(format!(
            "no reduction satisfied the tolerance of {}% (is `starting-error` above it?)",
            config.tolerance
        ))
    })?;

    // Limbo: retained at the final threshold but eliminated at the upper threshold.
    let limbo = match config.upper_threshold {
        None => Vec::new(),
        Some(upper) => {
            let keep_at_upper = evaluator.retained_at(upper);
            model
                .species_names()
                .filter(|name| {
                    best.retained.contains(*name)
                        && !keep_at_upper.contains(*name)
                        && !protected.contains(*name)
                })
                .map(str::to_string)
                .collect()
        }
    };
    if !limbo.is_empty() {
        info!("{} limbo species for sensitivity analysis: {:?}.", limbo.len(), limbo);
    }

    info!(
        "{} reduction: {} -> {} species, error {:.2}%.",
        M::NAME,
        model.n_species(),
        best.retained.len(),
        best.error
    );
    Ok(ReducedModel {
        model: best.model,
        error: best.error,
        path: last_written,
        limbo,
    })
}

/// The full pipeline: load, validate, sample, reduce, refine, write.
pub fn run(input: &InputConfig) -> Result<ReducedModel, ReductionError> {
    let model = io::load_model(&input.model)?;
    input.validate(&model)?;
    let config = ReductionConfig::from_input(input);
    std::fs::create_dir_all(&config.output_dir)?;

    let kin = KineticModel::new(&model)?;
    let baseline = sample(
        &kin,
        &config.conditions,
        config.num_threads,
        Some(&config.output_dir),
    )?;
    info!(
        "Baseline ignition delays: {:?} s.",
        baseline.ignition_delays
    );

    let mut reduced = match input.method {
        Some(Method::Drg) => reduce_with::<Drg>(&config, &model, &kin, &baseline)?,
        Some(Method::Drgep) => reduce_with::<Drgep>(&config, &model, &kin, &baseline)?,
        Some(Method::Pfa) => reduce_with::<Pfa>(&config, &model, &kin, &baseline)?,
        None => {
            // Sensitivity-only run: every unprotected species is in limbo.
            let protected = config.protected();
            ReducedModel {
                model: model.clone(),
                error: 0.0,
                path: None,
                limbo: model
                    .species_names()
                    .filter(|name| !protected.contains(*name))
                    .map(str::to_string)
                    .collect(),
            }
        }
    };

    if input.sensitivity_analysis {
        reduced = crate::sensitivity::refine(
            input.sensitivity_type,
            &config,
            &model,
            &baseline.ignition_delays,
            reduced,
        )?;
    }

    // Write the final model, dropping any superseded sweep artifact.
    let final_path = write_reduced(&config.output_dir, &reduced.model)?;
    if let Some(previous) = reduced.path.replace(final_path.clone()) {
        if previous != final_path {
            remove_superseded(&previous);
        }
    }
    info!(
        "Final skeletal model: {} species, {} reactions, error {:.2}% ({}).",
        reduced.model.n_species(),
        reduced.model.n_reactions(),
        reduced.error,
        final_path.display()
    );
    Ok(reduced)
}

fn write_reduced(directory: &Path, model: &Model) -> Result<PathBuf, ReductionError> {
    let path = directory.join(format!("reduced_{}sp.yaml", model.n_species()));
    io::write_model(model, &path)?;
    Ok(path)
}

fn remove_superseded(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Could not remove superseded file {}: {}.", path.display(), e);
    }
}
