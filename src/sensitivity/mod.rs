//! Sensitivity-analysis refinement of a reduced model.
//!
//! The refiner re-evaluates "limbo" species one at a time against the detailed-model
//! baseline and removes the least impactful ones until the next removal would push the
//! error over the tolerance. Targets and safe species are never candidates.

use crate::chem::Model;
use crate::error::ReductionError;
use crate::reduction::{ReducedModel, ReductionConfig, candidate_error};
use crate::trim::trim;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The two refinement strategies.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityType {
    /// Rank all limbo species once by their individual error increase, then remove
    /// them greedily in that order.
    #[default]
    Initial,
    /// Re-rank the remaining limbo species against the current model before every
    /// removal.
    Greedy,
}

/// Refine `reduced` by removing limbo species while the error stays within tolerance.
///
/// Trial removals always trim the *detailed* model by the accumulated exclusion set,
/// so earlier removals are reflected in later trials. A failed trial simulation
/// counts as a 100% error and therefore keeps its species.
pub fn refine(
    mode: SensitivityType,
    config: &ReductionConfig,
    detailed: &Model,
    baseline: &[f64],
    reduced: ReducedModel,
) -> Result<ReducedModel, ReductionError> {
    let protected = config.protected();
    let limbo: Vec<String> = reduced
        .limbo
        .iter()
        .filter(|name| !protected.contains(*name) && reduced.model.has_species(name))
        .cloned()
        .collect();
    if limbo.is_empty() {
        debug!("No limbo species, skipping sensitivity analysis.");
        return Ok(reduced);
    }
    info!(
        "Sensitivity analysis ({:?}) over {} limbo species.",
        mode,
        limbo.len()
    );

    // Everything the sweep already removed from the detailed model.
    let mut exclusion: BTreeSet<String> = detailed
        .species_names()
        .filter(|name| !reduced.model.has_species(name))
        .map(str::to_string)
        .collect();

    let mut current_error = reduced.error;

    let trial = |exclusion: &BTreeSet<String>| -> Result<f64, ReductionError> {
        let candidate = trim(detailed, exclusion)?;
        candidate_error(&candidate, &config.conditions, config.num_threads, baseline)
    };

    match mode {
        SensitivityType::Initial => {
            // Rank once: error increase of each individual removal on top of the
            // current reduced model.
            let mut ranked: Vec<(String, f64)> = Vec::with_capacity(limbo.len());
            for name in limbo {
                let mut with_species = exclusion.clone();
                with_species.insert(name.clone());
                let error = trial(&with_species)?;
                debug!(
                    "Limbo `{}`: individual error {:.2}% (delta {:.2}%).",
                    name,
                    error,
                    error - current_error
                );
                ranked.push((name, error - current_error));
            }
            ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

            for (name, _) in ranked {
                let mut with_species = exclusion.clone();
                with_species.insert(name.clone());
                let error = trial(&with_species)?;
                if error > config.tolerance {
                    info!(
                        "Keeping `{}` and stopping: error {:.2}% would exceed tolerance.",
                        name, error
                    );
                    break;
                }
                info!("Removed `{}` (error {:.2}%).", name, error);
                exclusion = with_species;
                current_error = error;
            }
        }
        SensitivityType::Greedy => {
            let mut remaining = limbo;
            while !remaining.is_empty() {
                // Evaluate every remaining candidate against the current model; ties
                // keep the earliest limbo entry.
                let mut best: Option<(usize, f64)> = None;
                for (position, name) in remaining.iter().enumerate() {
                    let mut with_species = exclusion.clone();
                    with_species.insert(name.clone());
                    let error = trial(&with_species)?;
                    if best.is_none_or(|(_, e)| error < e) {
                        best = Some((position, error));
                    }
                }
                let (position, error) = best.expect("remaining is non-empty");
                let name = remaining.remove(position);
                if error > config.tolerance {
                    info!(
                        "Keeping `{}` and stopping: error {:.2}% exceeds tolerance.",
                        name, error
                    );
                    break;
                }
                info!("Removed `{}` (error {:.2}%).", name, error);
                exclusion.insert(name);
                current_error = error;
            }
        }
    }

    let refined = trim(detailed, &exclusion)?;
    info!(
        "Sensitivity analysis finished: {} species, error {:.2}%.",
        refined.n_species(),
        current_error
    );
    Ok(ReducedModel {
        model: refined,
        error: current_error,
        path: None,
        limbo: Vec::new(),
    })
}
