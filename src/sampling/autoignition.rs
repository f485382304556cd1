//! Single-condition autoignition simulation: ignition delay detection and snapshot
//! extraction along the temperature rise.

use crate::chem::thermo::ONE_ATM;
use crate::chem::{KineticModel, Reactor};
use crate::error::ReductionError;
use crate::sampling::SamplingCondition;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Ignition is the first instant the temperature exceeds T0 by this much (K).
pub const IGNITION_TEMPERATURE_RISE: f64 = 400.0;

/// Snapshots are taken every 5% of the total temperature rise.
pub const SNAPSHOTS_PER_CONDITION: usize = 20;

/// Default cap on integrator steps per condition.
pub const DEFAULT_MAX_STEPS: usize = 50_000;

/// Steady state is declared once |dT/dt| and max |dY/dt| fall below these floors.
const STEADY_TEMPERATURE_RATE: f64 = 1.0;
const STEADY_SPECIES_RATE: f64 = 1e-6;

/// One sampled thermochemical state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub temperature: f64,
    pub pressure: f64,
    pub mass_fractions: Vec<f64>,
}

/// The result of simulating one condition.
pub struct IgnitionRun {
    /// Ignition delay in s.
    pub ignition_delay: f64,
    /// Exactly [`SNAPSHOTS_PER_CONDITION`] states between T0 and T_final, in strictly
    /// increasing temperature order. Empty for metrics-only runs.
    pub snapshots: Vec<Snapshot>,
}

/// Simulate one autoignition condition.
///
/// With `collect_snapshots`, the full trajectory is recorded and post-processed into
/// the 20 evenly spaced temperature snapshots; otherwise only the ignition delay is
/// computed. `index` identifies the condition in errors and logs.
pub fn simulate(
    kin: &KineticModel,
    condition: &SamplingCondition,
    index: usize,
    collect_snapshots: bool,
) -> Result<IgnitionRun, ReductionError> {
    let y0 = condition.initial_mass_fractions(kin)?;
    let t0 = condition.temperature;
    let pressure = condition.pressure * ONE_ATM;
    let max_steps = condition.max_steps.unwrap_or(DEFAULT_MAX_STEPS);

    let mut reactor = Reactor::new(kin, condition.kind, t0, pressure, y0);
    let mut history: Vec<(f64, Snapshot)> = Vec::new();
    let mut ignition_delay: Option<f64> = None;
    let no_ignition = || ReductionError::NoIgnition {
        index,
        temperature: condition.temperature,
        pressure: condition.pressure,
    };

    for step in 0..max_steps {
        reactor.step()?;

        if collect_snapshots {
            history.push((
                reactor.time(),
                Snapshot {
                    temperature: reactor.temperature(),
                    pressure: reactor.pressure(),
                    mass_fractions: reactor.mass_fractions().to_vec(),
                },
            ));
        }

        if ignition_delay.is_none()
            && reactor.temperature() > t0 + IGNITION_TEMPERATURE_RISE
        {
            ignition_delay = Some(reactor.time());
            debug!(
                "Condition #{} ignited at t = {:.6e} s ({} steps).",
                index,
                reactor.time(),
                step + 1
            );
        }

        if let Some(end_time) = condition.end_time {
            if reactor.time() >= end_time {
                break;
            }
        } else if ignition_delay.is_some() {
            let (temperature_rate, species_rate) = reactor.derivative_norms();
            if temperature_rate < STEADY_TEMPERATURE_RATE && species_rate < STEADY_SPECIES_RATE {
                trace!(
                    "Condition #{} reached steady state at t = {:.6e} s.",
                    index,
                    reactor.time()
                );
                break;
            }
        }
    }

    let ignition_delay = ignition_delay.ok_or_else(no_ignition)?;
    let snapshots = if collect_snapshots {
        extract_snapshots(t0, &history, index)?
    } else {
        Vec::new()
    };
    Ok(IgnitionRun {
        ignition_delay,
        snapshots,
    })
}

/// Pick the earliest recorded state at or above each of the 20 temperature levels
/// T0 + k * 5% * (T_final - T0). At most one state per timestep is used, which keeps
/// the snapshot temperatures strictly increasing.
fn extract_snapshots(
    t0: f64,
    history: &[(f64, Snapshot)],
    index: usize,
) -> Result<Vec<Snapshot>, ReductionError> {
    let t_final = history
        .last()
        .map(|(_, s)| s.temperature)
        .ok_or_else(|| {
            ReductionError::SimulationFailure(format!("condition #{} recorded no states", index))
        })?;
    let delta = t_final - t0;

    let mut snapshots = Vec::with_capacity(SNAPSHOTS_PER_CONDITION);
    let mut last_temperature = t0;
    for (_, state) in history {
        if snapshots.len() == SNAPSHOTS_PER_CONDITION {
            break;
        }
        let level = t0 + delta * 0.05 * (snapshots.len() + 1) as f64;
        if state.temperature >= level && state.temperature > last_temperature {
            last_temperature = state.temperature;
            snapshots.push(state.clone());
        }
    }

    if snapshots.len() != SNAPSHOTS_PER_CONDITION {
        return Err(ReductionError::SimulationFailure(format!(
            "condition #{} produced {} of {} snapshots",
            index,
            snapshots.len(),
            SNAPSHOTS_PER_CONDITION
        )));
    }
    Ok(snapshots)
}
