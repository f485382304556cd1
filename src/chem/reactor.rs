//! Homogeneous batch reactors with an embedded Cash-Karp Runge-Kutta 4(5) integrator.

use crate::chem::kinetics::KineticModel;
use crate::chem::thermo::GAS_CONSTANT;
use crate::error::ReductionError;
use serde::{Deserialize, Serialize};

/// The two reactor formulations supported by the autoignition sampler.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReactorKind {
    ConstantVolume,
    ConstantPressure,
}

/// Relative tolerance of the adaptive step controller.
const RELATIVE_TOLERANCE: f64 = 1e-6;
/// Absolute tolerance of the adaptive step controller.
const ABSOLUTE_TOLERANCE: f64 = 1e-12;
/// The integration fails once the controller rejects steps below this size (s).
const MIN_STEP: f64 = 1e-16;
/// Step-size ceiling; keeps quiescent mixtures from growing the step unboundedly.
const MAX_STEP: f64 = 1e4;
const INITIAL_STEP: f64 = 1e-9;
const MAX_STEP_GROWTH: f64 = 5.0;

/// A homogeneous reactor advancing `(T, Y_1..Y_n)` in time.
///
/// Constant-volume reactors conserve mass density; constant-pressure reactors conserve
/// pressure. Both assume ideal-gas mixtures.
pub struct Reactor<'m> {
    kin: &'m KineticModel,
    kind: ReactorKind,
    /// Fixed density (constant-volume) in kg/m^3.
    density: f64,
    /// Fixed pressure (constant-pressure) in Pa.
    pressure: f64,
    time: f64,
    /// Integration state: `[T, Y_1, .., Y_n]`.
    state: Vec<f64>,
    step_size: f64,
}

impl<'m> Reactor<'m> {
    /// Create a reactor at the initial state (T in K, P in Pa, Y mass fractions).
    pub fn new(
        kin: &'m KineticModel,
        kind: ReactorKind,
        temperature: f64,
        pressure: f64,
        mass_fractions: Vec<f64>,
    ) -> Reactor<'m> {
        debug_assert_eq!(mass_fractions.len(), kin.n_species());
        let density = kin.density(temperature, pressure, &mass_fractions);
        let mut state = Vec::with_capacity(1 + mass_fractions.len());
        state.push(temperature);
        state.extend(mass_fractions);
        Reactor {
            kin,
            kind,
            density,
            pressure,
            time: 0.0,
            state,
            step_size: INITIAL_STEP,
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn temperature(&self) -> f64 {
        self.state[0]
    }

    pub fn mass_fractions(&self) -> &[f64] {
        &self.state[1..]
    }

    /// Current pressure in Pa. Recomputed from the ideal-gas law for constant-volume
    /// reactors, fixed otherwise.
    pub fn pressure(&self) -> f64 {
        match self.kind {
            ReactorKind::ConstantPressure => self.pressure,
            ReactorKind::ConstantVolume => {
                let t = self.temperature();
                self.density * GAS_CONSTANT * t / self.kin.mean_molecular_weight(self.mass_fractions())
            }
        }
    }

    /// Largest current state derivatives, `(|dT/dt|, max_i |dY_i/dt|)`.
    ///
    /// Used by the sampler to detect steady state after ignition.
    pub fn derivative_norms(&self) -> (f64, f64) {
        let rhs = self.derivatives(&self.state);
        let dt = rhs[0].abs();
        let dy = rhs[1..].iter().fold(0.0_f64, |m, d| m.max(d.abs()));
        (dt, dy)
    }

    /// Right-hand side of the governing equations for a state `[T, Y..]`.
    fn derivatives(&self, state: &[f64]) -> Vec<f64> {
        let temperature = state[0];
        let mass_fractions = &state[1..];
        let n = self.kin.n_species();

        let (pressure, density) = match self.kind {
            ReactorKind::ConstantVolume => {
                let p = self.density * GAS_CONSTANT * temperature
                    / self.kin.mean_molecular_weight(mass_fractions);
                (p, self.density)
            }
            ReactorKind::ConstantPressure => (
                self.pressure,
                self.kin.density(temperature, self.pressure, mass_fractions),
            ),
        };

        let production = self.kin.production_rates(temperature, pressure, mass_fractions);

        let mut rhs = vec![0.0; 1 + n];
        for i in 0..n {
            rhs[1 + i] = production[i] * self.kin.weight(i) / density;
        }

        // Energy equation: rho * c * dT/dt = -sum_i wdot_i * e_i, with (c, e) the
        // constant-volume or constant-pressure specific heat and molar energy.
        let rt = GAS_CONSTANT * temperature;
        let mut heat_capacity = 0.0;
        let mut energy_rate = 0.0;
        for i in 0..n {
            let cp_r = self.kin.thermo(i).cp_r(temperature);
            let h = self.kin.thermo(i).h_rt(temperature) * rt;
            match self.kind {
                ReactorKind::ConstantVolume => {
                    heat_capacity +=
                        mass_fractions[i].max(0.0) * (cp_r - 1.0) * GAS_CONSTANT / self.kin.weight(i);
                    energy_rate += production[i] * (h - rt);
                }
                ReactorKind::ConstantPressure => {
                    heat_capacity +=
                        mass_fractions[i].max(0.0) * cp_r * GAS_CONSTANT / self.kin.weight(i);
                    energy_rate += production[i] * h;
                }
            }
        }
        rhs[0] = -energy_rate / (density * heat_capacity);
        rhs
    }

    /// Advance by one accepted adaptive step.
    pub fn step(&mut self) -> Result<(), ReductionError> {
        loop {
            let (next, error_norm) = self.attempt(self.step_size)?;
            if error_norm <= 1.0 {
                self.time += self.step_size;
                self.state = next;
                let growth = if error_norm > 0.0 {
                    (0.9 * error_norm.powf(-0.2)).min(MAX_STEP_GROWTH)
                } else {
                    MAX_STEP_GROWTH
                };
                self.step_size = (self.step_size * growth).min(MAX_STEP);
                if !(self.state[0] > 0.0) || !self.state[0].is_finite() {
                    return Err(ReductionError::SimulationFailure(format!(
                        "temperature became invalid ({}) at t = {:.6e} s",
                        self.state[0], self.time
                    )));
                }
                return Ok(());
            }
            self.step_size *= (0.9 * error_norm.powf(-0.25)).max(0.1);
            if self.step_size < MIN_STEP {
                return Err(ReductionError::SimulationFailure(format!(
                    "step size underflow at t = {:.6e} s",
                    self.time
                )));
            }
        }
    }

    /// One Cash-Karp trial step; returns the candidate state and its error norm.
    fn attempt(&self, h: f64) -> Result<(Vec<f64>, f64), ReductionError> {
        // Cash-Karp tableau.
        const A: [[f64; 5]; 5] = [
            [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
            [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
            [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0, 0.0, 0.0],
            [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0, 0.0],
            [
                1631.0 / 55296.0,
                175.0 / 512.0,
                575.0 / 13824.0,
                44275.0 / 110592.0,
                253.0 / 4096.0,
            ],
        ];
        const B5: [f64; 6] = [
            37.0 / 378.0,
            0.0,
            250.0 / 621.0,
            125.0 / 594.0,
            0.0,
            512.0 / 1771.0,
        ];
        const B4: [f64; 6] = [
            2825.0 / 27648.0,
            0.0,
            18575.0 / 48384.0,
            13525.0 / 55296.0,
            277.0 / 14336.0,
            1.0 / 4.0,
        ];

        let dim = self.state.len();
        let mut k = Vec::with_capacity(6);
        k.push(self.derivatives(&self.state));
        for stage in 0..5 {
            let mut probe = self.state.clone();
            for (s, ks) in k.iter().enumerate() {
                let a = A[stage][s];
                if a == 0.0 {
                    continue;
                }
                for i in 0..dim {
                    probe[i] += h * a * ks[i];
                }
            }
            k.push(self.derivatives(&probe));
        }

        let mut next = self.state.clone();
        let mut error_norm = 0.0_f64;
        for i in 0..dim {
            let mut high = 0.0;
            let mut low = 0.0;
            for s in 0..6 {
                high += B5[s] * k[s][i];
                low += B4[s] * k[s][i];
            }
            next[i] += h * high;
            if !next[i].is_finite() {
                return Err(ReductionError::SimulationFailure(format!(
                    "non-finite state component at t = {:.6e} s",
                    self.time
                )));
            }
            let scale = ABSOLUTE_TOLERANCE + RELATIVE_TOLERANCE * self.state[i].abs().max(next[i].abs());
            error_norm = error_norm.max((h * (high - low)).abs() / scale);
        }
        Ok((next, error_norm))
    }
}
