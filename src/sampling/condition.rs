use crate::chem::{Element, KineticModel, Model, ReactorKind};
use crate::error::ReductionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a `reactants` composition map is given in mole or mass fractions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CompositionType {
    #[default]
    Mole,
    Mass,
}

/// One autoignition condition: reactor kind, initial thermodynamic state and
/// composition.
///
/// The composition is either an equivalence ratio with fuel and oxidizer maps, or an
/// explicit reactants map. The two styles are mutually exclusive, and mass fractions
/// cannot be combined with an equivalence ratio.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SamplingCondition {
    pub kind: ReactorKind,
    /// Initial temperature in K.
    pub temperature: f64,
    /// Initial pressure in atm.
    pub pressure: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equivalence_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fuel: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub oxidizer: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reactants: BTreeMap<String, f64>,
    #[serde(default)]
    pub composition_type: CompositionType,
    /// Optional integration end time in s (default: run to steady state).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    /// Optional cap on integrator steps (default: [`crate::sampling::DEFAULT_MAX_STEPS`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,
}

impl SamplingCondition {
    /// Validate the condition against a model; every referenced species must exist.
    pub fn validate(&self, model: &Model) -> Result<(), ReductionError> {
        if !(self.temperature > 0.0) {
            return Err(ReductionError::InvalidInput(format!(
                "initial temperature must be positive, got {}",
                self.temperature
            )));
        }
        if !(self.pressure > 0.0) {
            return Err(ReductionError::InvalidInput(format!(
                "initial pressure must be positive, got {}",
                self.pressure
            )));
        }
        if let Some(end_time) = self.end_time {
            if !(end_time > 0.0) {
                return Err(ReductionError::InvalidInput(format!(
                    "end time must be positive, got {}",
                    end_time
                )));
            }
        }

        if let Some(phi) = self.equivalence_ratio {
            if !self.reactants.is_empty() {
                return Err(ReductionError::InvalidInput(
                    "equivalence ratio cannot be combined with an explicit reactants map"
                        .to_string(),
                ));
            }
            if self.fuel.is_empty() || self.oxidizer.is_empty() {
                return Err(ReductionError::InvalidInput(
                    "equivalence ratio requires both fuel and oxidizer maps".to_string(),
                ));
            }
            if self.composition_type == CompositionType::Mass {
                return Err(ReductionError::InvalidInput(
                    "mass composition cannot be combined with an equivalence ratio".to_string(),
                ));
            }
            if !(phi > 0.0) {
                return Err(ReductionError::InvalidInput(
                    "equivalence ratio must be positive".to_string(),
                ));
            }
        } else {
            if !self.fuel.is_empty() || !self.oxidizer.is_empty() {
                return Err(ReductionError::InvalidInput(
                    "fuel/oxidizer maps cannot be combined with an explicit reactants map"
                        .to_string(),
                ));
            }
            if self.reactants.is_empty() {
                return Err(ReductionError::InvalidInput(
                    "condition defines no composition".to_string(),
                ));
            }
        }

        for (map, label) in [
            (&self.fuel, "fuel"),
            (&self.oxidizer, "oxidizer"),
            (&self.reactants, "reactants"),
        ] {
            for (name, &amount) in map {
                if !model.has_species(name) {
                    return Err(ReductionError::InvalidInput(format!(
                        "{} species `{}` is not in the model",
                        label, name
                    )));
                }
                if !(amount >= 0.0) {
                    return Err(ReductionError::InvalidInput(format!(
                        "{} amount of `{}` must be non-negative",
                        label, name
                    )));
                }
            }
            if !map.is_empty() && map.values().sum::<f64>() <= 0.0 {
                return Err(ReductionError::InvalidInput(format!(
                    "{} map sums to zero",
                    label
                )));
            }
        }
        Ok(())
    }

    /// Initial mass-fraction vector aligned with the model species order.
    pub fn initial_mass_fractions(&self, kin: &KineticModel) -> Result<Vec<f64>, ReductionError> {
        let moles = match self.equivalence_ratio {
            Some(phi) => equivalence_ratio_moles(kin, phi, &self.fuel, &self.oxidizer)?,
            None => match self.composition_type {
                CompositionType::Mole => resolve(kin, &self.reactants)?,
                CompositionType::Mass => {
                    // Mass amounts convert to moles through the molecular weights.
                    let mut amounts = resolve(kin, &self.reactants)?;
                    for (i, amount) in amounts.iter_mut().enumerate() {
                        *amount /= kin.weight(i);
                    }
                    amounts
                }
            },
        };

        let mass: f64 = moles
            .iter()
            .enumerate()
            .map(|(i, &x)| x * kin.weight(i))
            .sum();
        if !(mass > 0.0) {
            return Err(ReductionError::InvalidInput(
                "condition composition has zero total mass".to_string(),
            ));
        }
        Ok(moles
            .iter()
            .enumerate()
            .map(|(i, &x)| x * kin.weight(i) / mass)
            .collect())
    }
}

fn resolve(kin: &KineticModel, map: &BTreeMap<String, f64>) -> Result<Vec<f64>, ReductionError> {
    let mut amounts = vec![0.0; kin.n_species()];
    for (name, &amount) in map {
        let i = kin.species_index(name).ok_or_else(|| {
            ReductionError::InvalidInput(format!("species `{}` is not in the model", name))
        })?;
        amounts[i] += amount;
    }
    Ok(amounts)
}

/// Mole amounts for `phi * fuel + z * oxidizer`, where `z` balances the elemental
/// oxygen demand of the fuel against the oxygen supplied by the oxidizer at phi = 1.
fn equivalence_ratio_moles(
    kin: &KineticModel,
    phi: f64,
    fuel: &BTreeMap<String, f64>,
    oxidizer: &BTreeMap<String, f64>,
) -> Result<Vec<f64>, ReductionError> {
    // Moles of O2 consumed (positive) or supplied (negative) by one mole of a species.
    let oxygen_demand = |i: usize| -> f64 {
        let composition = kin.composition(i);
        let count = |e: Element| composition.get(&e).copied().unwrap_or(0.0);
        count(Element::C) + count(Element::H) / 4.0 - count(Element::O) / 2.0
    };

    let fuel_amounts = resolve(kin, fuel)?;
    let oxidizer_amounts = resolve(kin, oxidizer)?;

    let demand: f64 = fuel_amounts
        .iter()
        .enumerate()
        .map(|(i, &x)| x * oxygen_demand(i))
        .sum();
    let supply: f64 = oxidizer_amounts
        .iter()
        .enumerate()
        .map(|(i, &x)| -x * oxygen_demand(i))
        .sum();
    if !(demand > 0.0) {
        return Err(ReductionError::InvalidInput(
            "fuel mixture has no elemental oxygen demand".to_string(),
        ));
    }
    if !(supply > 0.0) {
        return Err(ReductionError::InvalidInput(
            "oxidizer mixture supplies no oxygen".to_string(),
        ));
    }

    let z = demand / supply;
    Ok(fuel_amounts
        .iter()
        .zip(&oxidizer_amounts)
        .map(|(&f, &o)| phi * f + z * o)
        .collect())
}
