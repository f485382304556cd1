use crate::error::ReductionError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Chemical elements supported by the model schema.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Element {
    H,
    C,
    N,
    O,
    Ar,
    He,
}

impl Element {
    /// Standard atomic weight in kg/mol.
    pub fn atomic_weight(self) -> f64 {
        match self {
            Element::H => 1.008e-3,
            Element::C => 12.011e-3,
            Element::N => 14.007e-3,
            Element::O => 15.999e-3,
            Element::Ar => 39.95e-3,
            Element::He => 4.0026e-3,
        }
    }
}

/// NASA-7 polynomial thermodynamic data: two coefficient sets split at `t_mid`.
///
/// Coefficient layout follows the usual convention: `a[0..5]` enter cp/R, `a[5]`
/// is the enthalpy constant and `a[6]` the entropy constant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Nasa7 {
    pub t_min: f64,
    pub t_mid: f64,
    pub t_max: f64,
    pub low: [f64; 7],
    pub high: [f64; 7],
}

/// Lennard-Jones style transport parameters. Carried through reduction unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transport {
    /// Well depth in K.
    pub well_depth: f64,
    /// Collision diameter in Angstrom.
    pub diameter: f64,
    #[serde(default)]
    pub dipole: f64,
    #[serde(default)]
    pub polarizability: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Species {
    pub name: String,
    pub composition: BTreeMap<Element, f64>,
    pub thermo: Nasa7,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
}

impl Species {
    /// Molecular weight in kg/mol, from the element composition.
    pub fn molecular_weight(&self) -> f64 {
        self.composition
            .iter()
            .map(|(element, count)| element.atomic_weight() * count)
            .sum()
    }
}

/// Modified Arrhenius rate coefficient `k = A * T^b * exp(-E / RT)`.
///
/// `A` is in SI concentration units (mol/m^3) for the reaction order, `E` in J/mol.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Arrhenius {
    pub a: f64,
    pub b: f64,
    pub e: f64,
}

/// Troe falloff blending parameters. `t2` is the optional fourth parameter.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Troe {
    pub a: f64,
    pub t3: f64,
    pub t1: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t2: Option<f64>,
}

/// Collision partner efficiencies for three-body and falloff reactions.
///
/// `default_efficiency` applies to every species without an explicit entry. A reaction
/// with an explicit third body is expressed as a zero default with a single entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ThirdBody {
    #[serde(default = "default_efficiency_one")]
    pub default_efficiency: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub efficiencies: BTreeMap<String, f64>,
}

fn default_efficiency_one() -> f64 {
    1.0
}

impl Default for ThirdBody {
    fn default() -> Self {
        ThirdBody {
            default_efficiency: 1.0,
            efficiencies: BTreeMap::new(),
        }
    }
}

impl ThirdBody {
    /// True once no collision partner can contribute: the default efficiency is zero
    /// and the efficiency map is empty.
    pub fn is_vacuous(&self) -> bool {
        self.default_efficiency == 0.0 && self.efficiencies.is_empty()
    }
}

/// The rate law of a reaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RateModel {
    /// Plain mass-action kinetics.
    Elementary { rate: Arrhenius },
    /// Mass-action kinetics scaled by the effective third-body concentration.
    ThreeBody {
        rate: Arrhenius,
        #[serde(default)]
        third_body: ThirdBody,
    },
    /// Pressure-dependent blend of a low- and high-pressure limit; Lindemann when no
    /// Troe block is present.
    Falloff {
        high: Arrhenius,
        low: Arrhenius,
        #[serde(default)]
        third_body: ThirdBody,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        troe: Option<Troe>,
    },
}

impl RateModel {
    pub fn third_body(&self) -> Option<&ThirdBody> {
        match self {
            RateModel::Elementary { .. } => None,
            RateModel::ThreeBody { third_body, .. } => Some(third_body),
            RateModel::Falloff { third_body, .. } => Some(third_body),
        }
    }

    pub fn third_body_mut(&mut self) -> Option<&mut ThirdBody> {
        match self {
            RateModel::Elementary { .. } => None,
            RateModel::ThreeBody { third_body, .. } => Some(third_body),
            RateModel::Falloff { third_body, .. } => Some(third_body),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Reactant stoichiometric coefficients, keyed by species name.
    pub reactants: BTreeMap<String, f64>,
    /// Product stoichiometric coefficients, keyed by species name.
    pub products: BTreeMap<String, f64>,
    pub rate: RateModel,
    #[serde(default = "default_true")]
    pub reversible: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
}

fn default_true() -> bool {
    true
}

impl Reaction {
    /// Species names appearing as reactants or products (not efficiency-only partners).
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.reactants
            .keys()
            .chain(self.products.keys())
            .map(String::as_str)
    }

    /// True if any reactant or product is in `names`.
    pub fn references_any(&self, names: &BTreeSet<String>) -> bool {
        self.participants().any(|s| names.contains(s))
    }

    /// Conventional equation string, e.g. `2 H2 + O2 <=> 2 H2O`.
    pub fn equation(&self) -> String {
        fn side(map: &BTreeMap<String, f64>) -> String {
            let mut out = String::new();
            for (i, (name, coefficient)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(" + ");
                }
                if *coefficient != 1.0 {
                    let _ = write!(out, "{} ", coefficient);
                }
                out.push_str(name);
            }
            out
        }
        let arrow = if self.reversible { "<=>" } else { "=>" };
        format!("{} {} {}", side(&self.reactants), arrow, side(&self.products))
    }
}

/// An immutable kinetic model: an ordered species list and an ordered reaction list.
///
/// Invariant: species names are unique and every species referenced by a reaction
/// (including third-body efficiency entries) exists in the species list. The invariant
/// is established by [`Model::validate`] and preserved by trimming.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Model {
    #[serde(default)]
    pub name: String,
    pub species: Vec<Species>,
    pub reactions: Vec<Reaction>,
}

impl Model {
    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    pub fn n_reactions(&self) -> usize {
        self.reactions.len()
    }

    pub fn species_names(&self) -> impl Iterator<Item = &str> {
        self.species.iter().map(|s| s.name.as_str())
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s.name == name)
    }

    pub fn has_species(&self, name: &str) -> bool {
        self.species_index(name).is_some()
    }

    /// Check the model invariant: unique species names, no dangling references.
    pub fn validate(&self) -> Result<(), ReductionError> {
        if self.species.is_empty() {
            return Err(ReductionError::ModelConstruction(
                "model has no species".to_string(),
            ));
        }
        let mut names = BTreeSet::new();
        for species in &self.species {
            if !names.insert(species.name.as_str()) {
                return Err(ReductionError::ModelConstruction(format!(
                    "duplicate species name `{}`",
                    species.name
                )));
            }
        }
        for (k, reaction) in self.reactions.iter().enumerate() {
            for name in reaction.participants() {
                if !names.contains(name) {
                    return Err(ReductionError::ModelConstruction(format!(
                        "reaction #{} (`{}`) references undefined species `{}`",
                        k,
                        reaction.equation(),
                        name
                    )));
                }
            }
            if let Some(third_body) = reaction.rate.third_body() {
                for name in third_body.efficiencies.keys() {
                    if !names.contains(name.as_str()) {
                        return Err(ReductionError::ModelConstruction(format!(
                            "reaction #{} efficiency entry references undefined species `{}`",
                            k, name
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// The model comparator: species, reactions, stoichiometry, rate parameters,
    /// efficiencies and duplicate flags must agree. The model name is metadata and
    /// does not participate.
    pub fn equivalent(&self, other: &Model) -> bool {
        self.species == other.species && self.reactions == other.reactions
    }
}
