//! Shared test fixtures: a small hydrogen-like toy mechanism and helpers.
//!
//! # Toy mechanism layout
//!
//! Seven species, five reactions. The entire heat release runs through
//!
//! ```text
//! R0:  2 H2 + O2 => 2 H2O          (fast, drives ignition)
//! ```
//!
//! plus a deliberately negligible H2O2/O side chain (pre-exponentials ten orders of
//! magnitude below R0):
//!
//! ```text
//! R1:  H2 + O2 => H2O2             (negligible)
//! R2:  H2O2 + H2 <=> 2 H2O         (negligible, reversible)
//! R3:  H2O2 + M => H2O + O         (negligible, three-body)
//! R4:  O + H2 => H2O               (negligible)
//! ```
//!
//! `N2` is an inert bath species (it only appears as a third-body efficiency) and
//! `HE` is fully inert. A graph-based reduction from targets {H2, O2} with safe
//! species {N2} should therefore retain {H2, O2, H2O, N2} and eliminate the side
//! chain and HE, at negligible ignition-delay error.

use crate::chem::thermo::GAS_CONSTANT;
use crate::chem::{
    Arrhenius, Element, Model, Nasa7, RateModel, Reaction, ReactorKind, Species, ThirdBody,
    Transport,
};
use crate::sampling::{CompositionType, SamplingCondition};
use std::collections::BTreeMap;

/// Initialize env_logger for tests. Safe to call multiple times.
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// Assert two floats agree within an absolute tolerance.
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} within {} of {}, difference {}",
        actual,
        tolerance,
        expected,
        actual - expected
    );
}

/// Constant-cp NASA-7 coefficients reproducing the given reference enthalpy (J/mol)
/// and entropy (J/mol/K) at 298.15 K.
fn const_cp(cp_r: f64, h298: f64, s298: f64) -> Nasa7 {
    let a5 = h298 / GAS_CONSTANT - cp_r * 298.15;
    let a6 = s298 / GAS_CONSTANT - cp_r * 298.15_f64.ln();
    let coefficients = [cp_r, 0.0, 0.0, 0.0, 0.0, a5, a6];
    Nasa7 {
        t_min: 200.0,
        t_mid: 1000.0,
        t_max: 6000.0,
        low: coefficients,
        high: coefficients,
    }
}

fn species(
    name: &str,
    composition: &[(Element, f64)],
    cp_r: f64,
    h298: f64,
    s298: f64,
) -> Species {
    Species {
        name: name.to_string(),
        composition: composition.iter().copied().collect(),
        thermo: const_cp(cp_r, h298, s298),
        transport: None,
    }
}

fn stoich(terms: &[(&str, f64)]) -> BTreeMap<String, f64> {
    terms.iter().map(|(name, nu)| (name.to_string(), *nu)).collect()
}

fn irreversible(
    reactants: &[(&str, f64)],
    products: &[(&str, f64)],
    a: f64,
    e: f64,
) -> Reaction {
    Reaction {
        reactants: stoich(reactants),
        products: stoich(products),
        rate: RateModel::Elementary {
            rate: Arrhenius { a, b: 0.0, e },
        },
        reversible: false,
        duplicate: false,
    }
}

/// The seven-species toy mechanism described in the module docs.
pub fn toy_model() -> Model {
    let mut h2 = species("H2", &[(Element::H, 2.0)], 3.5, 0.0, 130.68);
    h2.transport = Some(Transport {
        well_depth: 38.0,
        diameter: 2.92,
        dipole: 0.0,
        polarizability: 0.79,
    });
    let mut o2 = species("O2", &[(Element::O, 2.0)], 3.5, 0.0, 205.15);
    o2.transport = Some(Transport {
        well_depth: 107.4,
        diameter: 3.46,
        dipole: 0.0,
        polarizability: 1.6,
    });

    let species_list = vec![
        h2,
        o2,
        species(
            "H2O",
            &[(Element::H, 2.0), (Element::O, 1.0)],
            4.0,
            -241_826.0,
            188.84,
        ),
        species(
            "H2O2",
            &[(Element::H, 2.0), (Element::O, 2.0)],
            5.0,
            -135_880.0,
            232.95,
        ),
        species("O", &[(Element::O, 1.0)], 2.5, 249_170.0, 161.06),
        species("N2", &[(Element::N, 2.0)], 3.5, 0.0, 191.61),
        species("HE", &[(Element::He, 1.0)], 2.5, 0.0, 126.15),
    ];

    let reactions = vec![
        // R0: the heat-release path.
        irreversible(&[("H2", 2.0), ("O2", 1.0)], &[("H2O", 2.0)], 3.0e6, 1.3e5),
        // R1..R4: the negligible H2O2/O side chain.
        irreversible(&[("H2", 1.0), ("O2", 1.0)], &[("H2O2", 1.0)], 1.0e-4, 1.3e5),
        Reaction {
            reactants: stoich(&[("H2O2", 1.0), ("H2", 1.0)]),
            products: stoich(&[("H2O", 2.0)]),
            rate: RateModel::Elementary {
                rate: Arrhenius {
                    a: 1.0e-3,
                    b: 0.0,
                    e: 5.0e4,
                },
            },
            reversible: true,
            duplicate: false,
        },
        Reaction {
            reactants: stoich(&[("H2O2", 1.0)]),
            products: stoich(&[("H2O", 1.0), ("O", 1.0)]),
            rate: RateModel::ThreeBody {
                rate: Arrhenius {
                    a: 1.0e-6,
                    b: 0.0,
                    e: 8.0e4,
                },
                third_body: ThirdBody {
                    default_efficiency: 1.0,
                    efficiencies: [("H2O".to_string(), 6.0), ("N2".to_string(), 1.5)]
                        .into_iter()
                        .collect(),
                },
            },
            reversible: false,
            duplicate: false,
        },
        irreversible(&[("O", 1.0), ("H2", 1.0)], &[("H2O", 1.0)], 1.0e-4, 4.0e4),
    ];

    Model {
        name: "h2-toy".to_string(),
        species: species_list,
        reactions,
    }
}

/// A three-species model with the single reaction `A + B => C`, mass balanced.
pub fn tiny_model() -> Model {
    Model {
        name: "tiny".to_string(),
        species: vec![
            species("A", &[(Element::H, 2.0)], 3.5, 0.0, 130.0),
            species("B", &[(Element::O, 1.0)], 2.5, 249_170.0, 161.06),
            species(
                "C",
                &[(Element::H, 2.0), (Element::O, 1.0)],
                4.0,
                -241_826.0,
                188.84,
            ),
        ],
        reactions: vec![irreversible(
            &[("A", 1.0), ("B", 1.0)],
            &[("C", 1.0)],
            2.0e2,
            6.0e4,
        )],
    }
}

/// A two-species Lindemann falloff model `2 A (+M) => A2` with equal low- and
/// high-pressure pre-exponentials, so the reduced pressure equals the total
/// concentration.
pub fn falloff_model() -> Model {
    Model {
        name: "falloff".to_string(),
        species: vec![
            species("A", &[(Element::H, 2.0)], 3.5, 0.0, 130.68),
            species("A2", &[(Element::H, 4.0)], 4.5, -50_000.0, 200.0),
        ],
        reactions: vec![Reaction {
            reactants: stoich(&[("A", 2.0)]),
            products: stoich(&[("A2", 1.0)]),
            rate: RateModel::Falloff {
                high: Arrhenius {
                    a: 1.0e5,
                    b: 0.0,
                    e: 0.0,
                },
                low: Arrhenius {
                    a: 1.0e5,
                    b: 0.0,
                    e: 0.0,
                },
                third_body: ThirdBody::default(),
                troe: None,
            },
            reversible: false,
            duplicate: false,
        }],
    }
}

/// A stoichiometric constant-volume hydrogen/air-style condition at 1 atm.
pub fn stoichiometric_condition(temperature: f64) -> SamplingCondition {
    SamplingCondition {
        kind: ReactorKind::ConstantVolume,
        temperature,
        pressure: 1.0,
        equivalence_ratio: Some(1.0),
        fuel: [("H2".to_string(), 1.0)].into_iter().collect(),
        oxidizer: [("O2".to_string(), 1.0), ("N2".to_string(), 3.76)]
            .into_iter()
            .collect(),
        reactants: BTreeMap::new(),
        composition_type: CompositionType::Mole,
        end_time: None,
        max_steps: None,
    }
}

/// A pure-nitrogen charge that can never ignite; capped at a small step count.
pub fn pure_nitrogen_condition() -> SamplingCondition {
    SamplingCondition {
        kind: ReactorKind::ConstantVolume,
        temperature: 1000.0,
        pressure: 1.0,
        equivalence_ratio: None,
        fuel: BTreeMap::new(),
        oxidizer: BTreeMap::new(),
        reactants: [("N2".to_string(), 1.0)].into_iter().collect(),
        composition_type: CompositionType::Mole,
        end_time: None,
        max_steps: Some(2_000),
    }
}

/// Initial mass fractions of [`stoichiometric_condition`] for a compiled toy model.
pub fn stoichiometric_mass_fractions(kin: &crate::chem::KineticModel) -> Vec<f64> {
    stoichiometric_condition(1000.0)
        .initial_mass_fractions(kin)
        .expect("toy condition must resolve")
}
