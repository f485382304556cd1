//! Indexed kinetics evaluation: concentrations, rate constants, rates of progress and
//! net production rates at a given thermochemical state.

use crate::chem::model::{Arrhenius, Element, Model, Nasa7, RateModel, Troe};
use crate::chem::thermo::{GAS_CONSTANT, REFERENCE_PRESSURE};
use crate::error::ReductionError;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Collision-partner efficiencies resolved to species indices.
struct Efficiencies {
    default: f64,
    overrides: Vec<(usize, f64)>,
}

impl Efficiencies {
    /// Effective third-body concentration `[M] = sum_i e_i * c_i`.
    fn effective_concentration(&self, concentrations: &[f64]) -> f64 {
        let mut m = self.default * concentrations.iter().sum::<f64>();
        for &(i, efficiency) in &self.overrides {
            m += (efficiency - self.default) * concentrations[i];
        }
        m
    }
}

enum RateKind {
    Elementary(Arrhenius),
    ThreeBody {
        rate: Arrhenius,
        efficiencies: Efficiencies,
    },
    Falloff {
        high: Arrhenius,
        low: Arrhenius,
        efficiencies: Efficiencies,
        troe: Option<Troe>,
    },
}

struct IndexedReaction {
    reactants: Vec<(usize, f64)>,
    products: Vec<(usize, f64)>,
    /// Net coefficients (products minus reactants) of every participating species.
    net: Vec<(usize, f64)>,
    /// All participating species indices, each listed once.
    participants: Vec<usize>,
    sum_net: f64,
    reversible: bool,
    kind: RateKind,
}

/// A [`Model`] compiled into index-based form for evaluation.
///
/// The compiled form is immutable; reduced candidate models are compiled anew.
pub struct KineticModel {
    species_names: Vec<String>,
    weights: Vec<f64>,
    compositions: Vec<BTreeMap<Element, f64>>,
    thermo: Vec<Nasa7>,
    reactions: Vec<IndexedReaction>,
    nu_reactant: Array2<f64>,
    nu_product: Array2<f64>,
    nu_net: Array2<f64>,
}

impl KineticModel {
    pub fn new(model: &Model) -> Result<KineticModel, ReductionError> {
        model.validate()?;

        let index: BTreeMap<&str, usize> = model
            .species_names()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();
        let n_species = model.n_species();
        let n_reactions = model.n_reactions();

        let mut nu_reactant = Array2::zeros((n_species, n_reactions));
        let mut nu_product = Array2::zeros((n_species, n_reactions));
        let mut reactions = Vec::with_capacity(n_reactions);

        for (k, reaction) in model.reactions.iter().enumerate() {
            let resolve = |map: &BTreeMap<String, f64>| -> Vec<(usize, f64)> {
                map.iter().map(|(name, &nu)| (index[name.as_str()], nu)).collect()
            };
            let reactants = resolve(&reaction.reactants);
            let products = resolve(&reaction.products);
            for &(i, nu) in &reactants {
                nu_reactant[[i, k]] += nu;
            }
            for &(i, nu) in &products {
                nu_product[[i, k]] += nu;
            }

            let mut net: BTreeMap<usize, f64> = BTreeMap::new();
            for &(i, nu) in &products {
                *net.entry(i).or_insert(0.0) += nu;
            }
            for &(i, nu) in &reactants {
                *net.entry(i).or_insert(0.0) -= nu;
            }
            let mut participants: Vec<usize> = net.keys().copied().collect();
            participants.sort_unstable();
            let sum_net = net.values().sum();
            let net: Vec<(usize, f64)> = net.into_iter().filter(|(_, nu)| *nu != 0.0).collect();

            let resolve_efficiencies = |third_body: &crate::chem::model::ThirdBody| Efficiencies {
                default: third_body.default_efficiency,
                overrides: third_body
                    .efficiencies
                    .iter()
                    .map(|(name, &e)| (index[name.as_str()], e))
                    .collect(),
            };
            let kind = match &reaction.rate {
                RateModel::Elementary { rate } => RateKind::Elementary(*rate),
                RateModel::ThreeBody { rate, third_body } => RateKind::ThreeBody {
                    rate: *rate,
                    efficiencies: resolve_efficiencies(third_body),
                },
                RateModel::Falloff {
                    high,
                    low,
                    third_body,
                    troe,
                } => RateKind::Falloff {
                    high: *high,
                    low: *low,
                    efficiencies: resolve_efficiencies(third_body),
                    troe: *troe,
                },
            };

            reactions.push(IndexedReaction {
                reactants,
                products,
                net,
                participants,
                sum_net,
                reversible: reaction.reversible,
                kind,
            });
        }

        let nu_net = &nu_product - &nu_reactant;
        Ok(KineticModel {
            species_names: model.species_names().map(str::to_string).collect(),
            weights: model.species.iter().map(|s| s.molecular_weight()).collect(),
            compositions: model.species.iter().map(|s| s.composition.clone()).collect(),
            thermo: model.species.iter().map(|s| s.thermo.clone()).collect(),
            reactions,
            nu_reactant,
            nu_product,
            nu_net,
        })
    }

    pub fn n_species(&self) -> usize {
        self.species_names.len()
    }

    pub fn n_reactions(&self) -> usize {
        self.reactions.len()
    }

    pub fn species_names(&self) -> &[String] {
        &self.species_names
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species_names.iter().position(|s| s == name)
    }

    /// Molecular weight of species `i` in kg/mol.
    pub fn weight(&self, i: usize) -> f64 {
        self.weights[i]
    }

    pub fn composition(&self, i: usize) -> &BTreeMap<Element, f64> {
        &self.compositions[i]
    }

    pub fn thermo(&self, i: usize) -> &Nasa7 {
        &self.thermo[i]
    }

    /// Reactant stoichiometric coefficients, species by reaction.
    pub fn nu_reactant(&self) -> &Array2<f64> {
        &self.nu_reactant
    }

    /// Product stoichiometric coefficients, species by reaction.
    pub fn nu_product(&self) -> &Array2<f64> {
        &self.nu_product
    }

    /// Net stoichiometric coefficients, species by reaction.
    pub fn nu_net(&self) -> &Array2<f64> {
        &self.nu_net
    }

    /// Net coefficients of the species participating in reaction `k`.
    pub fn reaction_net(&self, k: usize) -> &[(usize, f64)] {
        &self.reactions[k].net
    }

    /// Indices of every species participating in reaction `k`.
    pub fn reaction_participants(&self, k: usize) -> &[usize] {
        &self.reactions[k].participants
    }

    /// Mean molecular weight of a mass-fraction composition, in kg/mol.
    pub fn mean_molecular_weight(&self, mass_fractions: &[f64]) -> f64 {
        let inverse: f64 = mass_fractions
            .iter()
            .zip(&self.weights)
            .map(|(&y, &w)| y.max(0.0) / w)
            .sum();
        1.0 / inverse
    }

    /// Mass density in kg/m^3 at (T, P) for the given mass fractions.
    pub fn density(&self, temperature: f64, pressure: f64, mass_fractions: &[f64]) -> f64 {
        pressure * self.mean_molecular_weight(mass_fractions) / (GAS_CONSTANT * temperature)
    }

    /// Molar concentrations in mol/m^3. Negative mass fractions are clamped to zero.
    pub fn concentrations(
        &self,
        temperature: f64,
        pressure: f64,
        mass_fractions: &[f64],
    ) -> Vec<f64> {
        let density = self.density(temperature, pressure, mass_fractions);
        mass_fractions
            .iter()
            .zip(&self.weights)
            .map(|(&y, &w)| density * y.max(0.0) / w)
            .collect()
    }

    /// Net rates of progress of every reaction, mol/(m^3 s).
    pub fn rates_of_progress(
        &self,
        temperature: f64,
        pressure: f64,
        mass_fractions: &[f64],
    ) -> Vec<f64> {
        let concentrations = self.concentrations(temperature, pressure, mass_fractions);
        let g_rt: Vec<f64> = self.thermo.iter().map(|t| t.g_rt(temperature)).collect();
        // Standard-state concentration P0 / RT, used to convert Kp to Kc.
        let c0 = REFERENCE_PRESSURE / (GAS_CONSTANT * temperature);

        self.reactions
            .iter()
            .map(|reaction| {
                let (k_forward, third_body) =
                    rate_constant(&reaction.kind, temperature, &concentrations);
                if k_forward == 0.0 {
                    return 0.0;
                }
                let forward = product_of_powers(&reaction.reactants, &concentrations);
                let net = if reaction.reversible {
                    let delta_g_rt: f64 =
                        reaction.net.iter().map(|&(i, nu)| nu * g_rt[i]).sum();
                    let equilibrium = (-delta_g_rt).exp() * c0.powf(reaction.sum_net);
                    let reverse = product_of_powers(&reaction.products, &concentrations);
                    forward - reverse / equilibrium
                } else {
                    forward
                };
                third_body * k_forward * net
            })
            .collect()
    }

    /// Net molar production rate of every species, mol/(m^3 s).
    pub fn production_rates(
        &self,
        temperature: f64,
        pressure: f64,
        mass_fractions: &[f64],
    ) -> Vec<f64> {
        let rates = Array1::from_vec(self.rates_of_progress(temperature, pressure, mass_fractions));
        self.nu_net.dot(&rates).to_vec()
    }
}

fn product_of_powers(terms: &[(usize, f64)], concentrations: &[f64]) -> f64 {
    terms
        .iter()
        .map(|&(i, nu)| {
            let c = concentrations[i];
            if nu == 1.0 { c } else { c.powf(nu) }
        })
        .product()
}

/// Forward rate constant and the multiplicative third-body factor of a reaction.
///
/// For falloff reactions the pressure dependence is folded into the rate constant and
/// the returned factor is 1.
fn rate_constant(kind: &RateKind, temperature: f64, concentrations: &[f64]) -> (f64, f64) {
    match kind {
        RateKind::Elementary(rate) => (arrhenius(rate, temperature), 1.0),
        RateKind::ThreeBody { rate, efficiencies } => (
            arrhenius(rate, temperature),
            efficiencies.effective_concentration(concentrations),
        ),
        RateKind::Falloff {
            high,
            low,
            efficiencies,
            troe,
        } => {
            let k_high = arrhenius(high, temperature);
            let k_low = arrhenius(low, temperature);
            let m = efficiencies.effective_concentration(concentrations);
            if k_high == 0.0 {
                return (0.0, 1.0);
            }
            let reduced_pressure = k_low * m / k_high;
            let blend = k_high * reduced_pressure / (1.0 + reduced_pressure);
            let f = match troe {
                None => 1.0,
                Some(troe) => troe_factor(troe, temperature, reduced_pressure),
            };
            (blend * f, 1.0)
        }
    }
}

fn arrhenius(rate: &Arrhenius, t: f64) -> f64 {
    let mut k = rate.a;
    if rate.b != 0.0 {
        k *= t.powf(rate.b);
    }
    if rate.e != 0.0 {
        k *= (-rate.e / (GAS_CONSTANT * t)).exp();
    }
    k
}

/// Troe broadening factor F(T, Pr).
fn troe_factor(troe: &Troe, t: f64, reduced_pressure: f64) -> f64 {
    let mut f_cent = (1.0 - troe.a) * (-t / troe.t3).exp() + troe.a * (-t / troe.t1).exp();
    if let Some(t2) = troe.t2 {
        f_cent += (-t2 / t).exp();
    }
    if f_cent <= 0.0 || reduced_pressure <= 0.0 {
        return 1.0;
    }
    let log_f_cent = f_cent.log10();
    let c = -0.4 - 0.67 * log_f_cent;
    let n = 0.75 - 1.27 * log_f_cent;
    let log_pr = reduced_pressure.log10();
    let f1 = (log_pr + c) / (n - 0.14 * (log_pr + c));
    10.0_f64.powf(log_f_cent / (1.0 + f1 * f1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::model::{RateModel, ThirdBody};
    use crate::chem::thermo::ONE_ATM;
    use crate::test_utils::{assert_close, falloff_model, tiny_model, toy_model};
    use std::collections::BTreeMap;

    #[test]
    fn arrhenius_evaluates_modified_form() {
        let rate = Arrhenius {
            a: 2.0e6,
            b: 1.5,
            e: 5.0e4,
        };
        let t: f64 = 1200.0;
        let expected = 2.0e6 * t.powf(1.5) * (-5.0e4 / (GAS_CONSTANT * t)).exp();
        assert_close(arrhenius(&rate, t), expected, 1e-12);
    }

    #[test]
    fn stoichiometric_matrices_are_consistent() {
        let model = toy_model();
        let kin = KineticModel::new(&model).unwrap();
        let nu = kin.nu_net();
        assert_eq!(nu.nrows(), model.n_species());
        assert_eq!(nu.ncols(), model.n_reactions());
        // 2 H2 + O2 => 2 H2O is the first reaction.
        let h2 = kin.species_index("H2").unwrap();
        let o2 = kin.species_index("O2").unwrap();
        let h2o = kin.species_index("H2O").unwrap();
        assert_eq!(nu[[h2, 0]], -2.0);
        assert_eq!(nu[[o2, 0]], -1.0);
        assert_eq!(nu[[h2o, 0]], 2.0);
        // An inert species participates in no reaction.
        let he = kin.species_index("HE").unwrap();
        assert!((0..kin.n_reactions()).all(|k| nu[[he, k]] == 0.0));
    }

    #[test]
    fn irreversible_rate_of_progress_matches_mass_action() {
        let model = tiny_model();
        let kin = KineticModel::new(&model).unwrap();
        let y = vec![0.3, 0.5, 0.2];
        let (t, p) = (1100.0, ONE_ATM);

        let c = kin.concentrations(t, p, &y);
        let rate = match &model.reactions[0].rate {
            RateModel::Elementary { rate } => *rate,
            _ => unreachable!(),
        };
        let expected = arrhenius(&rate, t) * c[0] * c[1];
        let rates = kin.rates_of_progress(t, p, &y);
        assert_close(rates[0], expected, 1e-10);
    }

    #[test]
    fn production_rates_are_stoichiometric_combination() {
        let model = toy_model();
        let kin = KineticModel::new(&model).unwrap();
        let n = kin.n_species();
        let y = vec![1.0 / n as f64; n];
        let (t, p) = (1500.0, 2.0 * ONE_ATM);

        let omega = kin.rates_of_progress(t, p, &y);
        let production = kin.production_rates(t, p, &y);
        for i in 0..n {
            let expected: f64 = (0..kin.n_reactions())
                .map(|k| kin.nu_net()[[i, k]] * omega[k])
                .sum();
            assert_close(production[i], expected, 1e-9);
        }
    }

    /// Mass is conserved by construction: sum_i W_i * wdot_i = 0 for balanced reactions.
    #[test]
    fn production_rates_conserve_mass() {
        let model = toy_model();
        let kin = KineticModel::new(&model).unwrap();
        let n = kin.n_species();
        let y = vec![1.0 / n as f64; n];
        let production = kin.production_rates(1400.0, ONE_ATM, &y);
        let mass_rate: f64 = production
            .iter()
            .enumerate()
            .map(|(i, &w)| w * kin.weight(i))
            .sum();
        let scale: f64 = production
            .iter()
            .enumerate()
            .map(|(i, &w)| (w * kin.weight(i)).abs())
            .sum();
        assert!(
            mass_rate.abs() <= 1e-10 * scale.max(1e-300),
            "net mass production {} is not negligible",
            mass_rate
        );
    }

    /// A reversible reaction at equilibrium composition has zero net rate.
    #[test]
    fn reversible_rate_vanishes_at_equilibrium() {
        let model = tiny_model();
        let mut model = model;
        model.reactions[0].reversible = true;
        let kin = KineticModel::new(&model).unwrap();
        let t = 1500.0;

        // Solve for the product concentration that balances forward and reverse flux,
        // then verify the net rate of progress vanishes there.
        let g_rt: Vec<f64> = (0..3).map(|i| kin.thermo(i).g_rt(t)).collect();
        let delta_g = g_rt[2] - g_rt[0] - g_rt[1];
        let c0 = REFERENCE_PRESSURE / (GAS_CONSTANT * t);
        // A + B <=> C: at equilibrium [C] = Kc [A][B] with Kc = exp(-dG/RT) / c0^-1.
        let kc = (-delta_g).exp() * c0.powf(-1.0);
        let (ca, cb) = (0.4, 0.7);
        let cc = kc * ca * cb;

        // Convert the concentration triple back to (T, P, Y).
        let total = ca + cb + cc;
        let p = total * GAS_CONSTANT * t;
        let mass = ca * kin.weight(0) + cb * kin.weight(1) + cc * kin.weight(2);
        let y = vec![
            ca * kin.weight(0) / mass,
            cb * kin.weight(1) / mass,
            cc * kin.weight(2) / mass,
        ];

        let rates = kin.rates_of_progress(t, p, &y);
        let forward_scale = {
            let c = kin.concentrations(t, p, &y);
            c[0] * c[1]
        };
        assert!(
            rates[0].abs() <= 1e-8 * forward_scale.max(1e-300),
            "net rate {} at equilibrium",
            rates[0]
        );
    }

    #[test]
    fn three_body_scales_with_effective_concentration() {
        let mut model = tiny_model();
        model.reactions[0].rate = match &model.reactions[0].rate {
            RateModel::Elementary { rate } => RateModel::ThreeBody {
                rate: *rate,
                third_body: ThirdBody {
                    default_efficiency: 1.0,
                    efficiencies: BTreeMap::from([("C".to_string(), 2.5)]),
                },
            },
            _ => unreachable!(),
        };
        let kin = KineticModel::new(&model).unwrap();
        let y = vec![0.2, 0.3, 0.5];
        let (t, p) = (1000.0, ONE_ATM);

        let c = kin.concentrations(t, p, &y);
        let m = c[0] + c[1] + 2.5 * c[2];
        let plain = {
            let plain_model = tiny_model();
            let plain = KineticModel::new(&plain_model).unwrap();
            plain.rates_of_progress(t, p, &y)[0]
        };
        let scaled = kin.rates_of_progress(t, p, &y)[0];
        assert_close(scaled, plain * m, 1e-9);
    }

    #[test]
    fn falloff_limits_recover_low_and_high_pressure_rates() {
        let model = falloff_model();
        let kin = KineticModel::new(&model).unwrap();
        let t = 1000.0;
        let (high, low) = match &model.reactions[0].rate {
            RateModel::Falloff { high, low, .. } => (*high, *low),
            _ => unreachable!(),
        };
        let k_high = arrhenius(&high, t);
        let k_low = arrhenius(&low, t);

        let y = vec![0.5, 0.5];
        // Low-pressure limit: k ~ k0 [M].
        let p_low = 1e-2;
        let c = kin.concentrations(t, p_low, &y);
        let m: f64 = c.iter().sum();
        let rate = kin.rates_of_progress(t, p_low, &y)[0];
        assert_close(rate / (c[0] * c[0]), k_low * m, 1e-3 * k_low * m);

        // High-pressure limit: k ~ k_inf.
        let p_high = 1e12;
        let c = kin.concentrations(t, p_high, &y);
        let rate = kin.rates_of_progress(t, p_high, &y)[0];
        assert_close(rate / (c[0] * c[0]), k_high, 1e-3 * k_high);
    }

    /// Lindemann blending at the crossover point gives exactly half the
    /// high-pressure limit.
    #[test]
    fn lindemann_midpoint_is_half_high_pressure_limit() {
        let kind = RateKind::Falloff {
            high: Arrhenius {
                a: 4.0,
                b: 0.0,
                e: 0.0,
            },
            low: Arrhenius {
                a: 2.0,
                b: 0.0,
                e: 0.0,
            },
            efficiencies: Efficiencies {
                default: 1.0,
                overrides: Vec::new(),
            },
            troe: None,
        };
        // [M] = k_inf / k0 = 2, so Pr = 1.
        let concentrations = vec![2.0];
        let (k, factor) = rate_constant(&kind, 800.0, &concentrations);
        assert_eq!(factor, 1.0);
        assert_close(k, 2.0, 1e-12);
    }
}
