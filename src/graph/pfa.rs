//! The Path Flux Analysis formulation.

use crate::chem::KineticModel;
use crate::graph::{AdjacencyMatrix, InteractionMethod, union_reachable};
use ndarray::Array2;
use std::collections::BTreeSet;

/// PFA direct interaction coefficients.
///
/// Production and consumption fluxes are accumulated per species
/// (`P_A = sum_k max(0, nu_Ak w_k)`, `C_A = sum_k max(0, -nu_Ak w_k)`) and per ordered
/// pair (`P_AB`, `C_AB`: the share of those sums coming from reactions in which `B`
/// participates). First-order ratios normalize by `max(P_A, C_A)`; second-order terms
/// chain two first-order ratios through any intermediate species. The DIC is
/// `r^p_1 + r^c_1 + r^p_2 + r^c_2`, treating production and consumption symmetrically.
/// Coefficients can exceed 1 by construction.
pub struct Pfa;

impl InteractionMethod for Pfa {
    const NAME: &'static str = "PFA";

    fn from_rates(kin: &KineticModel, rates: &[f64]) -> AdjacencyMatrix {
        let n = kin.n_species();
        let mut production = vec![0.0_f64; n];
        let mut consumption = vec![0.0_f64; n];
        let mut pair_production = Array2::zeros((n, n));
        let mut pair_consumption = Array2::zeros((n, n));

        for (k, &rate) in rates.iter().enumerate() {
            if rate == 0.0 {
                continue;
            }
            for &(i, nu) in kin.reaction_net(k) {
                let flux = nu * rate;
                if flux > 0.0 {
                    production[i] += flux;
                } else {
                    consumption[i] -= flux;
                }
                for &j in kin.reaction_participants(k) {
                    if j == i {
                        continue;
                    }
                    if flux > 0.0 {
                        pair_production[[i, j]] += flux;
                    } else {
                        pair_consumption[[i, j]] -= flux;
                    }
                }
            }
        }

        // First-order ratios.
        let mut first_production = pair_production;
        let mut first_consumption = pair_consumption;
        for i in 0..n {
            let denominator = production[i].max(consumption[i]);
            for j in 0..n {
                if denominator > 0.0 {
                    first_production[[i, j]] /= denominator;
                    first_consumption[[i, j]] /= denominator;
                } else {
                    first_production[[i, j]] = 0.0;
                    first_consumption[[i, j]] = 0.0;
                }
            }
        }

        // Second-order terms chain through one intermediate; the zero diagonal of the
        // first-order matrices already excludes M = A and M = B.
        let second_production = first_production.dot(&first_production);
        let second_consumption = first_consumption.dot(&first_consumption);

        let combined =
            &first_production + &first_consumption + &second_production + &second_consumption;
        AdjacencyMatrix::from_weights(combined)
    }

    fn survivors(
        matrices: &[AdjacencyMatrix],
        targets: &[usize],
        threshold: f64,
    ) -> BTreeSet<usize> {
        union_reachable(matrices, targets, threshold)
    }
}
