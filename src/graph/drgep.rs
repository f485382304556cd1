//! The DRG with Error Propagation formulation.

use crate::chem::KineticModel;
use crate::graph::{AdjacencyMatrix, InteractionMethod, search};
use ndarray::Array2;
use std::collections::BTreeSet;

/// DRGEP direct interaction coefficients:
///
/// ```text
/// r_ij = | sum_k nu_ik * w_k * d_jk |  /  max(P_i, C_i)
/// ```
///
/// with production `P_i = sum_k max(0, nu_ik * w_k)` and consumption
/// `C_i = sum_k max(0, -nu_ik * w_k)`. The signed numerator lets opposing fluxes
/// cancel; coefficients are clipped to 1 against round-off.
pub struct Drgep;

impl Drgep {
    /// Overall importance coefficient of every species: the maximum over targets and
    /// sampled states of the maximum-product path value from a target. Targets are
    /// self-valued at 1.
    pub fn importance_coefficients(
        matrices: &[AdjacencyMatrix],
        targets: &[usize],
    ) -> Vec<f64> {
        let n = matrices.first().map(|m| m.n_species()).unwrap_or(0);
        let mut coefficients = vec![0.0_f64; n];
        for matrix in matrices {
            for &target in targets {
                for (i, value) in search::max_product_paths(matrix, target)
                    .into_iter()
                    .enumerate()
                {
                    if value > coefficients[i] {
                        coefficients[i] = value;
                    }
                }
            }
        }
        coefficients
    }
}

impl InteractionMethod for Drgep {
    const NAME: &'static str = "DRGEP";

    fn from_rates(kin: &KineticModel, rates: &[f64]) -> AdjacencyMatrix {
        let n = kin.n_species();
        let mut signed = Array2::<f64>::zeros((n, n));
        let mut production = vec![0.0_f64; n];
        let mut consumption = vec![0.0_f64; n];

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
                    if j != i {
                        signed[[i, j]] += flux;
                    }
                }
            }
        }

        for ((i, _), value) in signed.indexed_iter_mut() {
            let denominator = production[i].max(consumption[i]);
            if denominator > 0.0 {
                let coefficient = value.abs() / denominator;
                debug_assert!(
                    coefficient <= 1.0 + 1e-9,
                    "DRGEP coefficient {} exceeds 1 beyond round-off",
                    coefficient
                );
                *value = coefficient.min(1.0);
            } else {
                *value = 0.0;
            }
        }
        AdjacencyMatrix::from_weights(signed)
    }

    fn survivors(
        matrices: &[AdjacencyMatrix],
        targets: &[usize],
        threshold: f64,
    ) -> BTreeSet<usize> {
        let coefficients = Self::importance_coefficients(matrices, targets);
        let mut retained: BTreeSet<usize> = targets.iter().copied().collect();
        // Elimination is strict: a species survives while C_s >= threshold. Species
        // with no positive path stay dead even at threshold zero.
        retained.extend(
            coefficients
                .iter()
                .enumerate()
                .filter(|&(_, &c)| c >= threshold && c > 0.0)
                .map(|(i, _)| i),
        );
        retained
    }
}
