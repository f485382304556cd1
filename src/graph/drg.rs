//! The Directly Related Graph formulation.

use crate::chem::KineticModel;
use crate::graph::{AdjacencyMatrix, InteractionMethod, union_reachable};
use ndarray::Array2;
use std::collections::BTreeSet;

/// DRG direct interaction coefficients:
///
/// ```text
/// r_ij = sum_k |nu_ik * w_k| * d_jk  /  sum_k |nu_ik * w_k|
/// ```
///
/// where `d_jk` is 1 when species `j` participates in reaction `k`. A species with a
/// zero denominator (no active reactions) has an all-zero row.
pub struct Drg;

impl InteractionMethod for Drg {
    const NAME: &'static str = "DRG";

    fn from_rates(kin: &KineticModel, rates: &[f64]) -> AdjacencyMatrix {
        let n = kin.n_species();
        let mut numerator = Array2::zeros((n, n));
        let mut denominator = vec![0.0_f64; n];

        for (k, &rate) in rates.iter().enumerate() {
            if rate == 0.0 {
                continue;
            }
            for &(i, nu) in kin.reaction_net(k) {
                let flux = (nu * rate).abs();
                denominator[i] += flux;
                for &j in kin.reaction_participants(k) {
                    if j != i {
                        numerator[[i, j]] += flux;
                    }
                }
            }
        }

        for ((i, _), value) in numerator.indexed_iter_mut() {
            if denominator[i] > 0.0 {
                *value /= denominator[i];
            } else {
                *value = 0.0;
            }
        }
        AdjacencyMatrix::from_weights(numerator)
    }

    fn survivors(
        matrices: &[AdjacencyMatrix],
        targets: &[usize],
        threshold: f64,
    ) -> BTreeSet<usize> {
        union_reachable(matrices, targets, threshold)
    }
}
