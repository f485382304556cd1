use ndarray::Array2;

/// A dense species-by-species matrix of direct interaction coefficients.
///
/// Entry `(i, j)` measures how strongly the elimination of species `j` would perturb
/// the net production of species `i` at one sampled state. Entries are non-negative
/// and the diagonal is identically zero. Zero entries are not graph edges, regardless
/// of the pruning threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyMatrix {
    weights: Array2<f64>,
}

impl AdjacencyMatrix {
    pub fn zeros(n_species: usize) -> AdjacencyMatrix {
        AdjacencyMatrix {
            weights: Array2::zeros((n_species, n_species)),
        }
    }

    /// Wrap a raw coefficient matrix. The diagonal is forced to zero; negative
    /// round-off residue is clamped away.
    pub fn from_weights(mut weights: Array2<f64>) -> AdjacencyMatrix {
        debug_assert_eq!(weights.nrows(), weights.ncols());
        for ((i, j), w) in weights.indexed_iter_mut() {
            if i == j || *w < 0.0 {
                *w = 0.0;
            }
        }
        AdjacencyMatrix { weights }
    }

    pub fn n_species(&self) -> usize {
        self.weights.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.weights[[i, j]]
    }

    /// Outgoing edges of species `i`: every strictly positive entry of row `i`.
    pub fn edges_from(&self, i: usize) -> impl Iterator<Item = (usize, f64)> {
        self.weights
            .row(i)
            .into_iter()
            .copied()
            .enumerate()
            .filter(|&(_, w)| w > 0.0)
            .collect::<Vec<_>>()
            .into_iter()
    }

    pub fn max_weight(&self) -> f64 {
        self.weights.iter().fold(0.0_f64, |m, &w| m.max(w))
    }
}
