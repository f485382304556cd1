//! Graph search over interaction matrices: depth-first reachability for DRG/PFA and
//! maximum-product path coefficients for DRGEP.

use crate::graph::AdjacencyMatrix;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Species reachable from any of `sources` using edges of weight >= `threshold`.
///
/// Zero-weight entries are never edges, so a threshold of zero still only reaches
/// species connected through strictly positive coefficients. Sources are always part
/// of the result.
pub fn reachable(
    matrix: &AdjacencyMatrix,
    sources: &[usize],
    threshold: f64,
) -> Vec<usize> {
    let mut visited = vec![false; matrix.n_species()];
    let mut stack: Vec<usize> = Vec::new();
    for &source in sources {
        if !visited[source] {
            visited[source] = true;
            stack.push(source);
        }
    }
    while let Some(i) = stack.pop() {
        for (j, weight) in matrix.edges_from(i) {
            if weight >= threshold && !visited[j] {
                visited[j] = true;
                stack.push(j);
            }
        }
    }
    visited
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v)
        .map(|(i, _)| i)
        .collect()
}

/// A heap entry ordered by path value; `f64::total_cmp` is safe because path values
/// are finite products of clipped coefficients.
#[derive(PartialEq)]
struct Candidate {
    value: f64,
    node: usize,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Maximum-product path value from `source` to every species.
///
/// A modified Dijkstra on a max-heap: relaxation multiplies edge weights instead of
/// adding them, which is admissible because every weight lies in [0, 1]. The source
/// is valued at 1.
pub fn max_product_paths(matrix: &AdjacencyMatrix, source: usize) -> Vec<f64> {
    let n = matrix.n_species();
    let mut best = vec![0.0_f64; n];
    best[source] = 1.0;
    let mut heap = BinaryHeap::new();
    heap.push(Candidate {
        value: 1.0,
        node: source,
    });

    while let Some(Candidate { value, node }) = heap.pop() {
        if value < best[node] {
            continue;
        }
        for (next, weight) in matrix.edges_from(node) {
            let candidate = value * weight.min(1.0);
            if candidate > best[next] {
                best[next] = candidate;
                heap.push(Candidate {
                    value: candidate,
                    node: next,
                });
            }
        }
    }
    best
}
