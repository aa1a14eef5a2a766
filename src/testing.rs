//! Helpers shared by unit tests.
#![cfg(test)]

use ndarray::Array2;
use rand::Rng;

use crate::{
    Node,
    graph::{Attributes, Labels, SparseGraph, SparseGraphParts},
    sparse::CsrMatrix,
};

/// Creates a graph on `n` nodes consisting of the given weighted edges only
pub fn graph_from_edges(n: usize, edges: &[(Node, Node, f32)]) -> SparseGraph {
    SparseGraphParts::new(CsrMatrix::from_triplets((n, n), edges.iter().copied()).unwrap())
        .build()
        .unwrap()
}

/// Returns the names `node0, node1, ...`
pub fn names(k: usize) -> Vec<String> {
    (0..k).map(|i| format!("node{i}")).collect()
}

/// Creates a random directed Gnp-like graph with dense attributes and labels in `0..3`.
/// Weights are drawn from `1..5` if `weighted` is set and are `1` otherwise.
pub fn random_graph<R: Rng>(rng: &mut R, n: usize, p: f64, weighted: bool) -> SparseGraph {
    let mut edges = Vec::new();
    for u in 0..n as Node {
        for v in 0..n as Node {
            if rng.random_bool(p) {
                let w = if weighted {
                    rng.random_range(1..5) as f32
                } else {
                    1.0
                };
                edges.push((u, v, w));
            }
        }
    }

    let attributes = Array2::from_shape_fn((n, 4), |_| rng.random_range(0.0..1.0f32));
    let labels = (0..n).map(|_| rng.random_range(0..3)).collect();

    SparseGraphParts::new(CsrMatrix::from_triplets((n, n), edges).unwrap())
        .attributes(Attributes::Dense(attributes))
        .labels(Labels::Classes(labels))
        .build()
        .unwrap()
}
