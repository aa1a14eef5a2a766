use std::path::Path;

use ndarray::Array2;

use crate::{
    ClassId,
    edge::Edge,
    error::{GraphError, Result, raise_error_unless},
    graph::{Attributes, Labels, SparseGraph, SparseGraphParts},
    sparse::CsrMatrix,
    split::IndexPartition,
};

/// Split shipped with an external benchmark dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalSplit {
    /// Explicit index arrays
    Indices(IndexPartition),
    /// One boolean mask per set, each with one entry per node
    Masks {
        train: Vec<bool>,
        valid: Vec<bool>,
        test: Vec<bool>,
    },
}

impl ExternalSplit {
    /// Converts the split into index arrays; masks are turned into the (ascending)
    /// positions of their `true` entries.
    pub fn into_partition(self) -> IndexPartition {
        let positions = |mask: Vec<bool>| -> Vec<usize> {
            mask.into_iter()
                .enumerate()
                .filter_map(|(i, set)| set.then_some(i))
                .collect()
        };

        match self {
            ExternalSplit::Indices(partition) => partition,
            ExternalSplit::Masks { train, valid, test } => IndexPartition {
                train: positions(train),
                val: positions(valid),
                test: positions(test),
            },
        }
    }
}

/// In-memory form of an external benchmark dataset: an edge list with optional weights,
/// per-node features and labels, and optionally the dataset's own split.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalDataset {
    pub num_nodes: usize,
    pub edge_index: Vec<Edge>,
    pub edge_weight: Option<Vec<f32>>,
    pub features: Array2<f32>,
    pub labels: Vec<ClassId>,
    pub split: Option<ExternalSplit>,
}

/// Source of external benchmark datasets (e.g. a downloader with a local cache).
pub trait ExternalLoader {
    /// Loads the dataset `name`, using `root` as storage directory
    ///
    /// # Errors
    /// Returns an error if the dataset is unknown to the loader or cannot be loaded.
    fn load(&self, name: &str, root: &Path) -> Result<ExternalDataset>;
}

impl<F> ExternalLoader for F
where
    F: Fn(&str, &Path) -> Result<ExternalDataset>,
{
    fn load(&self, name: &str, root: &Path) -> Result<ExternalDataset> {
        self(name, root)
    }
}

impl ExternalDataset {
    /// Builds the graph of the dataset: duplicate edges are summed into a single entry,
    /// which is then unweighted and (optionally) symmetrized. No component selection.
    ///
    /// # Errors
    /// Returns an error if the edge weights do not match the edge list, an edge is out of
    /// bounds or features/labels do not cover every node.
    pub fn into_graph(
        self,
        make_undirected: bool,
    ) -> Result<(SparseGraph, Option<IndexPartition>)> {
        let n = self.num_nodes;
        let weights = match self.edge_weight {
            Some(weights) => {
                raise_error_unless!(
                    weights.len() == self.edge_index.len(),
                    GraphError::LengthMismatch {
                        expected: self.edge_index.len(),
                        found: weights.len(),
                    }
                );
                weights
            }
            None => vec![1.0; self.edge_index.len()],
        };

        let adjacency = CsrMatrix::from_triplets(
            (n, n),
            self.edge_index
                .into_iter()
                .zip(weights)
                .map(|(Edge(u, v), w)| (u, v, w)),
        )?;

        let graph = SparseGraphParts::new(adjacency)
            .attributes(Attributes::Dense(self.features))
            .labels(Labels::Classes(self.labels))
            .build()?
            .to_unweighted();

        let graph = if make_undirected {
            graph.to_undirected()?
        } else {
            graph
        };

        Ok((graph, self.split.map(ExternalSplit::into_partition)))
    }
}
