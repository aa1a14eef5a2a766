/*!
# Sparse Graph Entity

[`SparseGraph`] binds an adjacency matrix with optional node attributes, labels and naming
metadata. It is a plain value type: every normalizer (see [`SparseGraph::to_undirected`],
[`SparseGraph::remove_self_loops`], [`SparseGraph::create_subgraph`], ...) consumes a graph and
returns the transformed one. Parts that a normalizer does not touch are moved into the result
instead of being copied.

A graph is assembled via [`SparseGraphParts`], which validates the following invariants:

1. the adjacency matrix is square (`N x N`),
2. the attribute matrix (if any) has `N` rows,
3. the labels (if any) have length `N`,
4. the node names (if any) have length `N`,
5. the attribute names (if any) have one entry per attribute column.

# Example
```rust
use attrgraph::{graph::*, sparse::CsrMatrix};

let adjacency = CsrMatrix::from_triplets((3, 3), [(0, 1, 1.0), (1, 0, 1.0), (1, 2, 1.0)]).unwrap();
let graph = SparseGraphParts::new(adjacency)
    .labels(Labels::Classes(vec![0, 1, 1]))
    .build()
    .unwrap();

assert_eq!(graph.num_nodes(), 3);
assert!(graph.is_directed());
assert_eq!(graph.neighbors(1), &[0, 2]);
```
*/

mod normalize;
mod standardize;

pub use normalize::*;
pub use standardize::*;

use std::{fmt, sync::Once};

use ndarray::{Array2, Axis};
use tracing::warn;

use crate::{
    ClassId, Node, NumEdges,
    algo::{Connection, Connectivity},
    edge::Edge,
    error::{ConstructionError, raise_error_unless},
    sparse::CsrMatrix,
};

/// Diagonal entries with an absolute value up to this tolerance do not count as self-loops
pub const SELF_LOOP_TOLERANCE: f32 = 1e-8;

/// Opaque auxiliary payload attached to a graph (e.g. raw text of documents).
pub type Metadata = serde_json::Value;

/// Node attribute matrix with one row per node.
#[derive(Debug, Clone, PartialEq)]
pub enum Attributes {
    Sparse(CsrMatrix<f32>),
    Dense(Array2<f32>),
}

impl Attributes {
    /// Returns the number of rows (nodes)
    pub fn rows(&self) -> usize {
        match self {
            Attributes::Sparse(m) => m.rows(),
            Attributes::Dense(m) => m.nrows(),
        }
    }

    /// Returns the number of columns (attributes)
    pub fn cols(&self) -> usize {
        match self {
            Attributes::Sparse(m) => m.cols(),
            Attributes::Dense(m) => m.ncols(),
        }
    }

    /// Returns the attributes of the given nodes (in the given order)
    pub fn select_rows(&self, rows: &[Node]) -> Self {
        match self {
            Attributes::Sparse(m) => Attributes::Sparse(m.select_rows(rows)),
            Attributes::Dense(m) => {
                let rows = rows.iter().map(|&r| r as usize).collect::<Vec<_>>();
                Attributes::Dense(m.select(Axis(0), &rows))
            }
        }
    }

    /// Converts the attributes into a dense matrix
    pub fn into_dense(self) -> Array2<f32> {
        match self {
            Attributes::Sparse(m) => m.to_dense(),
            Attributes::Dense(m) => m,
        }
    }
}

/// Node labels: either one class id per node or a one-hot/multi-label matrix
/// with one row per node.
#[derive(Debug, Clone, PartialEq)]
pub enum Labels {
    Classes(Vec<ClassId>),
    OneHot(CsrMatrix<f32>),
}

impl Labels {
    /// Returns the number of labelled rows (nodes)
    pub fn len(&self) -> usize {
        match self {
            Labels::Classes(c) => c.len(),
            Labels::OneHot(m) => m.rows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the labels of the given nodes (in the given order)
    pub fn select(&self, rows: &[Node]) -> Self {
        match self {
            Labels::Classes(c) => Labels::Classes(rows.iter().map(|&r| c[r as usize]).collect()),
            Labels::OneHot(m) => Labels::OneHot(m.select_rows(rows)),
        }
    }

    /// Like [`Labels::to_classes`], but reuses the buffer of class labels
    pub fn into_classes(self) -> Vec<ClassId> {
        match self {
            Labels::Classes(c) => c,
            one_hot => one_hot.to_classes(),
        }
    }

    /// Returns one class id per node.
    ///
    /// For one-hot labels this is the column of the largest entry of each row
    /// (the first one on ties); rows without any non-zero entry get class `-1`.
    pub fn to_classes(&self) -> Vec<ClassId> {
        match self {
            Labels::Classes(c) => c.clone(),
            Labels::OneHot(m) => (0..m.rows() as Node)
                .map(|row| {
                    m.row_indices(row)
                        .iter()
                        .zip(m.row_data(row))
                        .filter(|(_, val)| **val != 0.0)
                        .fold(None, |best: Option<(Node, f32)>, (&col, &val)| match best {
                            Some((_, best_val)) if best_val >= val => best,
                            _ => Some((col, val)),
                        })
                        .map_or(-1, |(col, _)| col as ClassId)
                })
                .collect(),
        }
    }
}

/// Attributed, labelled graph stored in sparse matrix form.
///
/// Construct via [`SparseGraphParts::build`] and decompose via [`SparseGraph::into_parts`].
#[derive(Debug, Clone, PartialEq)]
pub struct SparseGraph {
    adjacency: CsrMatrix<f32>,
    attributes: Option<Attributes>,
    labels: Option<Labels>,
    node_names: Option<Vec<String>>,
    attribute_names: Option<Vec<String>>,
    class_names: Option<Vec<String>>,
    metadata: Option<Metadata>,
}

/// The unvalidated parts of a [`SparseGraph`].
///
/// Doubles as a builder: start with [`SparseGraphParts::new`], attach optional parts and
/// finish with [`SparseGraphParts::build`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseGraphParts {
    pub adjacency: CsrMatrix<f32>,
    pub attributes: Option<Attributes>,
    pub labels: Option<Labels>,
    pub node_names: Option<Vec<String>>,
    pub attribute_names: Option<Vec<String>>,
    pub class_names: Option<Vec<String>>,
    pub metadata: Option<Metadata>,
}

impl SparseGraphParts {
    /// Starts a graph with the given adjacency matrix and no further parts
    pub fn new(adjacency: CsrMatrix<f32>) -> Self {
        Self {
            adjacency,
            ..Default::default()
        }
    }

    /// Sets the attribute matrix
    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Sets the labels
    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Sets the node names
    pub fn node_names(mut self, names: Vec<String>) -> Self {
        self.node_names = Some(names);
        self
    }

    /// Sets the attribute names
    pub fn attribute_names(mut self, names: Vec<String>) -> Self {
        self.attribute_names = Some(names);
        self
    }

    /// Sets the class names
    pub fn class_names(mut self, names: Vec<String>) -> Self {
        self.class_names = Some(names);
        self
    }

    /// Sets the metadata
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Validates the parts and assembles the graph.
    ///
    /// # Errors
    /// Returns the first violated invariant as [`ConstructionError`]. No graph is returned
    /// on failure.
    pub fn build(self) -> Result<SparseGraph, ConstructionError> {
        let (rows, cols) = self.adjacency.shape();
        raise_error_unless!(
            rows == cols,
            ConstructionError::NonSquareAdjacency { rows, cols }
        );

        if let Some(attributes) = &self.attributes {
            raise_error_unless!(
                attributes.rows() == rows,
                ConstructionError::AttributeRows {
                    expected: rows,
                    found: attributes.rows(),
                }
            );
        }

        if let Some(labels) = &self.labels {
            raise_error_unless!(
                labels.len() == rows,
                ConstructionError::LabelLength {
                    expected: rows,
                    found: labels.len(),
                }
            );
        }

        if let Some(names) = &self.node_names {
            raise_error_unless!(
                names.len() == rows,
                ConstructionError::NodeNameLength {
                    expected: rows,
                    found: names.len(),
                }
            );
        }

        if let Some(names) = &self.attribute_names {
            let expected = self.attributes.as_ref().map_or(0, Attributes::cols);
            raise_error_unless!(
                names.len() == expected,
                ConstructionError::AttributeNameLength {
                    expected,
                    found: names.len(),
                }
            );
        }

        Ok(SparseGraph {
            adjacency: self.adjacency,
            attributes: self.attributes,
            labels: self.labels,
            node_names: self.node_names,
            attribute_names: self.attribute_names,
            class_names: self.class_names,
            metadata: self.metadata,
        })
    }
}

static UNDIRECTED_EDGE_COUNT_WARNING: Once = Once::new();

impl SparseGraph {
    /// Decomposes the graph into its parts
    pub fn into_parts(self) -> SparseGraphParts {
        SparseGraphParts {
            adjacency: self.adjacency,
            attributes: self.attributes,
            labels: self.labels,
            node_names: self.node_names,
            attribute_names: self.attribute_names,
            class_names: self.class_names,
            metadata: self.metadata,
        }
    }

    pub fn adjacency(&self) -> &CsrMatrix<f32> {
        &self.adjacency
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        self.attributes.as_ref()
    }

    pub fn labels(&self) -> Option<&Labels> {
        self.labels.as_ref()
    }

    pub fn node_names(&self) -> Option<&[String]> {
        self.node_names.as_deref()
    }

    pub fn attribute_names(&self) -> Option<&[String]> {
        self.attribute_names.as_deref()
    }

    pub fn class_names(&self) -> Option<&[String]> {
        self.class_names.as_deref()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Returns the number of nodes
    pub fn num_nodes(&self) -> usize {
        self.adjacency.rows()
    }

    /// Returns the number of stored entries of the adjacency matrix.
    ///
    /// Every directed edge is counted individually, so for undirected graphs `(i, j)` and
    /// `(j, i)` count as **two** edges. Calling this on an undirected graph emits a warning
    /// (once per process) as a reminder of this double counting.
    pub fn num_edges(&self) -> usize {
        if !self.is_directed() {
            UNDIRECTED_EDGE_COUNT_WARNING.call_once(|| {
                warn!("num_edges always returns the number of directed edges, also for undirected graphs");
            });
        }
        self.adjacency.nnz()
    }

    /// Returns the (sorted) out-neighbors of node `u`
    ///
    /// # Panics
    /// Panics if `u` is not a node of the graph.
    pub fn neighbors(&self, u: Node) -> &[Node] {
        self.adjacency.row_indices(u)
    }

    /// Returns the coordinates of all stored edges. Edge `i` of the result is the edge with
    /// id `i` in [`SparseGraph::edge_id_matrix`].
    pub fn edge_index_array(&self) -> Vec<Edge> {
        self.adjacency.coords().collect()
    }

    /// Returns a sparse matrix mapping the coordinate of every stored edge to its edge id
    /// `0..nnz` (row-major order).
    ///
    /// Caution: the first edge has id `0`, which is stored explicitly. Absent coordinates
    /// are also read as `0`, so a zero value must not be interpreted as "no edge";
    /// use [`CsrMatrix::get`] to distinguish both cases.
    pub fn edge_id_matrix(&self) -> CsrMatrix<NumEdges> {
        self.adjacency
            .with_data((0..self.adjacency.nnz() as NumEdges).collect())
    }

    /// Returns `true` if the adjacency matrix is not symmetric
    pub fn is_directed(&self) -> bool {
        self.adjacency
            .iter()
            .any(|(row, col, &w)| self.adjacency.get(col, row).copied().unwrap_or(0.0) != w)
    }

    /// Returns `true` if some edge has a weight other than `1`
    pub fn is_weighted(&self) -> bool {
        self.adjacency
            .data()
            .iter()
            .any(|&w| w != 0.0 && w != 1.0)
    }

    /// Returns `true` if the graph consists of a single (weakly) connected component
    pub fn is_connected(&self) -> bool {
        self.adjacency.is_connected_under(Connection::Weak)
    }

    /// Returns `true` if some diagonal entry of the adjacency matrix is non-zero
    pub fn has_self_loops(&self) -> bool {
        self.adjacency
            .diagonal()
            .iter()
            .any(|w| w.abs() > SELF_LOOP_TOLERANCE)
    }
}

impl fmt::Display for SparseGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {} and {} SparseGraph with {} edges ({})>",
            if self.is_directed() {
                "Directed"
            } else {
                "Undirected"
            },
            if self.is_weighted() {
                "weighted"
            } else {
                "unweighted"
            },
            if self.is_connected() {
                "connected"
            } else {
                "disconnected"
            },
            self.adjacency.nnz(),
            if self.has_self_loops() {
                "has self-loops"
            } else {
                "no self-loops"
            },
        )
    }
}
