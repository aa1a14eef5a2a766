/*!
`attrgraph` loads, normalizes and splits **attributed graphs** stored as sparse matrices,
as used for node-classification benchmarks (citation networks such as `cora_ml`,
`citeseer` or `pubmed`, and large external benchmarks).

# Representation

We represent **nodes** as `u32` in the range `0..n` where `n` is the number of nodes in the graph.
As most common graphs do not exceed `2^32` nodes, this should normally suffice and save space as
compared to `u64/usize`. An **edge** is the coordinate `Edge(row, col)` of a stored entry of the
adjacency matrix.

A [`SparseGraph`](crate::graph::SparseGraph) binds
- an `N x N` adjacency matrix in canonical CSR form ([`CsrMatrix`](crate::sparse::CsrMatrix)),
- an optional `N x F` attribute matrix (sparse or dense),
- optional labels (one class per node or a one-hot matrix),
- optional node/attribute/class names and opaque metadata.

### Directed vs Undirected

A graph is **undirected** iff its adjacency matrix is symmetric. Every undirected edge is thus
stored twice, once per direction, and also counted twice by
[`SparseGraph::num_edges`](crate::graph::SparseGraph::num_edges).

# Design

Graphs are plain values: all normalizers consume a graph and return the transformed one, and
[standardization](crate::graph::SparseGraph::standardize) is a fold over these normalizers.
Configurable routines (splitters, standardization, graph preparation) are provided as structs
that one can alter using the *Builder* / *Setter* pattern before running them.

# Usage

There are *5* core submodules you probably want to interact with:
- [`graph`] includes the graph entity, its predicates and all normalizers,
- [`io`] reads and writes datasets (`.npz` archives and JSON documents),
- [`split`] includes the stratified and the class-balanced train/validation/test splitters,
- [`prep`] turns a dataset identifier into model-ready features, adjacency and labels,
- [`algo`] includes connected components (weak and strong) of adjacency matrices.

In most use-cases, `use attrgraph::prelude::*;` suffices for your needs.

# Logging

All modules log through [`tracing`]; the crate never installs a subscriber.
*/

pub mod algo;
pub mod edge;
pub mod error;
pub mod graph;
pub mod io;
pub mod node;
pub mod prep;
pub mod sparse;
pub mod split;
pub(crate) mod testing;

pub use edge::*;
pub use node::*;

/// `attrgraph::prelude` includes definitions for nodes and edges, the graph entity, dataset IO,
/// splitters and graph preparation.
pub mod prelude {
    pub use super::{
        edge::*,
        error::{GraphError, Result},
        graph::*,
        io::{DatasetFormat, DatasetRead, DatasetWrite, load_dataset, save_dataset},
        node::*,
        prep::{PrepConfig, PreparedGraph, prep_graph},
        sparse::CsrMatrix,
        split::*,
    };
}
