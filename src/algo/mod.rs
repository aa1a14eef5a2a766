/*!
# Algorithms

Graph algorithms operating directly on adjacency matrices in [`CsrMatrix`] form.

Currently this covers connectivity:
- [`Connectivity::connected_components`] labels every node with its component, either under
  [`Connection::Weak`] connectivity (BFS ignoring edge directions) or [`Connection::Strong`]
  connectivity (Tarjan's algorithm),
- [`ComponentLabels`] ranks components by size to select the largest ones.
*/

use crate::{INVALID_NODE, Node, NodeBitSet, NumNodes, sparse::CsrMatrix};

mod connectivity;

pub use connectivity::*;
