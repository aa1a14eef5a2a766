/*!
# Node Representation

Nodes are the row/column indices of the adjacency matrix. We choose `Node = u32` as the graphs we
prepare (citation networks up to web-scale benchmarks) stay below `2^32` nodes, which lets us halve
the memory spent on column indices compared to `usize`.
*/

use stream_bitset::bitset::BitSetImpl;

/// Nodes can be any unsigned integer from `0` to `Node::MAX - 1`
pub type Node = u32;

/// Node-Value that is considered invalid.
/// Used as the "unmapped" marker when re-indexing nodes for subgraphs.
pub const INVALID_NODE: Node = Node::MAX;

/// There can be at most `2^32 - 1` nodes in a graph!
pub type NumNodes = Node;

/// BitSet for Nodes
pub type NodeBitSet = BitSetImpl<Node>;

/// Integer class id of a node.
///
/// Signed since external benchmarks mark unlabelled nodes with negative ids.
pub type ClassId = i64;
