use std::fmt::{Debug, Display};

use crate::Node;

/// Coordinate `(row, col)` of a stored entry of an adjacency matrix, i.e. the directed
/// edge `row -> col`. Undirected graphs store every edge in both directions.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge(pub Node, pub Node);

/// Number (or id) of stored entries of a sparse matrix; limited to `2^32 - 1`.
pub type NumEdges = u32;

impl Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.0, self.1)
    }
}

impl Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

impl Edge {
    /// Returns true if the edge lies on the diagonal
    pub fn is_loop(&self) -> bool {
        self.0 == self.1
    }

    /// Returns the coordinate of the opposing edge
    pub fn reverse(&self) -> Self {
        Edge(self.1, self.0)
    }
}

impl From<(Node, Node)> for Edge {
    fn from(value: (Node, Node)) -> Self {
        Edge(value.0, value.1)
    }
}

impl From<Edge> for (Node, Node) {
    fn from(value: Edge) -> Self {
        (value.0, value.1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn coordinates() {
        let e = Edge::from((4, 1));
        assert_eq!(e.reverse(), Edge(1, 4));
        assert!(!e.is_loop());
        assert!(Edge(2, 2).is_loop());
        assert_eq!(<(Node, Node)>::from(e), (4, 1));
        assert_eq!(format!("{e:?}"), "(4,1)");
    }
}
