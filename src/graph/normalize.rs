use itertools::{EitherOrBoth, Itertools};
use tracing::debug;

use super::*;
use crate::{
    NodeBitSet, NumNodes,
    error::{GraphError, Result},
};

/// Relative tolerance when comparing the weights of opposing edges
pub const WEIGHT_RTOL: f32 = 1e-5;
/// Absolute tolerance when comparing the weights of opposing edges
pub const WEIGHT_ATOL: f32 = 1e-8;

/// Returns `true` if `forward` and `reverse` are equal up to [`WEIGHT_RTOL`] and [`WEIGHT_ATOL`]
#[inline]
fn weights_agree(forward: f32, reverse: f32) -> bool {
    (forward - reverse).abs() <= WEIGHT_ATOL + WEIGHT_RTOL * reverse.abs()
}

/// Nodes to select when taking a subgraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelection {
    /// Keep exactly these nodes
    Keep(Vec<Node>),
    /// Keep every node except these
    Remove(Vec<Node>),
}

impl SparseGraph {
    /// Sets the weight of every stored edge to `1`.
    pub fn to_unweighted(mut self) -> Self {
        self.adjacency.data_mut().fill(1.0);
        self
    }

    /// Makes the adjacency matrix symmetric by adding every missing reverse edge.
    ///
    /// If both `(i, j)` and `(j, i)` are stored (and non-zero), their weights have to agree
    /// up to [`WEIGHT_RTOL`] and [`WEIGHT_ATOL`]; both coordinates then store the weight of
    /// `(min(i, j), max(i, j))` instead of their sum.
    ///
    /// # Errors
    /// Returns [`GraphError::WeightConflict`] for the first pair of opposing edges whose
    /// weights differ.
    pub fn to_undirected(mut self) -> Result<Self> {
        let adj = &self.adjacency;
        let reverse = adj.transpose();
        let n = adj.rows();

        let mut indptr: Vec<NumEdges> = Vec::with_capacity(n + 1);
        let mut indices: Vec<Node> = Vec::with_capacity(adj.nnz());
        let mut data: Vec<f32> = Vec::with_capacity(adj.nnz());
        indptr.push(0);

        for row in 0..n as Node {
            let forward = adj.row_indices(row).iter().zip(adj.row_data(row));
            let backward = reverse.row_indices(row).iter().zip(reverse.row_data(row));

            for entry in forward.merge_join_by(backward, |(a, _), (b, _)| a.cmp(b)) {
                let (col, weight) = match entry {
                    EitherOrBoth::Both((&col, &fw), (_, &rev)) => {
                        // an explicitly stored zero does not count as an edge
                        if fw != 0.0 && rev != 0.0 && !weights_agree(fw, rev) {
                            return Err(GraphError::WeightConflict {
                                row,
                                col,
                                forward: fw,
                                reverse: rev,
                            });
                        }
                        // both coordinates take the weight stored above the diagonal
                        let (upper, lower) = if row <= col { (fw, rev) } else { (rev, fw) };
                        (col, if upper != 0.0 { upper } else { lower })
                    }
                    EitherOrBoth::Left((&col, &w)) | EitherOrBoth::Right((&col, &w)) => (col, w),
                };
                indices.push(col);
                data.push(weight);
            }

            indptr.push(indices.len() as NumEdges);
        }

        self.adjacency = CsrMatrix::from_canonical_parts(n, indptr, indices, data);
        Ok(self)
    }

    /// Removes all entries of the diagonal. A graph without self-loops is returned unchanged.
    pub fn remove_self_loops(mut self) -> Self {
        if !self.has_self_loops() {
            return self;
        }

        let removed = self.adjacency.retain(|row, col, _| row != col);
        debug!("Removed {removed} self-loops");
        self
    }

    /// Returns the subgraph induced by the nodes of the `k` largest components.
    ///
    /// Components are ranked by size (ties are broken by the smaller component label, i.e.
    /// the component discovered first). Nodes keep their relative order.
    pub fn largest_connected_components(self, k: usize, connection: Connection) -> Self {
        let components = self.adjacency.connected_components(connection);
        let keep = components.nodes_in(&components.largest(k));

        debug!(
            "Keeping {} of {} nodes in the {} largest of {} components",
            keep.len(),
            self.num_nodes(),
            k.min(components.number_of_components() as usize),
            components.number_of_components()
        );

        self.induced_subgraph(&keep)
    }

    /// Returns the subgraph induced by the selected nodes.
    ///
    /// Kept nodes are renumbered `0..` in ascending order of their old index; attributes,
    /// labels and node names are re-indexed accordingly. Duplicates in the selection are
    /// ignored. Attribute names, class names and metadata are carried over unchanged.
    ///
    /// # Errors
    /// Returns [`GraphError::Usage`] if the selection contains a node that is not part of
    /// the graph.
    pub fn create_subgraph(self, selection: NodeSelection) -> Result<Self> {
        let n = self.num_nodes();
        let (NodeSelection::Keep(nodes) | NodeSelection::Remove(nodes)) = &selection;
        if let Some(&u) = nodes.iter().find(|&&u| u as usize >= n) {
            return Err(GraphError::Usage(format!(
                "node {u} is not part of a graph with {n} nodes"
            )));
        }

        let keep = match selection {
            NodeSelection::Keep(mut nodes) => {
                nodes.sort_unstable();
                nodes.dedup();
                nodes
            }
            NodeSelection::Remove(nodes) => {
                let mut removed = NodeBitSet::new(n as NumNodes);
                for u in nodes {
                    removed.set_bit(u);
                }
                (0..n as Node).filter(|&u| !removed.get_bit(u)).collect()
            }
        };

        Ok(self.induced_subgraph(&keep))
    }

    /// Re-indexes all per-node parts to the strictly increasing node list `keep`
    fn induced_subgraph(self, keep: &[Node]) -> Self {
        if keep.len() == self.num_nodes() {
            return self;
        }

        Self {
            adjacency: self.adjacency.principal_submatrix(keep),
            attributes: self.attributes.map(|a| a.select_rows(keep)),
            labels: self.labels.map(|l| l.select(keep)),
            node_names: self
                .node_names
                .map(|names| keep.iter().map(|&u| names[u as usize].clone()).collect()),
            attribute_names: self.attribute_names,
            class_names: self.class_names,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod test {
    use ndarray::array;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::testing::*;

    #[test]
    fn to_unweighted() {
        let graph = graph_from_edges(3, &[(0, 1, 2.5), (1, 2, 1.0), (2, 0, 0.0)]).to_unweighted();
        assert!(!graph.is_weighted());
        assert_eq!(graph.adjacency().data(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn to_undirected_adds_reverse_edges() {
        let graph = graph_from_edges(3, &[(0, 1, 2.0), (1, 0, 2.0), (1, 2, 3.0)])
            .to_undirected()
            .unwrap();

        assert!(!graph.is_directed());
        assert_eq!(graph.adjacency().get(0, 1), Some(&2.0));
        assert_eq!(graph.adjacency().get(1, 0), Some(&2.0));
        assert_eq!(graph.adjacency().get(1, 2), Some(&3.0));
        assert_eq!(graph.adjacency().get(2, 1), Some(&3.0));
        assert_eq!(graph.adjacency().nnz(), 4);
    }

    #[test]
    fn to_undirected_rejects_conflicting_weights() {
        let result = graph_from_edges(2, &[(0, 1, 2.0), (1, 0, 3.0)]).to_undirected();
        assert!(matches!(
            result,
            Err(GraphError::WeightConflict {
                row: 0,
                col: 1,
                forward,
                reverse
            }) if forward == 2.0 && reverse == 3.0
        ));

    }

    #[test]
    fn to_undirected_within_tolerance_is_symmetric() {
        let graph = graph_from_edges(2, &[(0, 1, 1.0), (1, 0, 1.000001)])
            .to_undirected()
            .unwrap();
        assert!(!graph.is_directed());
        assert_eq!(graph.adjacency().get(0, 1), Some(&1.0));
        assert_eq!(graph.adjacency().get(1, 0), Some(&1.0));

        // the upper triangle wins regardless of which row is visited first
        let graph = graph_from_edges(3, &[(2, 0, 4.00001), (0, 2, 4.0), (1, 1, 2.0)])
            .to_undirected()
            .unwrap();
        assert!(!graph.is_directed());
        assert_eq!(graph.adjacency().get(2, 0), Some(&4.0));
        assert_eq!(graph.adjacency().get(1, 1), Some(&2.0));

        let graph = graph_from_edges(2, &[(0, 1, 1.0), (1, 0, 1.000001)])
            .standardize(&StandardizeOptions::default().make_unweighted(false))
            .unwrap();
        assert!(!graph.is_directed());
    }

    #[test]
    fn to_undirected_is_idempotent() {
        let rng = &mut Pcg64Mcg::seed_from_u64(42);
        for _ in 0..20 {
            let once = random_graph(rng, 30, 0.1, false).to_undirected().unwrap();
            let twice = once.clone().to_undirected().unwrap();
            assert!(!once.is_directed());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn remove_self_loops() {
        let graph = graph_from_edges(3, &[(0, 0, 1.0), (0, 1, 1.0), (2, 2, 5.0)]);
        let graph = graph.remove_self_loops();
        assert!(!graph.has_self_loops());
        assert_eq!(graph.adjacency().nnz(), 1);

        // unchanged if there is nothing to remove
        let graph = graph_from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0)]);
        assert_eq!(graph.clone().remove_self_loops(), graph);
    }

    #[test]
    fn largest_component() {
        // components of sizes 5, 3 and 2
        let graph = SparseGraphParts::new(
            graph_from_edges(
                10,
                &[
                    (0, 1, 1.0),
                    (1, 2, 1.0),
                    (2, 3, 1.0),
                    (3, 4, 1.0),
                    (5, 6, 1.0),
                    (6, 7, 1.0),
                    (8, 9, 1.0),
                ],
            )
            .to_undirected()
            .unwrap()
            .into_parts()
            .adjacency,
        )
        .labels(Labels::Classes((0..10).collect()))
        .node_names(names(10))
        .build()
        .unwrap();

        let lcc = graph.clone().largest_connected_components(1, Connection::Weak);
        assert_eq!(lcc.num_nodes(), 5);
        assert!(lcc.is_connected());
        assert_eq!(lcc.labels(), Some(&Labels::Classes(vec![0, 1, 2, 3, 4])));

        let two = graph.largest_connected_components(2, Connection::Weak);
        assert_eq!(two.num_nodes(), 8);
        assert_eq!(two.node_names().unwrap()[7], "node7");
        assert!(!two.is_connected());
    }

    #[test]
    fn subgraph() {
        let graph = SparseGraphParts::new(
            graph_from_edges(4, &[(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0), (3, 0, 4.0)])
                .into_parts()
                .adjacency,
        )
        .attributes(Attributes::Dense(array![
            [0.0f32, 0.0],
            [1.0, 1.0],
            [2.0, 2.0],
            [3.0, 3.0]
        ]))
        .labels(Labels::Classes(vec![10, 11, 12, 13]))
        .build()
        .unwrap();

        let all = graph
            .clone()
            .create_subgraph(NodeSelection::Keep(vec![3, 2, 1, 0]))
            .unwrap();
        assert_eq!(all, graph);

        let sub = graph
            .clone()
            .create_subgraph(NodeSelection::Keep(vec![3, 1, 2, 3]))
            .unwrap();
        assert_eq!(sub.num_nodes(), 3);
        assert_eq!(
            sub.edge_index_array(),
            vec![crate::edge::Edge(0, 1), crate::edge::Edge(1, 2)]
        );
        assert_eq!(sub.adjacency().data(), &[2.0, 3.0]);
        assert_eq!(sub.labels(), Some(&Labels::Classes(vec![11, 12, 13])));
        assert_eq!(
            sub.attributes(),
            Some(&Attributes::Dense(array![[1.0f32, 1.0], [2.0, 2.0], [3.0, 3.0]]))
        );

        let removed = graph
            .clone()
            .create_subgraph(NodeSelection::Remove(vec![0]))
            .unwrap();
        assert_eq!(removed, sub);

        assert!(matches!(
            graph.create_subgraph(NodeSelection::Keep(vec![4])),
            Err(GraphError::Usage(_))
        ));
    }
}
