use std::collections::VecDeque;

use itertools::Itertools;

use super::*;

/// Notion of connectivity used when computing components of a (possibly directed) graph.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Connection {
    /// Two nodes are connected if there is a path between them when ignoring edge directions.
    /// For undirected (symmetric) graphs this is the usual notion of connectivity.
    #[default]
    Weak,
    /// Two nodes are connected if each one is reachable from the other along directed edges.
    Strong,
}

/// Assignment of every node to exactly one component.
///
/// Component labels are `0..number_of_components()`. For [`Connection::Weak`], labels follow the
/// discovery order of a BFS that restarts at the smallest unvisited node, i.e. the component
/// containing node `0` has label `0`. For [`Connection::Strong`], labels follow the order in which
/// Tarjan's algorithm completes the components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentLabels {
    labels: Vec<NumNodes>,
    sizes: Vec<NumNodes>,
}

impl ComponentLabels {
    /// Returns the number of components
    pub fn number_of_components(&self) -> NumNodes {
        self.sizes.len() as NumNodes
    }

    /// Returns the component label of node `u`
    pub fn label_of(&self, u: Node) -> NumNodes {
        self.labels[u as usize]
    }

    /// Returns the label of every node
    pub fn labels(&self) -> &[NumNodes] {
        &self.labels
    }

    /// Returns the number of nodes in every component, indexed by label
    pub fn sizes(&self) -> &[NumNodes] {
        &self.sizes
    }

    /// Returns the labels of the (at most) `k` largest components.
    ///
    /// Components are ranked by size descending; equally sized components are ranked by
    /// ascending label, so the ranking is deterministic.
    ///
    /// # Examples
    /// ```
    /// use attrgraph::{algo::*, sparse::CsrMatrix};
    ///
    /// // Components {0, 1}, {2} and {3, 4}
    /// let adj = CsrMatrix::from_triplets((5, 5), [(0, 1, 1.0f32), (1, 0, 1.0), (3, 4, 1.0), (4, 3, 1.0)]).unwrap();
    /// let components = adj.connected_components(Connection::Weak);
    /// assert_eq!(components.largest(2), vec![0, 2]);
    /// ```
    pub fn largest(&self, k: usize) -> Vec<NumNodes> {
        (0..self.number_of_components())
            .sorted_by(|&a, &b| {
                self.sizes[b as usize]
                    .cmp(&self.sizes[a as usize])
                    .then(a.cmp(&b))
            })
            .take(k)
            .collect()
    }

    /// Returns all nodes belonging to any of the given components in ascending order
    pub fn nodes_in(&self, components: &[NumNodes]) -> Vec<Node> {
        let mut selected = vec![false; self.sizes.len()];
        for &c in components {
            selected[c as usize] = true;
        }

        (0..self.labels.len() as Node)
            .filter(|&u| selected[self.labels[u as usize] as usize])
            .collect()
    }
}

/// Component computations on adjacency matrices.
pub trait Connectivity {
    /// Labels every node with its component under the given [`Connection`]
    fn connected_components(&self, connection: Connection) -> ComponentLabels;

    /// Returns the number of components under the given [`Connection`]
    fn number_of_components(&self, connection: Connection) -> NumNodes {
        self.connected_components(connection).number_of_components()
    }

    /// Returns `true` if there is exactly one component under the given [`Connection`]
    fn is_connected_under(&self, connection: Connection) -> bool {
        self.number_of_components(connection) == 1
    }
}

impl<T> Connectivity for CsrMatrix<T> {
    fn connected_components(&self, connection: Connection) -> ComponentLabels {
        assert!(self.is_square());
        match connection {
            Connection::Weak => weak_components(self),
            Connection::Strong => strong_components(self),
        }
    }
}

/// BFS over out- and in-neighbors.
/// The in-neighbors are taken from the transposed structure, values are not copied.
fn weak_components<T>(adj: &CsrMatrix<T>) -> ComponentLabels {
    let n = adj.rows();
    let reverse = adj.map(|_| ()).transpose();

    let mut labels = vec![INVALID_NODE; n];
    let mut sizes: Vec<NumNodes> = Vec::new();
    let mut visited = NodeBitSet::new(n as NumNodes);
    let mut queue: VecDeque<Node> = VecDeque::new();

    for start in 0..n as Node {
        if visited.set_bit(start) {
            continue;
        }

        let label = sizes.len() as NumNodes;
        let mut size: NumNodes = 0;
        queue.push_back(start);

        while let Some(u) = queue.pop_front() {
            labels[u as usize] = label;
            size += 1;

            for &v in adj.row_indices(u).iter().chain(reverse.row_indices(u)) {
                if !visited.set_bit(v) {
                    queue.push_back(v);
                }
            }
        }

        sizes.push(size);
    }

    ComponentLabels { labels, sizes }
}

/// Tarjan's algorithm with an explicit call stack, so deep graphs cannot overflow the stack.
///
/// On first visit a node gets a "DFS rank"ish index and the same low-link. The low-link is the
/// smallest index known to be reachable from the node. Once all neighbors are processed, a node
/// whose low-link equals its index is the root of a component consisting of all nodes above it on
/// the path stack.
fn strong_components<T>(adj: &CsrMatrix<T>) -> ComponentLabels {
    let n = adj.rows();

    let mut labels = vec![INVALID_NODE; n];
    let mut sizes: Vec<NumNodes> = Vec::new();
    let mut states = vec![NodeState::default(); n];
    let mut idx: Node = 0;

    let mut path_stack: Vec<Node> = Vec::with_capacity(32);
    let mut call_stack: Vec<StackFrame> = Vec::with_capacity(32);

    for start in 0..n as Node {
        if states[start as usize].visited {
            continue;
        }
        call_stack.push(StackFrame::new(start, start));

        'recurse: while let Some(frame) = call_stack.last_mut() {
            let v = frame.node;

            if frame.first_call {
                frame.first_call = false;
                states[v as usize].visit(idx);
                idx += 1;
                path_stack.push(v);
            }

            let neighbors = adj.row_indices(v);
            while frame.next < neighbors.len() {
                let w = neighbors[frame.next];
                frame.next += 1;

                let w_state = states[w as usize];
                if !w_state.visited {
                    call_stack.push(StackFrame::new(w, v));
                    continue 'recurse;
                } else if w_state.on_stack {
                    states[v as usize].try_lower_link(w_state.index);
                }
            }

            let parent = frame.parent;
            call_stack.pop();

            let state = states[v as usize];
            states[parent as usize].try_lower_link(state.low_link);

            if state.is_root() {
                let label = sizes.len() as NumNodes;
                let mut size: NumNodes = 0;

                while let Some(w) = path_stack.pop() {
                    states[w as usize].on_stack = false;
                    labels[w as usize] = label;
                    size += 1;

                    if w == v {
                        break;
                    }
                }

                sizes.push(size);
            }
        }
    }

    ComponentLabels { labels, sizes }
}

#[derive(Debug, Clone, Copy)]
struct StackFrame {
    node: Node,
    parent: Node,
    first_call: bool,
    next: usize,
}

impl StackFrame {
    fn new(node: Node, parent: Node) -> Self {
        Self {
            node,
            parent,
            first_call: true,
            next: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct NodeState {
    visited: bool,
    on_stack: bool,
    index: Node,
    low_link: Node,
}

impl NodeState {
    fn visit(&mut self, u: Node) {
        debug_assert!(!self.visited);
        self.index = u;
        self.low_link = u;
        self.visited = true;
        self.on_stack = true;
    }

    fn try_lower_link(&mut self, l: Node) {
        self.low_link = self.low_link.min(l);
    }

    fn is_root(&self) -> bool {
        self.index == self.low_link
    }
}

#[cfg(test)]
mod test {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    use super::*;

    fn directed(n: usize, edges: &[(Node, Node)]) -> CsrMatrix<f32> {
        CsrMatrix::from_triplets((n, n), edges.iter().map(|&(u, v)| (u, v, 1.0))).unwrap()
    }

    /// Groups nodes by label, sorts nodes in each component and the components lexicographically
    fn sorted_components(labels: &ComponentLabels) -> Vec<Vec<Node>> {
        (0..labels.number_of_components())
            .map(|c| labels.nodes_in(&[c]))
            .sorted()
            .collect()
    }

    #[test]
    fn weak_components_ignore_direction() {
        // 0 -> 1 <- 2, 3 -> 4, 5 isolated
        let adj = directed(6, &[(0, 1), (2, 1), (3, 4)]);
        let comps = adj.connected_components(Connection::Weak);

        assert_eq!(comps.number_of_components(), 3);
        assert_eq!(comps.labels(), &[0, 0, 0, 1, 1, 2]);
        assert_eq!(comps.sizes(), &[3, 2, 1]);
        assert_eq!(
            sorted_components(&comps),
            vec![vec![0, 1, 2], vec![3, 4], vec![5]]
        );
        assert!(!adj.is_connected_under(Connection::Weak));
    }

    #[test]
    fn largest_breaks_ties_by_label() {
        let adj = directed(7, &[(0, 1), (2, 3), (4, 5), (5, 6)]);
        let comps = adj.connected_components(Connection::Weak);

        assert_eq!(comps.sizes(), &[2, 2, 3]);
        assert_eq!(comps.largest(1), vec![2]);
        assert_eq!(comps.largest(2), vec![2, 0]);
        assert_eq!(comps.largest(10), vec![2, 0, 1]);
        assert_eq!(comps.nodes_in(&comps.largest(2)), vec![0, 1, 4, 5, 6]);
    }

    #[test]
    fn scc() {
        let adj = directed(
            8,
            &[
                (0, 1),
                (1, 2),
                (1, 4),
                (1, 5),
                (2, 6),
                (2, 3),
                (3, 2),
                (3, 7),
                (4, 0),
                (4, 5),
                (5, 6),
                (6, 5),
                (7, 3),
                (7, 6),
            ],
        );

        let comps = adj.connected_components(Connection::Strong);
        assert_eq!(comps.number_of_components(), 3);
        assert_eq!(
            sorted_components(&comps),
            vec![vec![0, 1, 4], vec![2, 3, 7], vec![5, 6]]
        );
        assert!(adj.is_connected_under(Connection::Weak));
    }

    #[test]
    fn scc_tree() {
        let adj = directed(7, &[(0, 1), (1, 2), (1, 3), (1, 4), (3, 5), (3, 6)]);
        // in a directed tree each vertex is a strongly connected component
        assert_eq!(adj.number_of_components(Connection::Strong), 7);
    }

    #[test]
    fn scc_long_cycle() {
        // assert that we can deal with very deep stacks
        let n: Node = 10_000;
        let edges = (0..n).map(|u| (u, (u + 1) % n)).collect_vec();
        let adj = directed(n as usize, &edges);

        let comps = adj.connected_components(Connection::Strong);
        assert_eq!(comps.number_of_components(), 1);
        assert_eq!(comps.sizes(), &[n]);
    }

    #[test]
    fn strong_refines_weak() {
        let rng = &mut Pcg64Mcg::seed_from_u64(1234);

        for i in 1..10 {
            let n = 200;
            let edges = (0..i * 40)
                .map(|_| (rng.random_range(0..n), rng.random_range(0..n)))
                .collect_vec();
            let adj = directed(n as usize, &edges);

            let weak = adj.connected_components(Connection::Weak);
            let strong = adj.connected_components(Connection::Strong);

            assert_eq!(weak.sizes().iter().sum::<NumNodes>(), n);
            assert_eq!(strong.sizes().iter().sum::<NumNodes>(), n);
            assert!(strong.number_of_components() >= weak.number_of_components());

            // nodes in the same strong component share the weak component
            for &(u, v) in &edges {
                if strong.label_of(u) == strong.label_of(v) {
                    assert_eq!(weak.label_of(u), weak.label_of(v));
                }
            }
        }
    }
}
