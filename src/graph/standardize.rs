use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::*;
use crate::error::Result;

/// Selects which normalization steps [`SparseGraph::standardize`] applies.
///
/// All steps are enabled by default. Use the setters to disable individual steps:
/// ```
/// use attrgraph::graph::StandardizeOptions;
///
/// let options = StandardizeOptions::default().select_largest_component(false);
/// assert!(options.make_undirected);
/// assert!(!options.select_largest_component);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardizeOptions {
    pub make_unweighted: bool,
    pub make_undirected: bool,
    pub remove_self_loops: bool,
    pub select_largest_component: bool,
}

impl Default for StandardizeOptions {
    fn default() -> Self {
        Self {
            make_unweighted: true,
            make_undirected: true,
            remove_self_loops: true,
            select_largest_component: true,
        }
    }
}

impl StandardizeOptions {
    pub fn make_unweighted(mut self, enabled: bool) -> Self {
        self.make_unweighted = enabled;
        self
    }

    pub fn make_undirected(mut self, enabled: bool) -> Self {
        self.make_undirected = enabled;
        self
    }

    pub fn remove_self_loops(mut self, enabled: bool) -> Self {
        self.remove_self_loops = enabled;
        self
    }

    pub fn select_largest_component(mut self, enabled: bool) -> Self {
        self.select_largest_component = enabled;
        self
    }

    /// Returns the enabled steps in the order they are applied
    pub fn steps(&self) -> impl Iterator<Item = StandardizeStep> + '_ {
        [
            (self.make_unweighted, StandardizeStep::Unweight),
            (self.make_undirected, StandardizeStep::Undirect),
            (self.remove_self_loops, StandardizeStep::RemoveSelfLoops),
            (
                self.select_largest_component,
                StandardizeStep::LargestComponent,
            ),
        ]
        .into_iter()
        .filter_map(|(enabled, step)| enabled.then_some(step))
    }
}

/// A single normalization applied by [`SparseGraph::standardize`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StandardizeStep {
    Unweight,
    Undirect,
    RemoveSelfLoops,
    LargestComponent,
}

impl StandardizeStep {
    /// Returns `true` if the graph does not yet satisfy the postcondition of this step
    pub fn is_needed(&self, graph: &SparseGraph) -> bool {
        match self {
            StandardizeStep::Unweight => graph.is_weighted(),
            StandardizeStep::Undirect => graph.is_directed(),
            StandardizeStep::RemoveSelfLoops => graph.has_self_loops(),
            StandardizeStep::LargestComponent => !graph.is_connected(),
        }
    }

    /// Applies the step
    pub fn apply(&self, graph: SparseGraph) -> Result<SparseGraph> {
        Ok(match self {
            StandardizeStep::Unweight => graph.to_unweighted(),
            StandardizeStep::Undirect => graph.to_undirected()?,
            StandardizeStep::RemoveSelfLoops => graph.remove_self_loops(),
            StandardizeStep::LargestComponent => {
                graph.largest_connected_components(1, Connection::Weak)
            }
        })
    }
}

impl fmt::Display for StandardizeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StandardizeStep::Unweight => "make unweighted",
            StandardizeStep::Undirect => "make undirected",
            StandardizeStep::RemoveSelfLoops => "remove self-loops",
            StandardizeStep::LargestComponent => "select largest component",
        })
    }
}

impl SparseGraph {
    /// Applies the enabled normalization steps in the fixed order
    /// unweight, undirect, remove self-loops and select the largest (weak) component.
    /// Steps whose postcondition already holds are skipped.
    ///
    /// # Errors
    /// Propagates the error of a failing step (see [`SparseGraph::to_undirected`]).
    ///
    /// # Examples
    /// ```
    /// use attrgraph::{graph::*, sparse::CsrMatrix};
    ///
    /// let adjacency = CsrMatrix::from_triplets(
    ///     (4, 4),
    ///     [(0, 1, 3.0), (1, 2, 1.0), (2, 2, 1.0)],
    /// ).unwrap();
    /// let graph = SparseGraphParts::new(adjacency).build().unwrap();
    /// let graph = graph.standardize(&StandardizeOptions::default()).unwrap();
    ///
    /// assert_eq!(graph.num_nodes(), 3);
    /// assert!(!graph.is_directed() && !graph.is_weighted() && !graph.has_self_loops());
    /// assert!(graph.is_connected());
    /// ```
    pub fn standardize(self, options: &StandardizeOptions) -> Result<Self> {
        options.steps().try_fold(self, |graph, step| {
            if !step.is_needed(&graph) {
                return Ok(graph);
            }

            let graph = step.apply(graph)?;
            debug!(
                "{step}: {} nodes, {} stored edges",
                graph.num_nodes(),
                graph.adjacency().nnz()
            );
            Ok(graph)
        })
    }
}

#[cfg(test)]
mod test {
    use itertools::Itertools;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::testing::*;

    #[test]
    fn steps_in_order() {
        assert_eq!(
            StandardizeOptions::default().steps().collect_vec(),
            vec![
                StandardizeStep::Unweight,
                StandardizeStep::Undirect,
                StandardizeStep::RemoveSelfLoops,
                StandardizeStep::LargestComponent
            ]
        );
        assert_eq!(
            StandardizeOptions::default()
                .make_unweighted(false)
                .remove_self_loops(false)
                .steps()
                .collect_vec(),
            vec![StandardizeStep::Undirect, StandardizeStep::LargestComponent]
        );
    }

    #[test]
    fn standardize_random() {
        let rng = &mut Pcg64Mcg::seed_from_u64(0x5eed);

        for _ in 0..30 {
            let n = rng.random_range(5..60);
            let graph = random_graph(rng, n, 0.05, true);
            let nodes_before = graph.num_nodes();

            let graph = graph.standardize(&StandardizeOptions::default()).unwrap();
            assert!(!graph.is_weighted());
            assert!(!graph.is_directed());
            assert!(!graph.has_self_loops());
            assert!(graph.is_connected());
            assert!(graph.num_nodes() <= nodes_before);
            assert_eq!(
                graph.labels().map(Labels::len),
                Some(graph.num_nodes())
            );
        }
    }

    #[test]
    fn disabled_steps_are_skipped() {
        let graph = graph_from_edges(4, &[(0, 1, 2.0), (2, 2, 1.0)]);
        let options = StandardizeOptions::default()
            .make_unweighted(false)
            .select_largest_component(false);

        let graph = graph.standardize(&options).unwrap();
        assert_eq!(graph.num_nodes(), 4);
        assert!(graph.is_weighted());
        assert!(!graph.is_directed());
        assert!(!graph.has_self_loops());
    }

    #[test]
    fn weighted_conflict_propagates() {
        let graph = graph_from_edges(2, &[(0, 1, 2.0), (1, 0, 3.0)]);
        let options = StandardizeOptions::default().make_unweighted(false);
        assert!(graph.standardize(&options).is_err());
    }
}
