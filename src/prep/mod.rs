/*!
# Graph Preparation

[`prep_graph`] turns a dataset identifier into model-ready tensors: a dense feature matrix,
a sparse adjacency matrix, one class label per node and (if requested and available) the
dataset's own split.

Two kinds of sources are supported:
- **file-backed** datasets (by default `cora_ml`, `citeseer` and `pubmed`) are read from
  `<dataset_root>/<name>.npz` and run through the full
  [standardization](crate::graph::SparseGraph::standardize),
- **external** benchmark datasets (identifiers starting with `ogbn` by default) are obtained
  from an [`ExternalLoader`]. Their edge list is unweighted and optionally symmetrized;
  no component is selected and the shipped split is kept.

Afterwards the features are optionally binarized or row-normalized.

# Example
```no_run
use attrgraph::prep::*;

let config = PrepConfig::default().dataset_root("data").feat_norm(true);
let prepared = prep_graph("cora_ml", &config, None).unwrap();
assert_eq!(prepared.features.nrows(), prepared.labels.len());
```
*/

mod external;
mod features;

pub use external::*;
pub use features::*;

use std::path::PathBuf;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    ClassId,
    error::{GraphError, Result},
    graph::{SparseGraph, StandardizeOptions},
    io::{DatasetFormat, load_dataset_as},
    sparse::CsrMatrix,
    split::IndexPartition,
};

/// Settings of [`prep_graph`].
///
/// Deserializable with missing keys falling back to the defaults, or built with setters:
/// ```
/// use attrgraph::prep::PrepConfig;
///
/// let config = PrepConfig::default()
///     .make_undirected(false)
///     .binary_attr(true)
///     .dataset_root("/tmp/datasets");
/// assert!(config.binary_attr);
/// assert_eq!(config.external_prefix, "ogbn");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    /// Symmetrize the adjacency matrix
    pub make_undirected: bool,
    /// Set every non-zero feature to `1` (takes precedence over `feat_norm`)
    pub binary_attr: bool,
    /// Normalize every feature row to sum `1`
    pub feat_norm: bool,
    /// Directory of dataset files, also passed to external loaders
    pub dataset_root: PathBuf,
    /// Return the dataset's own split if it ships one
    pub return_original_split: bool,
    /// Identifiers read from `<dataset_root>/<name>.<extension>`
    pub file_datasets: Vec<String>,
    /// Identifiers with this prefix are obtained from the external loader
    pub external_prefix: String,
    /// Format of dataset files
    pub format: DatasetFormat,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            make_undirected: true,
            binary_attr: false,
            feat_norm: false,
            dataset_root: PathBuf::from("datasets"),
            return_original_split: false,
            file_datasets: ["cora_ml", "citeseer", "pubmed"]
                .into_iter()
                .map(String::from)
                .collect(),
            external_prefix: "ogbn".to_string(),
            format: DatasetFormat::Npz,
        }
    }
}

impl PrepConfig {
    pub fn make_undirected(mut self, enabled: bool) -> Self {
        self.make_undirected = enabled;
        self
    }

    pub fn binary_attr(mut self, enabled: bool) -> Self {
        self.binary_attr = enabled;
        self
    }

    pub fn feat_norm(mut self, enabled: bool) -> Self {
        self.feat_norm = enabled;
        self
    }

    pub fn dataset_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.dataset_root = root.into();
        self
    }

    pub fn return_original_split(mut self, enabled: bool) -> Self {
        self.return_original_split = enabled;
        self
    }

    /// Replaces the list of file-backed dataset identifiers
    pub fn file_datasets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_datasets = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn external_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.external_prefix = prefix.into();
        self
    }

    pub fn format(mut self, format: DatasetFormat) -> Self {
        self.format = format;
        self
    }
}

/// Output of [`prep_graph`].
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedGraph {
    /// Dense `N x F` feature matrix
    pub features: Array2<f32>,
    /// Canonical (coalesced) `N x N` adjacency matrix
    pub adjacency: CsrMatrix<f32>,
    /// One class per node
    pub labels: Vec<ClassId>,
    /// The dataset's own split (only if requested and available)
    pub split: Option<IndexPartition>,
}

/// Loads and normalizes the dataset `name`.
///
/// # Errors
/// - [`GraphError::UnknownDataset`] if `name` is neither a file-backed dataset nor starts
///   with the external prefix,
/// - [`GraphError::Usage`] if an external dataset is requested without loader,
/// - [`GraphError::MissingArray`] if a file-backed dataset lacks attributes or labels,
/// - all errors of loading and standardizing the dataset.
pub fn prep_graph(
    name: &str,
    config: &PrepConfig,
    external: Option<&dyn ExternalLoader>,
) -> Result<PreparedGraph> {
    let (graph, split) = if config.file_datasets.iter().any(|d| d == name) {
        let options = StandardizeOptions::default().make_undirected(config.make_undirected);
        let graph = load_dataset_as(name, &config.dataset_root, config.format)?;
        (graph.standardize(&options)?, None)
    } else if name.starts_with(config.external_prefix.as_str()) {
        let loader = external.ok_or_else(|| {
            GraphError::Usage(format!("dataset `{name}` requires an external loader"))
        })?;
        loader
            .load(name, &config.dataset_root)?
            .into_graph(config.make_undirected)?
    } else {
        return Err(GraphError::UnknownDataset(name.to_string()));
    };

    let mut prepared = into_prepared(graph)?;
    info!(
        "Prepared `{name}`: {} nodes, {} features, {} stored edges",
        prepared.features.nrows(),
        prepared.features.ncols(),
        prepared.adjacency.nnz()
    );

    if config.binary_attr {
        debug!("Binarizing features");
        binarize(&mut prepared.features);
    } else if config.feat_norm {
        debug!("Row-normalizing features");
        row_norm(&mut prepared.features);
    }

    if config.return_original_split {
        if split.is_none() {
            debug!("`{name}` does not ship a split");
        }
        prepared.split = split;
    }

    Ok(prepared)
}

fn into_prepared(graph: SparseGraph) -> Result<PreparedGraph> {
    let parts = graph.into_parts();
    let features = parts
        .attributes
        .ok_or_else(|| GraphError::MissingArray("attr_matrix".into()))?
        .into_dense();
    let labels = parts
        .labels
        .ok_or_else(|| GraphError::MissingArray("labels".into()))?
        .into_classes();

    Ok(PreparedGraph {
        features,
        adjacency: parts.adjacency,
        labels,
        split: None,
    })
}
