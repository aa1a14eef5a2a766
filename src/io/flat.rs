use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    ClassId, Node, NumEdges,
    error::{GraphError, MatrixError, Result, raise_error_unless},
    graph::{Attributes, Labels, Metadata, SparseGraph, SparseGraphParts},
    sparse::CsrMatrix,
};

/// Raw CSR encoding as stored on disk: `<name>_data`, `<name>_indices`, `<name>_indptr` and
/// `<name>_shape`. Index arrays are kept as signed 64-bit integers until [`CsrParts::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrParts {
    pub data: Vec<f32>,
    pub indices: Vec<i64>,
    pub indptr: Vec<i64>,
    pub shape: Vec<i64>,
}

fn convert_index<I: TryFrom<i64>>(array: &'static str, value: i64) -> Result<I, MatrixError> {
    I::try_from(value).map_err(|_| MatrixError::InvalidIndex { array, value })
}

impl CsrParts {
    /// Validates and canonicalizes the encoding (see [`CsrMatrix::try_new`])
    pub fn decode(self) -> Result<CsrMatrix<f32>, MatrixError> {
        raise_error_unless!(self.shape.len() == 2, MatrixError::ShapeRank(self.shape.len()));
        let rows: usize = convert_index("shape", self.shape[0])?;
        let cols: usize = convert_index("shape", self.shape[1])?;

        let indptr = self
            .indptr
            .into_iter()
            .map(|v| convert_index::<NumEdges>("indptr", v))
            .collect::<Result<Vec<_>, _>>()?;
        let indices = self
            .indices
            .into_iter()
            .map(|v| convert_index::<Node>("indices", v))
            .collect::<Result<Vec<_>, _>>()?;

        CsrMatrix::try_new((rows, cols), indptr, indices, self.data)
    }

    /// Encodes a matrix
    pub fn encode(matrix: &CsrMatrix<f32>) -> Self {
        Self {
            data: matrix.data().to_vec(),
            indices: matrix.indices().iter().map(|&c| c as i64).collect(),
            indptr: matrix.indptr().iter().map(|&p| p as i64).collect(),
            shape: vec![matrix.rows() as i64, matrix.cols() as i64],
        }
    }
}

/// Flat on-disk representation of a [`SparseGraph`] with a fixed schema.
///
/// Every field corresponds to a named array (or a group of arrays for [`CsrParts`]):
///
/// | field | arrays |
/// |---|---|
/// | `adj` | `adj_data`, `adj_indices`, `adj_indptr`, `adj_shape` |
/// | `attr` | `attr_data`, `attr_indices`, `attr_indptr`, `attr_shape` |
/// | `attr_matrix` | `attr_matrix` (dense) |
/// | `labels` | `labels` (one class per node) |
/// | `label_matrix` | `labels_data`, `labels_indices`, `labels_indptr`, `labels_shape` |
/// | `node_names`, `attr_names`, `class_names`, `metadata` | arrays of the same name |
///
/// A `FlatGraph` is not validated; [`FlatGraph::decode`] turns it into a graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatGraph {
    pub adj: Option<CsrParts>,
    pub attr: Option<CsrParts>,
    pub attr_matrix: Option<Array2<f32>>,
    pub labels: Option<Vec<ClassId>>,
    pub label_matrix: Option<CsrParts>,
    pub node_names: Option<Vec<String>>,
    pub attr_names: Option<Vec<String>>,
    pub class_names: Option<Vec<String>>,
    pub metadata: Option<Metadata>,
}

impl FlatGraph {
    /// Decodes all present parts and assembles the graph.
    ///
    /// If both a sparse and a dense attribute matrix (or class labels and a label matrix)
    /// are present, the sparse attribute matrix (and the class labels) take precedence.
    ///
    /// # Errors
    /// Returns [`GraphError::MissingArray`] without adjacency matrix, and otherwise the
    /// errors of [`CsrParts::decode`] and [`SparseGraphParts::build`].
    pub fn decode(self) -> Result<SparseGraph> {
        let adjacency = self
            .adj
            .ok_or_else(|| GraphError::MissingArray("adj_data".into()))?
            .decode()?;

        let attributes = match (self.attr, self.attr_matrix) {
            (Some(parts), _) => Some(Attributes::Sparse(parts.decode()?)),
            (None, Some(dense)) => Some(Attributes::Dense(dense)),
            (None, None) => None,
        };

        let labels = match (self.labels, self.label_matrix) {
            (Some(classes), _) => Some(Labels::Classes(classes)),
            (None, Some(parts)) => Some(Labels::OneHot(parts.decode()?)),
            (None, None) => None,
        };

        Ok(SparseGraphParts {
            adjacency,
            attributes,
            labels,
            node_names: self.node_names,
            attribute_names: self.attr_names,
            class_names: self.class_names,
            metadata: self.metadata,
        }
        .build()?)
    }
}

impl From<&SparseGraph> for FlatGraph {
    fn from(graph: &SparseGraph) -> Self {
        let (attr, attr_matrix) = match graph.attributes() {
            Some(Attributes::Sparse(m)) => (Some(CsrParts::encode(m)), None),
            Some(Attributes::Dense(m)) => (None, Some(m.clone())),
            None => (None, None),
        };
        let (labels, label_matrix) = match graph.labels() {
            Some(Labels::Classes(c)) => (Some(c.clone()), None),
            Some(Labels::OneHot(m)) => (None, Some(CsrParts::encode(m))),
            None => (None, None),
        };

        Self {
            adj: Some(CsrParts::encode(graph.adjacency())),
            attr,
            attr_matrix,
            labels,
            label_matrix,
            node_names: graph.node_names().map(<[String]>::to_vec),
            attr_names: graph.attribute_names().map(<[String]>::to_vec),
            class_names: graph.class_names().map(<[String]>::to_vec),
            metadata: graph.metadata().cloned(),
        }
    }
}
