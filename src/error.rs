/*!
# Errors

All fallible operations of this crate return [`GraphError`].
The variants follow four families:
- **structural validation**: [`GraphError::Construction`], [`GraphError::Matrix`] and
  [`GraphError::WeightConflict`],
- **usage errors**: [`GraphError::Usage`], [`GraphError::InvalidSplit`] and
  [`GraphError::LengthMismatch`],
- **unsupported input**: [`GraphError::UnknownDataset`], [`GraphError::MissingFile`],
  [`GraphError::MissingArray`] and [`GraphError::UnsupportedDtype`],
- **boundary failures**: [`GraphError::InsufficientClassMembers`].

IO and (de)serialization failures are wrapped transparently.
*/

use std::path::PathBuf;

use thiserror::Error;

use crate::{ClassId, Node};

/// Violation of one of the invariants checked when a
/// [`SparseGraph`](crate::graph::SparseGraph) is constructed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("adjacency matrix must be square, got shape {rows}x{cols}")]
    NonSquareAdjacency { rows: usize, cols: usize },

    #[error("attribute matrix has {found} rows but the graph has {expected} nodes")]
    AttributeRows { expected: usize, found: usize },

    #[error("label array has length {found} but the graph has {expected} nodes")]
    LabelLength { expected: usize, found: usize },

    #[error("node names have length {found} but the graph has {expected} nodes")]
    NodeNameLength { expected: usize, found: usize },

    #[error("attribute names have length {found} but the attribute matrix has {expected} columns")]
    AttributeNameLength { expected: usize, found: usize },
}

/// A compressed-sparse-row encoding that does not describe a valid matrix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("indptr has length {found}, expected {expected} (rows + 1)")]
    IndptrLength { expected: usize, found: usize },

    #[error("indptr must be non-decreasing and start at zero")]
    IndptrNotSorted,

    #[error("indptr ends at {end} but only {entries} entries are stored")]
    IndptrOutOfBounds { end: usize, entries: usize },

    #[error("column index {col} in row {row} is out of bounds for {cols} columns")]
    ColumnOutOfBounds { row: usize, col: usize, cols: usize },

    #[error("row index {row} is out of bounds for {rows} rows")]
    RowOutOfBounds { row: usize, rows: usize },

    #[error("data has length {data} but indices have length {indices}")]
    DataLength { data: usize, indices: usize },

    #[error("value {value} in `{array}` is not a valid index")]
    InvalidIndex { array: &'static str, value: i64 },

    #[error("shape must have exactly two entries, got {0}")]
    ShapeRank(usize),

    #[error("matrix dimension {0} exceeds the supported number of nodes/entries")]
    TooLarge(usize),
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("invalid graph: {0}")]
    Construction(#[from] ConstructionError),

    #[error("invalid sparse matrix: {0}")]
    Matrix(#[from] MatrixError),

    #[error(
        "adjacency weights of opposing edges differ: A[{row},{col}] = {forward} but A[{col},{row}] = {reverse}"
    )]
    WeightConflict {
        row: Node,
        col: Node,
        forward: f32,
        reverse: f32,
    },

    #[error("invalid usage: {0}")]
    Usage(String),

    #[error("invalid split configuration: {0}")]
    InvalidSplit(String),

    #[error("arrays must have equal first dimension: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("dataset `{0}` is not supported")]
    UnknownDataset(String),

    #[error("{} doesn't exist", .0.display())]
    MissingFile(PathBuf),

    #[error("array `{0}` is missing from the dataset")]
    MissingArray(String),

    #[error("array `{array}` has an unsupported dtype")]
    UnsupportedDtype { array: String },

    #[error("class {class} has only {found} members, but {required} are required")]
    InsufficientClassMembers {
        class: ClassId,
        found: usize,
        required: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ReadNpz(#[from] ndarray_npy::ReadNpzError),

    #[error(transparent)]
    WriteNpz(#[from] ndarray_npy::WriteNpzError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;

/// Shorthand for returning `Err(GraphError)` early when a condition fails
macro_rules! raise_error_unless {
    ($cond : expr, $err : expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

pub(crate) use raise_error_unless;
