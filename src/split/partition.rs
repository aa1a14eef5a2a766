use fxhash::FxHashSet;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::{Node, sparse::CsrMatrix};

/// Row indices of a train/validation/test partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPartition {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Vec<usize>,
}

/// The rows of a single array selected by an [`IndexPartition`].
#[derive(Debug, Clone, PartialEq)]
pub struct SplitRows<T> {
    pub train: T,
    pub val: T,
    pub test: T,
}

impl IndexPartition {
    /// Returns the total number of indices in all three sets
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if no index occurs twice (within or across the three sets)
    pub fn is_disjoint(&self) -> bool {
        let mut seen = FxHashSet::default();
        self.train
            .iter()
            .chain(&self.val)
            .chain(&self.test)
            .all(|i| seen.insert(*i))
    }

    /// Selects the train, validation and test rows of `array`
    ///
    /// # Panics
    /// Panics if an index is out of bounds for `array`.
    pub fn select<R: RowSelect + ?Sized>(&self, array: &R) -> SplitRows<R::Output> {
        SplitRows {
            train: array.select_rows(&self.train),
            val: array.select_rows(&self.val),
            test: array.select_rows(&self.test),
        }
    }
}

/// Arrays whose rows (first dimension) can be selected by index.
pub trait RowSelect {
    type Output;

    /// Returns the length of the first dimension
    fn num_rows(&self) -> usize;

    /// Returns the given rows in the given order
    fn select_rows(&self, rows: &[usize]) -> Self::Output;
}

impl<T: Clone> RowSelect for [T] {
    type Output = Vec<T>;

    fn num_rows(&self) -> usize {
        self.len()
    }

    fn select_rows(&self, rows: &[usize]) -> Vec<T> {
        rows.iter().map(|&r| self[r].clone()).collect()
    }
}

impl<T: Clone> RowSelect for Vec<T> {
    type Output = Vec<T>;

    fn num_rows(&self) -> usize {
        self.len()
    }

    fn select_rows(&self, rows: &[usize]) -> Vec<T> {
        self.as_slice().select_rows(rows)
    }
}

impl<A: Clone> RowSelect for Array1<A> {
    type Output = Array1<A>;

    fn num_rows(&self) -> usize {
        self.len()
    }

    fn select_rows(&self, rows: &[usize]) -> Array1<A> {
        self.select(Axis(0), rows)
    }
}

impl<A: Clone> RowSelect for Array2<A> {
    type Output = Array2<A>;

    fn num_rows(&self) -> usize {
        self.nrows()
    }

    fn select_rows(&self, rows: &[usize]) -> Array2<A> {
        self.select(Axis(0), rows)
    }
}

impl<T: Copy> RowSelect for CsrMatrix<T> {
    type Output = CsrMatrix<T>;

    fn num_rows(&self) -> usize {
        self.rows()
    }

    fn select_rows(&self, rows: &[usize]) -> CsrMatrix<T> {
        let rows: Vec<Node> = rows.iter().map(|&r| r as Node).collect();
        CsrMatrix::select_rows(self, &rows)
    }
}
