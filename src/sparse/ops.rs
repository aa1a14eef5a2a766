//! Structural operations on [`CsrMatrix`]: transposition, row/column selection and conversion
//! from and to dense `ndarray` matrices.

use ndarray::{Array2, ArrayView2};
use num::Zero;

use super::*;
use crate::{INVALID_NODE, Node, NumEdges, error::MatrixError};

impl<T: Copy> CsrMatrix<T> {
    /// Returns the transposed matrix.
    ///
    /// Built with a counting sort over the columns, so rows of the result are sorted without
    /// any comparison-based sorting.
    ///
    /// # Examples
    /// ```
    /// use attrgraph::sparse::CsrMatrix;
    ///
    /// let m = CsrMatrix::from_triplets((2, 3), [(0, 2, 1u32), (1, 0, 2)]).unwrap();
    /// let t = m.transpose();
    /// assert_eq!(t.shape(), (3, 2));
    /// assert_eq!(t.get(2, 0), Some(&1));
    /// assert_eq!(t.get(0, 1), Some(&2));
    /// ```
    pub fn transpose(&self) -> Self {
        let (nrows, ncols) = self.shape();

        let mut indptr: Vec<NumEdges> = vec![0; ncols + 1];
        for &col in self.indices() {
            indptr[col as usize + 1] += 1;
        }
        for i in 0..ncols {
            indptr[i + 1] += indptr[i];
        }

        let mut fill = indptr.clone();
        let mut indices: Vec<Node> = vec![0; self.nnz()];
        // Placeholder values, every position is overwritten below
        let mut data: Vec<T> = self.data().to_vec();

        for (row, col, &val) in self.iter() {
            let pos = fill[col as usize] as usize;
            indices[pos] = row;
            data[pos] = val;
            fill[col as usize] += 1;
        }

        CsrMatrix::from_canonical_parts(nrows, indptr, indices, data)
    }

    /// Returns the matrix consisting of the given rows (in the given order).
    ///
    /// # Panics
    /// Panics if a row is out of bounds.
    pub fn select_rows(&self, rows: &[Node]) -> Self {
        let nnz: usize = rows.iter().map(|&r| self.row_nnz(r)).sum();

        let mut indptr: Vec<NumEdges> = Vec::with_capacity(rows.len() + 1);
        let mut indices: Vec<Node> = Vec::with_capacity(nnz);
        let mut data: Vec<T> = Vec::with_capacity(nnz);

        indptr.push(0);
        for &row in rows {
            indices.extend_from_slice(self.row_indices(row));
            data.extend_from_slice(self.row_data(row));
            indptr.push(indices.len() as NumEdges);
        }

        CsrMatrix::from_canonical_parts(self.cols(), indptr, indices, data)
    }

    /// Returns the square submatrix induced by `nodes` on both rows and columns.
    ///
    /// `nodes` must be strictly increasing, so the relative order of columns is kept and the
    /// result is canonical without re-sorting.
    ///
    /// # Panics
    /// Panics if the matrix is not square or `nodes` is not strictly increasing.
    ///
    /// # Examples
    /// ```
    /// use attrgraph::sparse::CsrMatrix;
    ///
    /// let m = CsrMatrix::from_triplets((3, 3), [(0, 2, 1u8), (2, 0, 1), (1, 2, 1)]).unwrap();
    /// let s = m.principal_submatrix(&[0, 2]);
    /// assert_eq!(s.shape(), (2, 2));
    /// assert_eq!(s.nnz(), 2);
    /// assert_eq!(s.get(0, 1), Some(&1));
    /// ```
    pub fn principal_submatrix(&self, nodes: &[Node]) -> Self {
        assert!(self.is_square());
        assert!(nodes.is_sorted_by(|a, b| a < b));

        let mut new_id_of = vec![INVALID_NODE; self.rows()];
        for (new, &old) in nodes.iter().enumerate() {
            new_id_of[old as usize] = new as Node;
        }

        let mut indptr: Vec<NumEdges> = Vec::with_capacity(nodes.len() + 1);
        let mut indices: Vec<Node> = Vec::new();
        let mut data: Vec<T> = Vec::new();

        indptr.push(0);
        for &row in nodes {
            for (&col, &val) in self.row_indices(row).iter().zip(self.row_data(row)) {
                let new_col = new_id_of[col as usize];
                if new_col != INVALID_NODE {
                    indices.push(new_col);
                    data.push(val);
                }
            }
            indptr.push(indices.len() as NumEdges);
        }

        CsrMatrix::from_canonical_parts(nodes.len(), indptr, indices, data)
    }
}

impl<T: Copy + Zero> CsrMatrix<T> {
    /// Converts the matrix into a dense `ndarray` matrix
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem(self.shape(), T::zero());
        for (row, col, &val) in self.iter() {
            dense[[row as usize, col as usize]] = val;
        }
        dense
    }

    /// Converts a dense matrix into a sparse one, storing every non-zero entry
    ///
    /// # Errors
    /// Returns [`MatrixError::TooLarge`] if the matrix dimensions exceed the index types.
    pub fn from_dense(dense: ArrayView2<'_, T>) -> Result<Self, MatrixError>
    where
        T: PartialEq,
    {
        CsrMatrix::from_triplets(
            dense.dim(),
            dense
                .indexed_iter()
                .filter(|(_, val)| !val.is_zero())
                .map(|((row, col), &val)| (row as Node, col as Node, val)),
        )
    }
}
