use std::ops::Range;

use itertools::Itertools;
use num::Zero;

use crate::{
    INVALID_NODE, Node, NumEdges,
    edge::Edge,
    error::{MatrixError, raise_error_unless},
};

/// Canonical CSR matrix with values of type `T`.
///
/// Rows and columns are addressed by [`Node`] (also for attribute matrices, where columns are
/// features). See the [module documentation](crate::sparse) for the invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    ncols: usize,
    indptr: Vec<NumEdges>,
    indices: Vec<Node>,
    data: Vec<T>,
}

impl<T> CsrMatrix<T> {
    /// Creates an all-zero matrix of the given shape
    pub fn zeros(shape: (usize, usize)) -> Self {
        Self {
            ncols: shape.1,
            indptr: vec![0; shape.0 + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Assembles a matrix from parts that are known to be canonical.
    /// Only checked in debug builds.
    pub(crate) fn from_canonical_parts(
        ncols: usize,
        indptr: Vec<NumEdges>,
        indices: Vec<Node>,
        data: Vec<T>,
    ) -> Self {
        debug_assert!(!indptr.is_empty());
        debug_assert!(indptr.is_sorted());
        debug_assert_eq!(*indptr.last().unwrap() as usize, indices.len());
        debug_assert_eq!(indices.len(), data.len());
        debug_assert!(indptr.windows(2).all(|w| {
            indices[w[0] as usize..w[1] as usize].is_sorted_by(|a, b| a < b)
        }));
        debug_assert!(indices.iter().all(|&c| (c as usize) < ncols));

        Self {
            ncols,
            indptr,
            indices,
            data,
        }
    }

    /// Returns the number of rows
    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.indptr.len() - 1
    }

    /// Returns the number of columns
    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.ncols
    }

    /// Returns `(rows, cols)`
    #[inline(always)]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.ncols)
    }

    /// Returns `true` if the matrix has as many rows as columns
    pub fn is_square(&self) -> bool {
        self.rows() == self.ncols
    }

    /// Returns the number of stored entries (including explicitly stored zeros)
    #[inline(always)]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn indptr(&self) -> &[NumEdges] {
        &self.indptr
    }

    pub fn indices(&self) -> &[Node] {
        &self.indices
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to the stored values. The sparsity structure cannot be altered this way.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Decomposes the matrix into `(shape, indptr, indices, data)`
    pub fn into_parts(self) -> ((usize, usize), Vec<NumEdges>, Vec<Node>, Vec<T>) {
        (self.shape(), self.indptr, self.indices, self.data)
    }

    /// Returns the range of positions in `indices`/`data` belonging to `row`
    #[inline(always)]
    pub fn row_range(&self, row: Node) -> Range<usize> {
        self.indptr[row as usize] as usize..self.indptr[row as usize + 1] as usize
    }

    /// Returns the (sorted) column indices stored in `row`
    #[inline(always)]
    pub fn row_indices(&self, row: Node) -> &[Node] {
        &self.indices[self.row_range(row)]
    }

    /// Returns the values stored in `row` (parallel to [`CsrMatrix::row_indices`])
    #[inline(always)]
    pub fn row_data(&self, row: Node) -> &[T] {
        &self.data[self.row_range(row)]
    }

    /// Returns the number of entries stored in `row`
    pub fn row_nnz(&self, row: Node) -> usize {
        self.row_range(row).len()
    }

    /// Returns the position of entry `(row, col)` in `indices`/`data` if it is stored
    pub fn position_of(&self, row: Node, col: Node) -> Option<usize> {
        let range = self.row_range(row);
        self.indices[range.clone()]
            .binary_search(&col)
            .ok()
            .map(|i| range.start + i)
    }

    /// Returns a reference to the value stored at `(row, col)`
    ///
    /// # Examples
    /// ```
    /// use attrgraph::sparse::CsrMatrix;
    ///
    /// let m = CsrMatrix::from_triplets((2, 2), [(0, 1, 2.0f32), (1, 0, 3.0)]).unwrap();
    /// assert_eq!(m.get(0, 1), Some(&2.0));
    /// assert_eq!(m.get(0, 0), None);
    /// ```
    pub fn get(&self, row: Node, col: Node) -> Option<&T> {
        self.position_of(row, col).map(|pos| &self.data[pos])
    }

    /// Iterates over all stored entries `(row, col, &value)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Node, Node, &T)> + '_ {
        (0..self.rows() as Node).flat_map(move |row| {
            self.row_indices(row)
                .iter()
                .zip(self.row_data(row))
                .map(move |(&col, val)| (row, col, val))
        })
    }

    /// Iterates over the coordinates of all stored entries in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Edge> + '_ {
        (0..self.rows() as Node)
            .flat_map(move |row| self.row_indices(row).iter().map(move |&col| Edge(row, col)))
    }

    /// Returns the row index of every stored entry (the COO row array)
    pub fn row_of_entries(&self) -> Vec<Node> {
        self.indptr
            .iter()
            .tuple_windows()
            .enumerate()
            .flat_map(|(row, (&beg, &end))| std::iter::repeat_n(row as Node, (end - beg) as usize))
            .collect()
    }

    /// Creates a matrix with the same sparsity structure and new values
    ///
    /// # Panics
    /// Panics if `data.len() != self.nnz()`.
    pub fn with_data<U>(&self, data: Vec<U>) -> CsrMatrix<U> {
        assert_eq!(data.len(), self.nnz());
        CsrMatrix {
            ncols: self.ncols,
            indptr: self.indptr.clone(),
            indices: self.indices.clone(),
            data,
        }
    }

    /// Maps every stored value, keeping the sparsity structure
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> CsrMatrix<U> {
        self.with_data(self.data.iter().map(f).collect())
    }

    /// Maps every stored value in place of the matrix, reusing the structure buffers
    pub fn map_into<U, F: FnMut(T) -> U>(self, f: F) -> CsrMatrix<U> {
        CsrMatrix {
            ncols: self.ncols,
            indptr: self.indptr,
            indices: self.indices,
            data: self.data.into_iter().map(f).collect(),
        }
    }

    /// Removes all stored entries for which `keep` returns `false` and compacts the storage in
    /// place. Returns the number of removed entries.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(Node, Node, &T) -> bool,
    {
        let before = self.nnz();
        let mut write = 0usize;
        let mut read = 0usize;

        for row in 0..self.rows() {
            let end = self.indptr[row + 1] as usize;
            while read < end {
                if keep(row as Node, self.indices[read], &self.data[read]) {
                    self.indices.swap(write, read);
                    self.data.swap(write, read);
                    write += 1;
                }
                read += 1;
            }
            self.indptr[row + 1] = write as NumEdges;
        }

        self.indices.truncate(write);
        self.data.truncate(write);
        before - write
    }
}

impl<T> Default for CsrMatrix<T> {
    fn default() -> Self {
        Self::zeros((0, 0))
    }
}

impl<T: Copy + Zero> CsrMatrix<T> {
    /// Creates a matrix from raw CSR parts as found in foreign encodings.
    ///
    /// The parts are validated and then canonicalized: entries beyond `indptr[rows]` are
    /// dropped, every row is sorted by column and duplicate coordinates are summed.
    ///
    /// # Errors
    /// Returns a [`MatrixError`] if the parts do not describe a matrix of the given shape.
    ///
    /// # Examples
    /// ```
    /// use attrgraph::sparse::CsrMatrix;
    ///
    /// // Row 0 stores column 1 twice and out of order
    /// let m = CsrMatrix::try_new((2, 3), vec![0, 3, 4], vec![2, 1, 1, 0], vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(m.row_indices(0), &[1, 2]);
    /// assert_eq!(m.row_data(0), &[5.0, 1.0]);
    /// assert_eq!(m.nnz(), 3);
    /// ```
    pub fn try_new(
        shape: (usize, usize),
        indptr: Vec<NumEdges>,
        mut indices: Vec<Node>,
        mut data: Vec<T>,
    ) -> Result<Self, MatrixError> {
        let (nrows, ncols) = shape;

        raise_error_unless!(
            indptr.len() == nrows + 1,
            MatrixError::IndptrLength {
                expected: nrows + 1,
                found: indptr.len(),
            }
        );
        raise_error_unless!(
            nrows < INVALID_NODE as usize && ncols < INVALID_NODE as usize,
            MatrixError::TooLarge(nrows.max(ncols))
        );
        raise_error_unless!(
            indices.len() <= NumEdges::MAX as usize,
            MatrixError::TooLarge(indices.len())
        );
        raise_error_unless!(
            data.len() == indices.len(),
            MatrixError::DataLength {
                data: data.len(),
                indices: indices.len(),
            }
        );
        raise_error_unless!(
            indptr[0] == 0 && indptr.is_sorted(),
            MatrixError::IndptrNotSorted
        );

        let end = indptr[nrows] as usize;
        raise_error_unless!(
            end <= indices.len(),
            MatrixError::IndptrOutOfBounds {
                end,
                entries: indices.len(),
            }
        );
        indices.truncate(end);
        data.truncate(end);

        for (row, (&beg, &end)) in indptr.iter().tuple_windows().enumerate() {
            if let Some(&col) = indices[beg as usize..end as usize]
                .iter()
                .find(|&&col| col as usize >= ncols)
            {
                return Err(MatrixError::ColumnOutOfBounds {
                    row,
                    col: col as usize,
                    cols: ncols,
                });
            }
        }

        let mut matrix = Self {
            ncols,
            indptr,
            indices,
            data,
        };
        matrix.canonicalize();
        Ok(matrix)
    }

    /// Creates a matrix from `(row, col, value)`-triplets. Duplicate coordinates are summed.
    ///
    /// # Errors
    /// Returns a [`MatrixError`] if a coordinate lies outside of `shape`.
    pub fn from_triplets<I>(shape: (usize, usize), triplets: I) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = (Node, Node, T)>,
    {
        let (nrows, ncols) = shape;
        raise_error_unless!(
            nrows < INVALID_NODE as usize && ncols < INVALID_NODE as usize,
            MatrixError::TooLarge(nrows.max(ncols))
        );

        let triplets = triplets.into_iter().collect_vec();
        raise_error_unless!(
            triplets.len() <= NumEdges::MAX as usize,
            MatrixError::TooLarge(triplets.len())
        );

        // Counting sort by row
        let mut indptr: Vec<NumEdges> = vec![0; nrows + 1];
        for &(row, col, _) in &triplets {
            raise_error_unless!(
                (row as usize) < nrows,
                MatrixError::RowOutOfBounds {
                    row: row as usize,
                    rows: nrows,
                }
            );
            raise_error_unless!(
                (col as usize) < ncols,
                MatrixError::ColumnOutOfBounds {
                    row: row as usize,
                    col: col as usize,
                    cols: ncols,
                }
            );
            indptr[row as usize + 1] += 1;
        }
        for i in 0..nrows {
            indptr[i + 1] += indptr[i];
        }

        let mut fill = indptr.clone();
        let mut indices = vec![0 as Node; triplets.len()];
        let mut data = vec![T::zero(); triplets.len()];
        for (row, col, val) in triplets {
            let pos = fill[row as usize] as usize;
            indices[pos] = col;
            data[pos] = val;
            fill[row as usize] += 1;
        }

        let mut matrix = Self {
            ncols,
            indptr,
            indices,
            data,
        };
        matrix.canonicalize();
        Ok(matrix)
    }

    /// Sorts every row by column and sums duplicate coordinates, compacting in place
    fn canonicalize(&mut self) {
        let mut scratch: Vec<(Node, T)> = Vec::new();
        let mut write = 0usize;
        let mut beg = 0usize;

        for row in 0..self.rows() {
            let end = self.indptr[row + 1] as usize;

            if self.indices[beg..end].is_sorted_by(|a, b| a < b) {
                self.indices.copy_within(beg..end, write);
                self.data.copy_within(beg..end, write);
                write += end - beg;
            } else {
                scratch.clear();
                scratch.extend(
                    self.indices[beg..end]
                        .iter()
                        .copied()
                        .zip(self.data[beg..end].iter().copied()),
                );
                scratch.sort_by_key(|&(col, _)| col);

                for (col, group) in &scratch.iter().chunk_by(|&&(col, _)| col) {
                    self.indices[write] = col;
                    self.data[write] = group.fold(T::zero(), |acc, &(_, val)| acc + val);
                    write += 1;
                }
            }

            beg = end;
            self.indptr[row + 1] = write as NumEdges;
        }

        self.indices.truncate(write);
        self.data.truncate(write);
    }

    /// Returns the main diagonal (missing entries are zero)
    pub fn diagonal(&self) -> Vec<T> {
        (0..self.rows().min(self.ncols) as Node)
            .map(|i| self.get(i, i).copied().unwrap_or_else(T::zero))
            .collect()
    }

    /// Removes explicitly stored zeros. Returns the number of removed entries.
    pub fn eliminate_zeros(&mut self) -> usize {
        self.retain(|_, _, val| !val.is_zero())
    }
}
