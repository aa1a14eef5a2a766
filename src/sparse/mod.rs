/*!
# Sparse Matrices

This module provides the **Compressed Sparse Row (CSR)** matrix [`CsrMatrix`] that stores
adjacency matrices, sparse attribute matrices and one-hot label matrices.

A CSR matrix stores all entries of a row contiguously:

- `indptr`: non-decreasing offsets with `rows + 1` entries, row `i` lives in `indptr[i]..indptr[i+1]`,
- `indices`: column index of every stored entry,
- `data`: value of every stored entry (parallel to `indices`).

### Invariants
Every [`CsrMatrix`] is **canonical**:

1. `indptr[0] == 0`, `indptr` is non-decreasing and ends at `indices.len()`,
2. `indices.len() == data.len()`,
3. all column indices are `< cols`,
4. column indices within a row are **strictly increasing** (no duplicates).

Matrices decoded from foreign encodings are validated and canonicalized once
(duplicate coordinates are summed), so all algorithms can rely on sorted rows and use binary
search for lookups. Explicitly stored zeros are kept unless removed via
[`CsrMatrix::eliminate_zeros`], which is important for matrices such as the edge-id matrix
where `0` is a valid value.
*/

mod csr;
mod ops;

pub use csr::*;
