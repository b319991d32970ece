//! Sparse matrix storage encodings.
//!
//! Six encodings are supported, mirroring the common scientific-computing
//! formats:
//!
//! | Type | Layout | Storage accidents |
//! |---|---|---|
//! | [`CooMatrix`] | parallel `(row, col, value)` arrays | any order, duplicates |
//! | [`CsrMatrix`] | row pointers + column indices | explicit zeros |
//! | [`CscMatrix`] | column pointers + row indices | explicit zeros |
//! | [`BsrMatrix`] | dense blocks per block row | zero padding inside blocks |
//! | [`DokMatrix`] | hash map keyed by coordinate | arbitrary iteration order |
//! | [`LilMatrix`] | one sorted list per row | explicit zeros |
//!
//! Every encoding implements [`SparseStorage`], which converts it to
//! [`CanonicalCoo`]: entries sorted by `(row, col)`, duplicates summed,
//! explicit zeros dropped. Two encodings of the same logical matrix always
//! produce identical canonical forms.

mod bsr;
mod compressed;
mod coo;
mod dok;
mod lil;

pub use bsr::BsrMatrix;
pub use compressed::{CscMatrix, CsrMatrix};
pub use coo::{CanonicalCoo, CooMatrix};
pub use dok::DokMatrix;
pub use lil::LilMatrix;

use ndarray::Array2;

use crate::element::Element;
use crate::error::MatrixError;

/// Common interface over the sparse encodings.
pub trait SparseStorage<T: Element> {
    /// Logical `(rows, cols)`.
    fn shape(&self) -> (usize, usize);

    /// Number of stored entries, including explicit zeros and padding.
    fn nnz(&self) -> usize;

    /// Visits every stored entry in storage order.
    fn for_each_stored<F: FnMut(usize, usize, T)>(&self, f: F);

    /// Stored entries as an (unsorted, possibly duplicated) COO matrix.
    fn to_coo(&self) -> CooMatrix<T> {
        let mut rows = Vec::with_capacity(self.nnz());
        let mut cols = Vec::with_capacity(self.nnz());
        let mut data = Vec::with_capacity(self.nnz());
        self.for_each_stored(|r, c, v| {
            rows.push(r);
            cols.push(c);
            data.push(v);
        });
        CooMatrix::from_parts_unchecked(self.shape(), rows, cols, data)
    }

    /// Sorted, duplicate-free, zero-free form used for hashing.
    fn to_canonical(&self) -> CanonicalCoo<T> {
        let mut entries = Vec::with_capacity(self.nnz());
        self.for_each_stored(|r, c, v| entries.push((r, c, v)));
        CanonicalCoo::from_entries(self.shape(), entries)
    }

    /// Dense copy; duplicate coordinates are summed.
    fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem(self.shape(), T::ZERO);
        self.for_each_stored(|r, c, v| {
            let cell = &mut dense[[r, c]];
            *cell = cell.accumulate(v);
        });
        dense
    }

    fn to_csr(&self) -> CsrMatrix<T>
    where
        Self: Sized,
    {
        CsrMatrix::from_coo(&self.to_coo())
    }

    fn to_csc(&self) -> CscMatrix<T>
    where
        Self: Sized,
    {
        CscMatrix::from_coo(&self.to_coo())
    }

    fn to_bsr(&self, block_shape: (usize, usize)) -> Result<BsrMatrix<T>, MatrixError>
    where
        Self: Sized,
    {
        BsrMatrix::from_coo(&self.to_coo(), block_shape)
    }

    fn to_dok(&self) -> DokMatrix<T>
    where
        Self: Sized,
    {
        DokMatrix::from_coo(&self.to_coo())
    }

    fn to_lil(&self) -> LilMatrix<T>
    where
        Self: Sized,
    {
        LilMatrix::from_coo(&self.to_coo())
    }
}

/// Sorts entries by `(row, col)` and sums duplicates, keeping explicit
/// zeros.
///
/// Duplicates are summed in [`Element::canonical_cmp`] order, so the result
/// depends only on the multiset of stored entries and not on storage order
/// (float addition is not associative).
pub(crate) fn sort_and_merge<T: Element>(
    mut entries: Vec<(usize, usize, T)>,
) -> Vec<(usize, usize, T)> {
    entries.sort_by(|a, b| {
        (a.0, a.1)
            .cmp(&(b.0, b.1))
            .then_with(|| a.2.canonical_cmp(&b.2))
    });
    let mut merged: Vec<(usize, usize, T)> = Vec::with_capacity(entries.len());
    for (r, c, v) in entries {
        match merged.last_mut() {
            Some(last) if last.0 == r && last.1 == c => last.2 = last.2.accumulate(v),
            _ => merged.push((r, c, v)),
        }
    }
    merged
}

pub(crate) fn check_bounds(
    shape: (usize, usize),
    row: usize,
    col: usize,
) -> Result<(), MatrixError> {
    if row >= shape.0 || col >= shape.1 {
        return Err(MatrixError::IndexOutOfBounds {
            row,
            col,
            rows: shape.0,
            cols: shape.1,
        });
    }
    Ok(())
}
