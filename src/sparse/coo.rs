//! Coordinate-list encoding and the canonical sparse form.

use super::{check_bounds, sort_and_merge, SparseStorage};
use crate::element::Element;
use crate::error::MatrixError;

/// Coordinate-list (COO) sparse matrix.
///
/// Entries may appear in any order and the same coordinate may appear more
/// than once; duplicates are summed whenever the matrix is converted.
#[derive(Debug, Clone, PartialEq)]
pub struct CooMatrix<T> {
    shape: (usize, usize),
    rows: Vec<usize>,
    cols: Vec<usize>,
    data: Vec<T>,
}

impl<T: Element> CooMatrix<T> {
    /// Creates a COO matrix from parallel coordinate and value arrays.
    ///
    /// # Errors
    /// Returns `Err` if the three arrays differ in length or any coordinate
    /// lies outside `shape`.
    ///
    /// # Examples
    /// ```
    /// use u_simnum::sparse::{CooMatrix, SparseStorage};
    /// let m = CooMatrix::new((2, 2), vec![0, 1], vec![1, 0], vec![3.0, 4.0]).unwrap();
    /// assert_eq!(m.nnz(), 2);
    /// assert_eq!(m.to_dense()[[1, 0]], 4.0);
    /// ```
    pub fn new(
        shape: (usize, usize),
        rows: Vec<usize>,
        cols: Vec<usize>,
        data: Vec<T>,
    ) -> Result<Self, MatrixError> {
        if cols.len() != rows.len() {
            return Err(MatrixError::LengthMismatch {
                what: "cols",
                expected: rows.len(),
                actual: cols.len(),
            });
        }
        if data.len() != rows.len() {
            return Err(MatrixError::LengthMismatch {
                what: "data",
                expected: rows.len(),
                actual: data.len(),
            });
        }
        for (&r, &c) in rows.iter().zip(&cols) {
            check_bounds(shape, r, c)?;
        }
        Ok(Self {
            shape,
            rows,
            cols,
            data,
        })
    }

    /// Creates a COO matrix from `(row, col, value)` triples.
    ///
    /// # Errors
    /// Returns `Err` if any coordinate lies outside `shape`.
    pub fn from_triplets<I>(shape: (usize, usize), triplets: I) -> Result<Self, MatrixError>
    where
        I: IntoIterator<Item = (usize, usize, T)>,
    {
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut data = Vec::new();
        for (r, c, v) in triplets {
            check_bounds(shape, r, c)?;
            rows.push(r);
            cols.push(c);
            data.push(v);
        }
        Ok(Self {
            shape,
            rows,
            cols,
            data,
        })
    }

    /// Caller guarantees equal lengths and in-bounds coordinates.
    pub(crate) fn from_parts_unchecked(
        shape: (usize, usize),
        rows: Vec<usize>,
        cols: Vec<usize>,
        data: Vec<T>,
    ) -> Self {
        debug_assert!(rows.len() == cols.len() && cols.len() == data.len());
        Self {
            shape,
            rows,
            cols,
            data,
        }
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Entries sorted by `(row, col)` with duplicates summed. Explicit zeros
    /// are kept; use [`SparseStorage::to_canonical`] to drop them.
    pub(crate) fn sorted_entries(&self) -> Vec<(usize, usize, T)> {
        let entries = self
            .rows
            .iter()
            .zip(&self.cols)
            .zip(&self.data)
            .map(|((&r, &c), &v)| (r, c, v))
            .collect();
        sort_and_merge(entries)
    }
}

impl<T: Element> SparseStorage<T> for CooMatrix<T> {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn nnz(&self) -> usize {
        self.data.len()
    }

    fn for_each_stored<F: FnMut(usize, usize, T)>(&self, mut f: F) {
        for ((&r, &c), &v) in self.rows.iter().zip(&self.cols).zip(&self.data) {
            f(r, c, v);
        }
    }

    fn to_coo(&self) -> CooMatrix<T> {
        self.clone()
    }
}

/// Canonical sparse form: entries strictly increasing in `(row, col)`, no
/// duplicates, no zero values.
///
/// This is the single sparse representation the array hasher sees. It can
/// only be obtained through [`SparseStorage::to_canonical`], so the ordering
/// invariant always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalCoo<T> {
    shape: (usize, usize),
    entries: Vec<(usize, usize, T)>,
}

impl<T: Element> CanonicalCoo<T> {
    pub(crate) fn from_entries(shape: (usize, usize), entries: Vec<(usize, usize, T)>) -> Self {
        let mut entries = sort_and_merge(entries);
        entries.retain(|&(_, _, v)| !v.is_zero());
        Self { shape, entries }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of nonzero entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// `(row, col, value)` triples in row-major order.
    pub fn entries(&self) -> &[(usize, usize, T)] {
        &self.entries
    }
}

impl<T: Element> SparseStorage<T> for CanonicalCoo<T> {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn nnz(&self) -> usize {
        self.entries.len()
    }

    fn for_each_stored<F: FnMut(usize, usize, T)>(&self, mut f: F) {
        for &(r, c, v) in &self.entries {
            f(r, c, v);
        }
    }

    fn to_canonical(&self) -> CanonicalCoo<T> {
        self.clone()
    }
}
