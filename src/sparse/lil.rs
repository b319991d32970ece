//! List-of-lists encoding.

use super::{check_bounds, CooMatrix, SparseStorage};
use crate::element::Element;
use crate::error::MatrixError;

/// List-of-lists (LIL) sparse matrix: one column-sorted entry list per row.
#[derive(Debug, Clone, PartialEq)]
pub struct LilMatrix<T> {
    shape: (usize, usize),
    rows: Vec<Vec<(usize, T)>>,
}

impl<T: Element> LilMatrix<T> {
    /// Creates an empty matrix.
    pub fn new(shape: (usize, usize)) -> Self {
        Self {
            shape,
            rows: vec![Vec::new(); shape.0],
        }
    }

    /// Converts from COO, summing duplicates. Explicit zeros are kept.
    pub fn from_coo(coo: &CooMatrix<T>) -> Self {
        let mut lil = Self::new(coo.shape());
        for (r, c, v) in coo.sorted_entries() {
            lil.rows[r].push((c, v));
        }
        lil
    }

    /// Stores `value` at `(row, col)`, keeping the row sorted by column.
    ///
    /// # Errors
    /// Returns `Err` if the coordinate is out of bounds.
    ///
    /// # Examples
    /// ```
    /// use u_simnum::sparse::{LilMatrix, SparseStorage};
    /// let mut m = LilMatrix::new((2, 4));
    /// m.set(0, 3, 1.0).unwrap();
    /// m.set(0, 1, 2.0).unwrap();
    /// assert_eq!(m.row(0), &[(1, 2.0), (3, 1.0)]);
    /// assert_eq!(m.nnz(), 2);
    /// ```
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<(), MatrixError> {
        check_bounds(self.shape, row, col)?;
        let entries = &mut self.rows[row];
        match entries.binary_search_by_key(&col, |&(c, _)| c) {
            Ok(i) => entries[i].1 = value,
            Err(i) => entries.insert(i, (col, value)),
        }
        Ok(())
    }

    /// Value at `(row, col)`, zero when absent or out of bounds.
    pub fn get(&self, row: usize, col: usize) -> T {
        self.rows
            .get(row)
            .and_then(|entries| {
                entries
                    .binary_search_by_key(&col, |&(c, _)| c)
                    .ok()
                    .map(|i| entries[i].1)
            })
            .unwrap_or(T::ZERO)
    }

    /// Stored `(col, value)` entries of one row.
    ///
    /// # Panics
    /// Panics if `row` is out of bounds.
    pub fn row(&self, row: usize) -> &[(usize, T)] {
        &self.rows[row]
    }
}

impl<T: Element> SparseStorage<T> for LilMatrix<T> {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    fn for_each_stored<F: FnMut(usize, usize, T)>(&self, mut f: F) {
        for (r, entries) in self.rows.iter().enumerate() {
            for &(c, v) in entries {
                f(r, c, v);
            }
        }
    }
}
