//! Dictionary-of-keys encoding.

use std::collections::HashMap;

use super::{check_bounds, CooMatrix, SparseStorage};
use crate::element::Element;
use crate::error::MatrixError;

/// Dictionary-of-keys (DOK) sparse matrix.
///
/// Iteration order follows the hash map and differs between runs; the
/// canonical form sorts it away.
#[derive(Debug, Clone, PartialEq)]
pub struct DokMatrix<T> {
    shape: (usize, usize),
    entries: HashMap<(usize, usize), T>,
}

impl<T: Element> DokMatrix<T> {
    /// Creates an empty matrix.
    pub fn new(shape: (usize, usize)) -> Self {
        Self {
            shape,
            entries: HashMap::new(),
        }
    }

    /// Converts from COO, summing duplicates. Explicit zeros are kept.
    pub fn from_coo(coo: &CooMatrix<T>) -> Self {
        let entries = coo
            .sorted_entries()
            .into_iter()
            .map(|(r, c, v)| ((r, c), v))
            .collect();
        Self {
            shape: coo.shape(),
            entries,
        }
    }

    /// Stores `value` at `(row, col)`, returning the previous value.
    ///
    /// # Errors
    /// Returns `Err` if the coordinate is out of bounds.
    ///
    /// # Examples
    /// ```
    /// use u_simnum::sparse::DokMatrix;
    /// let mut m = DokMatrix::new((3, 3));
    /// assert_eq!(m.insert(1, 2, 5.0).unwrap(), None);
    /// assert_eq!(m.insert(1, 2, 6.0).unwrap(), Some(5.0));
    /// assert_eq!(m.get(1, 2), 6.0);
    /// assert_eq!(m.get(0, 0), 0.0);
    /// assert!(m.insert(3, 0, 1.0).is_err());
    /// ```
    pub fn insert(&mut self, row: usize, col: usize, value: T) -> Result<Option<T>, MatrixError> {
        check_bounds(self.shape, row, col)?;
        Ok(self.entries.insert((row, col), value))
    }

    /// Value at `(row, col)`, zero when absent or out of bounds.
    pub fn get(&self, row: usize, col: usize) -> T {
        self.entries.get(&(row, col)).copied().unwrap_or(T::ZERO)
    }

    /// Removes the entry at `(row, col)`.
    pub fn remove(&mut self, row: usize, col: usize) -> Option<T> {
        self.entries.remove(&(row, col))
    }
}

impl<T: Element> SparseStorage<T> for DokMatrix<T> {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn nnz(&self) -> usize {
        self.entries.len()
    }

    fn for_each_stored<F: FnMut(usize, usize, T)>(&self, mut f: F) {
        for (&(r, c), &v) in &self.entries {
            f(r, c, v);
        }
    }
}
