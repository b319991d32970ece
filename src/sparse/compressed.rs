//! Compressed row (CSR) and compressed column (CSC) encodings.

use super::{check_bounds, CooMatrix, SparseStorage};
use crate::element::Element;
use crate::error::MatrixError;

/// Pointer/index/data triple shared by CSR and CSC. `major` is the row axis
/// for CSR and the column axis for CSC.
#[derive(Debug, Clone, PartialEq)]
struct Compressed<T> {
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<T>,
}

impl<T: Element> Compressed<T> {
    /// Validates raw parts against `(major_len, minor_len)`.
    fn new(
        major_len: usize,
        minor_len: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<T>,
    ) -> Result<Self, MatrixError> {
        if indptr.len() != major_len + 1 {
            return Err(MatrixError::LengthMismatch {
                what: "indptr",
                expected: major_len + 1,
                actual: indptr.len(),
            });
        }
        if data.len() != indices.len() {
            return Err(MatrixError::LengthMismatch {
                what: "data",
                expected: indices.len(),
                actual: data.len(),
            });
        }
        let monotone = indptr.windows(2).all(|w| w[0] <= w[1]);
        if indptr[0] != 0 || !monotone || indptr[major_len] != indices.len() {
            return Err(MatrixError::InvalidIndptr {
                expected: indices.len(),
            });
        }
        for major in 0..major_len {
            for &minor in &indices[indptr[major]..indptr[major + 1]] {
                check_bounds((major_len, minor_len), major, minor)?;
            }
        }
        Ok(Self {
            indptr,
            indices,
            data,
        })
    }

    /// Builds from `(major, minor, value)` entries already sorted by
    /// `(major, minor)`.
    fn from_sorted(major_len: usize, entries: &[(usize, usize, T)]) -> Self {
        let mut indptr = vec![0; major_len + 1];
        let mut indices = Vec::with_capacity(entries.len());
        let mut data = Vec::with_capacity(entries.len());
        for &(major, minor, v) in entries {
            indptr[major + 1] += 1;
            indices.push(minor);
            data.push(v);
        }
        for i in 0..major_len {
            indptr[i + 1] += indptr[i];
        }
        Self {
            indptr,
            indices,
            data,
        }
    }

    fn for_each<F: FnMut(usize, usize, T)>(&self, mut f: F) {
        for major in 0..self.indptr.len() - 1 {
            let span = self.indptr[major]..self.indptr[major + 1];
            for (&minor, &v) in self.indices[span.clone()].iter().zip(&self.data[span]) {
                f(major, minor, v);
            }
        }
    }
}

/// Compressed sparse row matrix.
///
/// Column indices within a row need not be sorted, and explicit zeros may
/// be stored; neither affects the canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    shape: (usize, usize),
    inner: Compressed<T>,
}

impl<T: Element> CsrMatrix<T> {
    /// Creates a CSR matrix from raw parts.
    ///
    /// # Errors
    /// Returns `Err` if `indptr` does not have `rows + 1` non-decreasing
    /// entries ending at `indices.len()`, if `data` and `indices` differ in
    /// length, or if a column index is out of bounds.
    ///
    /// # Examples
    /// ```
    /// use u_simnum::sparse::{CsrMatrix, SparseStorage};
    /// // [[1, 0], [0, 2]]
    /// let m = CsrMatrix::new((2, 2), vec![0, 1, 2], vec![0, 1], vec![1.0, 2.0]).unwrap();
    /// assert_eq!(m.to_dense()[[1, 1]], 2.0);
    /// ```
    pub fn new(
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<T>,
    ) -> Result<Self, MatrixError> {
        let inner = Compressed::new(shape.0, shape.1, indptr, indices, data)?;
        Ok(Self { shape, inner })
    }

    /// Converts from COO; duplicates are summed and columns sorted.
    pub fn from_coo(coo: &CooMatrix<T>) -> Self {
        let shape = coo.shape();
        let entries = coo.sorted_entries();
        Self {
            shape,
            inner: Compressed::from_sorted(shape.0, &entries),
        }
    }

    pub fn indptr(&self) -> &[usize] {
        &self.inner.indptr
    }

    pub fn indices(&self) -> &[usize] {
        &self.inner.indices
    }

    pub fn data(&self) -> &[T] {
        &self.inner.data
    }
}

impl<T: Element> SparseStorage<T> for CsrMatrix<T> {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn nnz(&self) -> usize {
        self.inner.data.len()
    }

    fn for_each_stored<F: FnMut(usize, usize, T)>(&self, f: F) {
        self.inner.for_each(f);
    }
}

/// Compressed sparse column matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix<T> {
    shape: (usize, usize),
    inner: Compressed<T>,
}

impl<T: Element> CscMatrix<T> {
    /// Creates a CSC matrix from raw parts; `indptr` runs over columns.
    ///
    /// # Errors
    /// Same conditions as [`CsrMatrix::new`] with rows and columns swapped.
    pub fn new(
        shape: (usize, usize),
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<T>,
    ) -> Result<Self, MatrixError> {
        let inner =
            Compressed::new(shape.1, shape.0, indptr, indices, data).map_err(|e| match e {
                // Report coordinates as (row, col), not (col, row).
                MatrixError::IndexOutOfBounds {
                    row,
                    col,
                    rows,
                    cols,
                } => MatrixError::IndexOutOfBounds {
                    row: col,
                    col: row,
                    rows: cols,
                    cols: rows,
                },
                other => other,
            })?;
        Ok(Self { shape, inner })
    }

    /// Converts from COO; duplicates are summed and rows sorted.
    pub fn from_coo(coo: &CooMatrix<T>) -> Self {
        let shape = coo.shape();
        let mut entries: Vec<_> = coo
            .sorted_entries()
            .into_iter()
            .map(|(r, c, v)| (c, r, v))
            .collect();
        entries.sort_by_key(|&(c, r, _)| (c, r));
        Self {
            shape,
            inner: Compressed::from_sorted(shape.1, &entries),
        }
    }

    pub fn indptr(&self) -> &[usize] {
        &self.inner.indptr
    }

    pub fn indices(&self) -> &[usize] {
        &self.inner.indices
    }

    pub fn data(&self) -> &[T] {
        &self.inner.data
    }
}

impl<T: Element> SparseStorage<T> for CscMatrix<T> {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn nnz(&self) -> usize {
        self.inner.data.len()
    }

    fn for_each_stored<F: FnMut(usize, usize, T)>(&self, mut f: F) {
        self.inner.for_each(|col, row, v| f(row, col, v));
    }
}
