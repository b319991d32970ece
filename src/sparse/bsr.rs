//! Block sparse row encoding.

use super::{CooMatrix, SparseStorage};
use crate::element::Element;
use crate::error::MatrixError;

/// Block compressed sparse row (BSR) matrix.
///
/// The matrix is tiled into `block_shape` blocks. Only blocks holding at
/// least one stored entry are kept, but each kept block is stored densely,
/// so zero padding inside blocks counts towards [`SparseStorage::nnz`].
#[derive(Debug, Clone, PartialEq)]
pub struct BsrMatrix<T> {
    shape: (usize, usize),
    block_shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    /// Blocks back to back, each `block_shape.0 * block_shape.1` values in
    /// row-major order.
    data: Vec<T>,
}

impl<T: Element> BsrMatrix<T> {
    /// Converts from COO, summing duplicates.
    ///
    /// # Errors
    /// Returns `Err` if either block dimension is zero or does not divide
    /// the matching matrix dimension.
    ///
    /// # Examples
    /// ```
    /// use u_simnum::sparse::{BsrMatrix, CooMatrix, SparseStorage};
    /// let coo = CooMatrix::new((4, 4), vec![0, 3], vec![0, 3], vec![1.0, 2.0]).unwrap();
    /// let bsr = BsrMatrix::from_coo(&coo, (2, 2)).unwrap();
    /// // two 2x2 blocks, each padded with three zeros
    /// assert_eq!(bsr.nnz(), 8);
    /// assert_eq!(bsr.to_canonical(), coo.to_canonical());
    /// ```
    pub fn from_coo(coo: &CooMatrix<T>, block_shape: (usize, usize)) -> Result<Self, MatrixError> {
        let shape = coo.shape();
        let (br, bc) = block_shape;
        if br == 0 || bc == 0 || shape.0 % br != 0 || shape.1 % bc != 0 {
            return Err(MatrixError::BlockShape {
                rows: shape.0,
                cols: shape.1,
                block_rows: br,
                block_cols: bc,
            });
        }

        let block_len = br * bc;
        let n_block_rows = shape.0 / br;

        let mut entries = coo.sorted_entries();
        entries.sort_by_key(|&(r, c, _)| (r / br, c / bc, r, c));

        let mut indptr = vec![0; n_block_rows + 1];
        let mut indices: Vec<usize> = Vec::new();
        let mut data: Vec<T> = Vec::new();
        let mut current: Option<(usize, usize)> = None;
        for (r, c, v) in entries {
            let block = (r / br, c / bc);
            if current != Some(block) {
                current = Some(block);
                indptr[block.0 + 1] += 1;
                indices.push(block.1);
                data.extend(std::iter::repeat(T::ZERO).take(block_len));
            }
            let base = data.len() - block_len;
            data[base + (r % br) * bc + c % bc] = v;
        }
        for i in 0..n_block_rows {
            indptr[i + 1] += indptr[i];
        }

        Ok(Self {
            shape,
            block_shape,
            indptr,
            indices,
            data,
        })
    }

    pub fn block_shape(&self) -> (usize, usize) {
        self.block_shape
    }

    /// Number of stored blocks.
    pub fn n_blocks(&self) -> usize {
        self.indices.len()
    }
}

impl<T: Element> SparseStorage<T> for BsrMatrix<T> {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn nnz(&self) -> usize {
        self.data.len()
    }

    fn for_each_stored<F: FnMut(usize, usize, T)>(&self, mut f: F) {
        let (br, bc) = self.block_shape;
        let block_len = br * bc;
        for block_row in 0..self.indptr.len() - 1 {
            for k in self.indptr[block_row]..self.indptr[block_row + 1] {
                let block_col = self.indices[k];
                let block = &self.data[k * block_len..(k + 1) * block_len];
                for (i, &v) in block.iter().enumerate() {
                    f(block_row * br + i / bc, block_col * bc + i % bc, v);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_layout() {
        // 4x4 with entries in blocks (0,0), (0,1) and (1,1)
        let coo = CooMatrix::from_triplets(
            (4, 4),
            [(3, 3, 4.0), (0, 0, 1.0), (1, 2, 2.0), (1, 1, 3.0)],
        )
        .unwrap();
        let bsr = BsrMatrix::from_coo(&coo, (2, 2)).unwrap();
        assert_eq!(bsr.n_blocks(), 3);
        assert_eq!(bsr.indptr, vec![0, 2, 3]);
        assert_eq!(bsr.indices, vec![0, 1, 1]);
        assert_eq!(
            bsr.data,
            vec![
                1.0, 0.0, 0.0, 3.0, // block (0,0)
                0.0, 0.0, 2.0, 0.0, // block (0,1)
                0.0, 0.0, 0.0, 4.0, // block (1,1)
            ]
        );
        assert_eq!(bsr.to_dense(), coo.to_dense());
    }

    #[test]
    fn test_rejects_indivisible_blocks() {
        let coo: CooMatrix<f64> = CooMatrix::from_triplets((5, 4), []).unwrap();
        assert!(matches!(
            BsrMatrix::from_coo(&coo, (2, 2)),
            Err(MatrixError::BlockShape { rows: 5, .. })
        ));
        assert!(BsrMatrix::from_coo(&coo, (0, 1)).is_err());
        assert!(BsrMatrix::from_coo(&coo, (5, 1)).is_ok());
    }

    #[test]
    fn test_single_block_covers_matrix() {
        let coo = CooMatrix::from_triplets((2, 3), [(1, 2, 7_i64)]).unwrap();
        let bsr = BsrMatrix::from_coo(&coo, (2, 3)).unwrap();
        assert_eq!(bsr.nnz(), 6);
        assert_eq!(bsr.to_canonical().entries(), &[(1, 2, 7)]);
    }
}
