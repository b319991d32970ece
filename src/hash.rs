//! Format-independent content hashing of 2-D matrices.
//!
//! [`array_hash`] produces a 128-bit digest usable as a memoization key
//! ("has this weight matrix already been processed?"). The digest depends
//! only on the logical content of the matrix:
//!
//! - **dense** input is hashed in logical row-major order, so C-ordered,
//!   Fortran-ordered, and strided views of the same values agree;
//! - **sparse** input is first reduced to [`CanonicalCoo`] (sorted by
//!   `(row, col)`, duplicates summed, explicit zeros dropped), so every
//!   encoding of the same matrix agrees.
//!
//! Dense and sparse inputs are tagged separately and never collide with
//! each other, even for equal values.
//!
//! # Algorithm
//! The canonical byte stream `tag ‖ dtype ‖ shape ‖ payload` is fed through
//! XXH3-128, which is deterministic across processes and platforms.

use std::fmt;

use ndarray::{ArrayBase, ArrayView2, Data, Ix2};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::element::Element;
use crate::sparse::{
    BsrMatrix, CanonicalCoo, CooMatrix, CscMatrix, CsrMatrix, DokMatrix, LilMatrix,
    SparseStorage,
};

const DENSE_TAG: u8 = 0x01;
const SPARSE_TAG: u8 = 0x02;

/// Bytes buffered before each hasher update.
const CHUNK: usize = 64 * 1024;

/// 128-bit content digest of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArrayDigest(u128);

impl ArrayDigest {
    pub fn as_u128(self) -> u128 {
        self.0
    }

    /// 32 lowercase hex digits.
    pub fn to_hex(self) -> String {
        format!("{:032x}", self.0)
    }
}

impl fmt::Display for ArrayDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl From<ArrayDigest> for u128 {
    fn from(digest: ArrayDigest) -> Self {
        digest.0
    }
}

/// The closed set of hash inputs, after conversion at the boundary.
#[derive(Debug, Clone)]
pub enum Matrix<'a, T> {
    Dense(ArrayView2<'a, T>),
    Sparse(CanonicalCoo<T>),
}

impl<T: Element> Matrix<'_, T> {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Matrix::Dense(view) => view.dim(),
            Matrix::Sparse(coo) => coo.shape(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, Matrix::Sparse(_))
    }

    /// Hashes the canonical byte stream of this matrix.
    pub fn digest(&self) -> ArrayDigest {
        let mut writer = DigestWriter::new();
        let (rows, cols) = self.shape();
        match self {
            Matrix::Dense(view) => {
                writer.push_header(DENSE_TAG, T::DTYPE, rows, cols);
                for &v in view.iter() {
                    v.write_le_bytes(&mut writer.buf);
                    writer.maybe_flush();
                }
            }
            Matrix::Sparse(coo) => {
                writer.push_header(SPARSE_TAG, T::DTYPE, rows, cols);
                writer.push_u64(coo.nnz() as u64);
                for &(r, c, v) in coo.entries() {
                    writer.push_u64(r as u64);
                    writer.push_u64(c as u64);
                    v.write_le_bytes(&mut writer.buf);
                    writer.maybe_flush();
                }
            }
        }
        writer.finish()
    }
}

/// Anything the array hasher accepts.
///
/// Implemented for dense `ndarray` matrices (owned, views, any layout) and
/// for every sparse encoding in [`crate::sparse`].
pub trait AsMatrix {
    type Elem: Element;

    fn as_matrix(&self) -> Matrix<'_, Self::Elem>;
}

impl<S, T> AsMatrix for ArrayBase<S, Ix2>
where
    S: Data<Elem = T>,
    T: Element,
{
    type Elem = T;

    fn as_matrix(&self) -> Matrix<'_, T> {
        Matrix::Dense(self.view())
    }
}

macro_rules! impl_as_matrix_sparse {
    ($($ty:ident),* $(,)?) => {$(
        impl<T: Element> AsMatrix for $ty<T> {
            type Elem = T;

            fn as_matrix(&self) -> Matrix<'_, T> {
                Matrix::Sparse(self.to_canonical())
            }
        }
    )*};
}

impl_as_matrix_sparse!(
    CooMatrix,
    CsrMatrix,
    CscMatrix,
    BsrMatrix,
    DokMatrix,
    LilMatrix,
    CanonicalCoo,
);

/// Computes the content digest of a dense or sparse matrix.
///
/// Pure and infallible. Equal logical content gives equal digests across
/// calls and processes; any difference in a stored value, the shape, the
/// dtype, or the sparsity pattern gives a different digest with
/// overwhelming probability.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use u_simnum::hash::array_hash;
/// use u_simnum::sparse::{CooMatrix, SparseStorage};
///
/// let coo = CooMatrix::new((2, 2), vec![1, 0], vec![0, 1], vec![2.0, 1.0]).unwrap();
/// assert_eq!(array_hash(&coo), array_hash(&coo.to_csc()));
///
/// let dense = array![[0.0, 1.0], [2.0, 0.0]];
/// assert_eq!(array_hash(&dense), array_hash(&dense.t().to_owned().reversed_axes()));
/// assert_ne!(array_hash(&dense), array_hash(&coo));
/// ```
pub fn array_hash<M: AsMatrix + ?Sized>(matrix: &M) -> ArrayDigest {
    matrix.as_matrix().digest()
}

/// Buffers canonical bytes and feeds them to XXH3-128 in chunks.
struct DigestWriter {
    hasher: Xxh3,
    buf: Vec<u8>,
}

impl DigestWriter {
    fn new() -> Self {
        Self {
            hasher: Xxh3::new(),
            buf: Vec::with_capacity(CHUNK + 64),
        }
    }

    fn push_header(&mut self, tag: u8, dtype: &str, rows: usize, cols: usize) {
        self.buf.push(tag);
        self.buf.push(dtype.len() as u8);
        self.buf.extend_from_slice(dtype.as_bytes());
        self.push_u64(rows as u64);
        self.push_u64(cols as u64);
    }

    fn push_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn maybe_flush(&mut self) {
        if self.buf.len() >= CHUNK {
            self.hasher.update(&self.buf);
            self.buf.clear();
        }
    }

    fn finish(mut self) -> ArrayDigest {
        self.hasher.update(&self.buf);
        ArrayDigest(self.hasher.digest128())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, ShapeBuilder};
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    type Idxs = (Vec<usize>, Vec<usize>);

    /// All six encodings of the same logical matrix.
    fn encodings(coo: &CooMatrix<f64>) -> Vec<Box<dyn Fn() -> ArrayDigest + '_>> {
        vec![
            Box::new(move || array_hash(&coo.to_csr())),
            Box::new(move || array_hash(&coo.to_csc())),
            Box::new(move || array_hash(coo)),
            Box::new(move || array_hash(&coo.to_bsr((1, 1)).unwrap())),
            Box::new(move || array_hash(&coo.to_dok())),
            Box::new(move || array_hash(&coo.to_lil())),
        ]
    }

    /// Four matrices from two index sets x two value sets.
    fn family(shape: (usize, usize), idxs: [Idxs; 2], data: [Vec<f64>; 2]) -> Vec<CooMatrix<f64>> {
        let mut out = Vec::new();
        for (rows, cols) in &idxs {
            for values in &data {
                let m = CooMatrix::new(shape, rows.clone(), cols.clone(), values.clone());
                out.push(m.unwrap());
            }
        }
        out
    }

    fn random_family(seed: u64, shape: (usize, usize), nnz: usize) -> Vec<CooMatrix<f64>> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut idxs = || {
            let mut flat: Vec<usize> = (0..shape.0 * shape.1).collect();
            flat.shuffle(&mut rng);
            flat.truncate(nnz);
            let rows: Vec<usize> = flat.iter().map(|i| i / shape.1).collect();
            let cols: Vec<usize> = flat.iter().map(|i| i % shape.1).collect();
            (rows, cols)
        };
        let idxs = [idxs(), idxs()];
        let mut rng = SmallRng::seed_from_u64(seed + 1);
        let mut values = || (0..nnz).map(|_| rng.random_range(-1.0..1.0)).collect::<Vec<f64>>();
        let data = [values(), values()];
        family(shape, idxs, data)
    }

    fn small_family() -> Vec<CooMatrix<f64>> {
        family(
            (5, 5),
            [
                (vec![0, 0, 1, 2, 3, 3, 4], vec![0, 2, 3, 4, 2, 4, 0]),
                (vec![0, 1, 1, 2, 3, 3, 4], vec![1, 2, 3, 4, 2, 4, 0]),
            ],
            [
                vec![1.0, 2.0, 1.5, 2.3, 1.2, 2.5, 1.8],
                vec![1.0, 1.0, 1.5, 2.3, 1.2, 2.5, 1.8],
            ],
        )
    }

    fn assert_sparse_family_behaviour(matrices: &[CooMatrix<f64>]) {
        let per_matrix: Vec<Vec<ArrayDigest>> = matrices
            .iter()
            .map(|m| encodings(m).iter().map(|h| h()).collect())
            .collect();

        for (m, hashes) in matrices.iter().zip(&per_matrix) {
            // reproducible
            for (h, encode) in hashes.iter().zip(encodings(m)) {
                assert_eq!(*h, encode());
            }
            // encoding-invariant
            assert!(hashes.iter().all(|h| *h == hashes[0]), "{hashes:?}");
        }

        // discriminating within each encoding
        for kind in 0..6 {
            let unique: HashSet<_> = per_matrix.iter().map(|h| h[kind]).collect();
            assert_eq!(unique.len(), matrices.len(), "encoding {kind}");
        }
    }

    #[test]
    fn test_sparse_hash_small() {
        assert_sparse_family_behaviour(&small_family());
    }

    #[test]
    fn test_sparse_hash_random() {
        assert_sparse_family_behaviour(&random_family(7, (100, 100), 300));
    }

    #[test]
    fn test_digest_formatting() {
        let m = array![[1.0_f64, 2.0], [3.0, 4.0]];
        let first = array_hash(&m);
        assert_eq!(first, array_hash(&m.clone()));
        assert_eq!(first.to_hex().len(), 32);
        assert_eq!(first.to_string(), first.to_hex());
        assert_eq!(u128::from(first), first.as_u128());
    }

    #[test]
    fn test_dense_layout_invariance() {
        let c_order = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let f_order =
            Array2::from_shape_vec((2, 3).f(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]).unwrap();
        assert_eq!(c_order, f_order);
        assert_eq!(array_hash(&c_order), array_hash(&f_order));
        assert_eq!(array_hash(&c_order), array_hash(&c_order.view()));

        let wide = Array2::from_shape_fn((2, 6), |(r, c)| (r * 3 + c / 2 + 1) as f64);
        let strided = wide.slice(ndarray::s![.., ..;2]);
        assert_eq!(strided, c_order);
        assert_eq!(array_hash(&strided), array_hash(&c_order));
    }

    #[test]
    fn test_dense_discriminates_shape_dtype_and_values() {
        let base = Array2::from_shape_vec((2, 3), vec![1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let reshaped = base.clone().into_shape_with_order((3, 2)).unwrap();
        let as_f32 = base.mapv(|v| v as f32);
        let mut changed = base.clone();
        changed[[1, 2]] += 1e-12;

        let digests: HashSet<_> = [
            array_hash(&base),
            array_hash(&reshaped),
            array_hash(&as_f32),
            array_hash(&changed),
            array_hash(&base.mapv(|v| v as i64)),
            array_hash(&base.t()),
        ]
        .into_iter()
        .collect();
        assert_eq!(digests.len(), 6);
    }

    #[test]
    fn test_discriminates_dozens_of_matrices() {
        let base = CooMatrix::from_triplets((6, 6), (0..6).map(|i| (i, (i * 5) % 6, 1.0)))
            .unwrap();
        let mut matrices = vec![base.clone()];
        // one extra stored value per position
        for r in 0..6 {
            for c in 0..6 {
                let mut entries: Vec<_> = base.to_canonical().entries().to_vec();
                entries.push((r, c, 0.25));
                matrices.push(CooMatrix::from_triplets((6, 6), entries).unwrap());
            }
        }
        // same pattern, larger shapes
        for extra in 1..=6 {
            let entries = base.to_canonical().entries().to_vec();
            matrices.push(CooMatrix::from_triplets((6 + extra, 6), entries).unwrap());
        }
        let unique: HashSet<_> = matrices.iter().map(|m| array_hash(&m.to_csr())).collect();
        assert_eq!(unique.len(), matrices.len());
        assert!(matrices.len() >= 40);
    }

    #[test]
    fn test_sparse_discriminates_shape_and_pattern() {
        let a = CooMatrix::from_triplets((3, 3), [(0, 0, 1.0), (2, 2, 1.0)]).unwrap();
        let wider = CooMatrix::from_triplets((3, 4), [(0, 0, 1.0), (2, 2, 1.0)]).unwrap();
        let moved = CooMatrix::from_triplets((3, 3), [(0, 0, 1.0), (2, 1, 1.0)]).unwrap();
        let transposed_shape =
            CooMatrix::from_triplets((4, 3), [(0, 0, 1.0), (2, 2, 1.0)]).unwrap();
        let digests: HashSet<_> = [&a, &wider, &moved, &transposed_shape]
            .into_iter()
            .map(array_hash)
            .collect();
        assert_eq!(digests.len(), 4);
    }

    #[test]
    fn test_sparse_ignores_storage_accidents() {
        let clean = CooMatrix::from_triplets((3, 3), [(0, 1, 2.0), (2, 0, -1.0)]).unwrap();
        let noisy = CooMatrix::from_triplets(
            (3, 3),
            [(2, 0, -0.5), (1, 1, 0.0), (0, 1, 2.0), (2, 0, -0.5), (2, 2, -0.0)],
        )
        .unwrap();
        assert_eq!(array_hash(&clean), array_hash(&noisy));
        // BSR pads each block with zeros
        assert_eq!(array_hash(&clean), array_hash(&noisy.to_bsr((3, 3)).unwrap()));
    }

    #[test]
    fn test_float_duplicates_ignore_storage_order() {
        let forward = CooMatrix::from_triplets((2, 2), [(0, 0, 0.1), (0, 0, 0.2), (0, 0, 0.3)]);
        let reversed = CooMatrix::from_triplets((2, 2), [(0, 0, 0.3), (0, 0, 0.2), (0, 0, 0.1)]);
        let (forward, reversed) = (forward.unwrap(), reversed.unwrap());
        assert_eq!(array_hash(&forward), array_hash(&reversed));
        assert_eq!(array_hash(&forward.to_csr()), array_hash(&reversed.to_csr()));
        assert_eq!(array_hash(&forward.to_dok()), array_hash(&reversed));
    }

    #[test]
    fn test_dense_and_sparse_domains_are_separate() {
        let coo = CooMatrix::from_triplets(
            (2, 2),
            [(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 1.0)],
        )
        .unwrap();
        let dense = coo.to_dense();
        assert_ne!(array_hash(&dense), array_hash(&coo));
    }

    #[test]
    fn test_empty_matrices() {
        let empty_sparse: CooMatrix<f64> = CooMatrix::from_triplets((4, 4), []).unwrap();
        let other_shape: CooMatrix<f64> = CooMatrix::from_triplets((4, 5), []).unwrap();
        assert_ne!(array_hash(&empty_sparse), array_hash(&other_shape));

        let empty_dense = Array2::<f64>::zeros((0, 3));
        assert_eq!(array_hash(&empty_dense), array_hash(&Array2::<f64>::zeros((0, 3))));
        assert_ne!(array_hash(&empty_dense), array_hash(&Array2::<f64>::zeros((3, 0))));
    }

    #[test]
    fn test_large_dense_spans_chunks() {
        let big = Array2::from_shape_fn((300, 300), |(r, c)| (r * 300 + c) as f64);
        let mut tweaked = big.clone();
        tweaked[[299, 299]] += 1.0;
        assert_eq!(array_hash(&big), array_hash(&big.clone()));
        assert_ne!(array_hash(&big), array_hash(&tweaked));
    }

    #[test]
    fn test_matrix_variant_accessors() {
        let dense = array![[1_u8, 2, 3]];
        let m = dense.as_matrix();
        assert!(!m.is_sparse());
        assert_eq!(m.shape(), (1, 3));

        let coo = CooMatrix::from_triplets((4, 2), [(3, 1, 9_u8)]).unwrap();
        let m = coo.as_matrix();
        assert!(m.is_sparse());
        assert_eq!(m.shape(), (4, 2));
        assert_eq!(m.digest(), array_hash(&coo));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn triplets() -> impl Strategy<Value = Vec<(usize, usize, i32)>> {
        prop::collection::vec((0_usize..8, 0_usize..8, -5_i32..5), 0..40)
    }

    /// Float triplets on a 3x3 grid, so most draws repeat coordinates.
    fn float_triplets() -> impl Strategy<Value = Vec<(usize, usize, f64)>> {
        prop::collection::vec((0_usize..3, 0_usize..3, -1e3_f64..1e3), 0..40)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn encoding_invariant(entries in triplets()) {
            let coo = CooMatrix::from_triplets((8, 8), entries).unwrap();
            let h = array_hash(&coo);
            prop_assert_eq!(h, array_hash(&coo.to_csr()));
            prop_assert_eq!(h, array_hash(&coo.to_csc()));
            prop_assert_eq!(h, array_hash(&coo.to_bsr((4, 2)).unwrap()));
            prop_assert_eq!(h, array_hash(&coo.to_dok()));
            prop_assert_eq!(h, array_hash(&coo.to_lil()));
        }

        #[test]
        fn storage_order_invariant(entries in triplets(), seed in any::<u64>()) {
            use rand::seq::SliceRandom;
            use rand::SeedableRng;
            let mut shuffled = entries.clone();
            shuffled.shuffle(&mut rand::rngs::SmallRng::seed_from_u64(seed));
            let a = CooMatrix::from_triplets((8, 8), entries).unwrap();
            let b = CooMatrix::from_triplets((8, 8), shuffled).unwrap();
            prop_assert_eq!(array_hash(&a), array_hash(&b));
        }

        #[test]
        fn float_storage_order_invariant(entries in float_triplets(), seed in any::<u64>()) {
            use rand::seq::SliceRandom;
            use rand::SeedableRng;
            let mut shuffled = entries.clone();
            shuffled.shuffle(&mut rand::rngs::SmallRng::seed_from_u64(seed));
            let a = CooMatrix::from_triplets((3, 3), entries).unwrap();
            let b = CooMatrix::from_triplets((3, 3), shuffled).unwrap();
            prop_assert_eq!(array_hash(&a), array_hash(&b));
            prop_assert_eq!(array_hash(&a.to_csr()), array_hash(&b.to_csc()));
        }

        #[test]
        fn sparse_hash_tracks_dense_content(a in triplets(), b in triplets()) {
            let a = CooMatrix::from_triplets((8, 8), a).unwrap();
            let b = CooMatrix::from_triplets((8, 8), b).unwrap();
            let same_content = a.to_dense() == b.to_dense();
            prop_assert_eq!(same_content, array_hash(&a) == array_hash(&b));
        }
    }
}
