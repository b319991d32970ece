//! Numeric element types accepted by matrices and the array hasher.

use std::cmp::Ordering;
use std::fmt::Debug;

/// A fixed-width numeric element with a stable byte encoding.
///
/// The dtype descriptor and little-endian bytes are part of the array hash,
/// so a `f32` matrix never collides with an `f64` matrix of equal values.
pub trait Element: Copy + PartialEq + Debug + Send + Sync + 'static {
    /// Descriptor mixed into the hash, e.g. `"f64"`.
    const DTYPE: &'static str;

    /// Additive identity. Stored entries equal to it are dropped when a
    /// sparse matrix is canonicalized.
    const ZERO: Self;

    /// Sum used when merging duplicate sparse coordinates. Integer types
    /// wrap instead of panicking on overflow.
    fn accumulate(self, other: Self) -> Self;

    /// Appends the little-endian byte representation to `out`.
    fn write_le_bytes(self, out: &mut Vec<u8>);

    /// Total order over values, used to fix the summation order of
    /// duplicate sparse coordinates. Floats follow IEEE 754 `totalOrder`.
    fn canonical_cmp(&self, other: &Self) -> Ordering;

    /// `true` for both `0.0` and `-0.0` on floating-point types.
    fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

macro_rules! impl_float_element {
    ($($t:ty),* $(,)?) => {$(
        impl Element for $t {
            const DTYPE: &'static str = stringify!($t);
            const ZERO: Self = 0.0;

            #[inline]
            fn accumulate(self, other: Self) -> Self {
                self + other
            }

            #[inline]
            fn write_le_bytes(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn canonical_cmp(&self, other: &Self) -> Ordering {
                <$t>::total_cmp(self, other)
            }
        }
    )*};
}

macro_rules! impl_int_element {
    ($($t:ty),* $(,)?) => {$(
        impl Element for $t {
            const DTYPE: &'static str = stringify!($t);
            const ZERO: Self = 0;

            #[inline]
            fn accumulate(self, other: Self) -> Self {
                self.wrapping_add(other)
            }

            #[inline]
            fn write_le_bytes(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn canonical_cmp(&self, other: &Self) -> Ordering {
                Ord::cmp(self, other)
            }
        }
    )*};
}

impl_float_element!(f32, f64);
impl_int_element!(i8, i16, i32, i64, u8, u16, u32, u64);
