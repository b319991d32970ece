//! # u-simnum
//!
//! Numeric utilities for array-based simulation frameworks.
//!
//! The crate provides two independent building blocks: a content hash for
//! dense and sparse matrices, usable as a memoization key, and a fast
//! approximate inverse of the regularized incomplete beta function used to
//! sample directionally-uniform vectors on an n-sphere.
//!
//! ## Modules
//!
//! - [`hash`] — Format-independent 128-bit content digest of 2-D matrices
//! - [`sparse`] — COO, CSR, CSC, BSR, DOK and LIL encodings with a shared
//!   canonical form
//! - [`element`] — Numeric element types and their byte encodings
//! - [`betainc`] — Interpolated `betaincinv(dims/2, 1/2, x)` lookup table,
//!   its on-disk format, and a lazily initialised cache
//! - [`special`] — Gamma, beta and incomplete beta functions, including the
//!   exact inverse the lookup table is built from
//! - [`error`] — Error types
//!
//! ## Design Philosophy
//!
//! - **Content, not representation**: equal matrices hash equally however
//!   they are stored
//! - **Precompute once**: the lookup table is built or loaded once per
//!   process and shared behind an `Arc`
//! - **Property-based testing**: hashing and interpolation invariants
//!   verified via proptest

pub mod betainc;
pub mod element;
pub mod error;
pub mod hash;
pub mod sparse;
pub mod special;

pub use error::{Error, FormatError, MatrixError, Result};
pub use hash::{array_hash, ArrayDigest};
