//! The precomputed `betaincinv(dims/2, 1/2, x)` grid and its interpolation.

use std::f64::consts::PI;
use std::time::Instant;

use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension};
use tracing::info;

use super::config::TableConfig;
use super::{validate_dims, DimsArg, B};
use crate::error::{Error, FormatError, Result};
use crate::special::inverse_regularized_incomplete_beta;

// ============================================================================
// Axes
// ============================================================================

/// Sample points along the `dims` axis.
///
/// When `dims_max` fits in `n_dims` samples, every integer up to
/// `floor(dims_max)` is used, followed by `dims_max` itself if it is not
/// integral. Otherwise the integers `1..=ceil(n_dims/2)` are followed by
/// log-spaced points ending exactly at `dims_max`.
///
/// The caller is expected to have validated the parameters
/// (see [`TableConfig::validate`]).
///
/// # Examples
/// ```
/// use u_simnum::betainc::dims_axis;
///
/// assert_eq!(dims_axis(8, 4.0), vec![1.0, 2.0, 3.0, 4.0]);
/// assert_eq!(dims_axis(8, 2.5), vec![1.0, 2.0, 2.5]);
///
/// let axis = dims_axis(6, 1000.0);
/// assert_eq!(&axis[..3], &[1.0, 2.0, 3.0]);
/// assert_eq!(axis.len(), 6);
/// assert_eq!(axis[5], 1000.0);
/// ```
pub fn dims_axis(n_dims: usize, dims_max: f64) -> Vec<f64> {
    if dims_max.ceil() <= n_dims as f64 {
        let top = dims_max.floor() as usize;
        let mut axis: Vec<f64> = (1..=top).map(|d| d as f64).collect();
        if dims_max > top as f64 {
            axis.push(dims_max);
        }
        return axis;
    }

    let n_int = n_dims.div_ceil(2);
    let n_log = n_dims - n_int;
    let mut axis: Vec<f64> = (1..=n_int).map(|d| d as f64).collect();
    let lo = (n_int as f64).ln();
    let hi = dims_max.ln();
    for j in 1..=n_log {
        axis.push(if j == n_log {
            dims_max
        } else {
            (lo + (hi - lo) * j as f64 / n_log as f64).exp()
        });
    }
    axis
}

/// `n_interp` cosine-spaced points on `[0, 1]`, endpoints exact.
///
/// ```
/// use u_simnum::betainc::x_axis;
///
/// let x = x_axis(5);
/// assert_eq!(x[0], 0.0);
/// assert_eq!(x[4], 1.0);
/// assert!((x[2] - 0.5).abs() < 1e-15);
/// assert!(x[1] < 0.25); // denser near the ends
/// ```
pub fn x_axis(n_interp: usize) -> Vec<f64> {
    let last = n_interp.saturating_sub(1).max(1) as f64;
    let mut axis: Vec<f64> = (0..n_interp)
        .map(|i| 0.5 * (1.0 - (PI * i as f64 / last).cos()))
        .collect();
    if let Some(first) = axis.first_mut() {
        *first = 0.0;
    }
    if let Some(end) = axis.last_mut() {
        *end = 1.0;
    }
    axis
}

// ============================================================================
// Table
// ============================================================================

/// Precomputed grid of `I⁻¹_x(d/2, 1/2)` samples.
///
/// Immutable once built or loaded. Rows are indexed by the `dims` axis and
/// columns by the `x` axis; every row is non-decreasing, bounded by `[0, 1]`,
/// and starts at exactly 0 and ends at exactly 1.
#[derive(Debug, Clone, PartialEq)]
pub struct BetaIncInvTable {
    pub(super) dims: Vec<f64>,
    pub(super) x: Vec<f64>,
    pub(super) values: Array2<f64>,
}

/// Where a dimension falls relative to the `dims` axis.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RowSpan {
    Exact(usize),
    /// Between two rows, `s` the weight of `hi` in `1/dims`.
    Between { lo: usize, hi: usize, s: f64 },
    /// Past the last row; `scale = dims_last / dims`.
    Beyond { row: usize, scale: f64 },
}

impl BetaIncInvTable {
    /// Builds the table with the bundled reference inverse,
    /// [`inverse_regularized_incomplete_beta`].
    ///
    /// Persists to `config.persist_path` when one is set.
    ///
    /// # Errors
    /// Returns `Err` if the configuration is invalid or persisting fails.
    pub fn build(config: &TableConfig) -> Result<Self> {
        Self::build_with(config, inverse_regularized_incomplete_beta)
    }

    /// Builds the table with a caller-supplied reference
    /// `reference(p, a, b) = I⁻¹_p(a, b)`.
    ///
    /// Reference values are clamped to `[0, 1]` and made non-decreasing
    /// along each row.
    ///
    /// # Errors
    /// Returns `Err` if the configuration is invalid, the reference returns
    /// a non-finite value, or persisting fails.
    ///
    /// # Examples
    /// ```
    /// use u_simnum::betainc::{BetaIncInvTable, TableConfig};
    ///
    /// // I⁻¹_p(1/2, 1/2) = sin²(πp/2)
    /// let arcsine = |p: f64, _a: f64, _b: f64| (std::f64::consts::FRAC_PI_2 * p).sin().powi(2);
    /// let table = BetaIncInvTable::build_with(&TableConfig::new(64, 1, 1.0), arcsine).unwrap();
    /// let y = table.lookup_scalar(1, 0.5).unwrap();
    /// assert!((y - 0.5).abs() < 1e-3);
    /// ```
    pub fn build_with<F>(config: &TableConfig, reference: F) -> Result<Self>
    where
        F: Fn(f64, f64, f64) -> f64,
    {
        let table = Self::compute(config, reference)?;
        if let Some(path) = &config.persist_path {
            table.save(path)?;
        }
        Ok(table)
    }

    /// Evaluates the grid without persisting it.
    pub(super) fn compute<F>(config: &TableConfig, reference: F) -> Result<Self>
    where
        F: Fn(f64, f64, f64) -> f64,
    {
        config.validate()?;
        let started = Instant::now();

        let dims = dims_axis(config.n_dims, config.dims_max);
        let x = x_axis(config.n_interp);
        let mut values = Array2::zeros((dims.len(), x.len()));

        for (mut row, &d) in values.rows_mut().into_iter().zip(&dims) {
            let a = d / 2.0;
            let mut running = 0.0_f64;
            for (cell, &p) in row.iter_mut().zip(&x) {
                let y = if p <= 0.0 {
                    0.0
                } else if p >= 1.0 {
                    1.0
                } else {
                    let y = reference(p, a, B);
                    if !y.is_finite() {
                        return Err(Error::Reference {
                            dims: d,
                            x: p,
                            value: y,
                        });
                    }
                    y.clamp(0.0, 1.0)
                };
                running = running.max(y);
                *cell = running;
            }
        }

        info!(
            "built betaincinv table: {} dims x {} x samples up to dims={} in {:?}",
            dims.len(),
            x.len(),
            config.dims_max,
            started.elapsed()
        );
        Ok(Self { dims, x, values })
    }

    /// Assembles a table from raw axes and values, checking every structural
    /// invariant.
    ///
    /// # Errors
    /// Returns [`Error::Format`] if the axes are not strictly increasing,
    /// `dims` does not start at 1, `x` does not span exactly `[0, 1]`, the
    /// value grid has the wrong shape, or a row leaves `[0, 1]`, decreases,
    /// or does not run from 0 to 1.
    pub fn from_parts(dims: Vec<f64>, x: Vec<f64>, values: Array2<f64>) -> Result<Self> {
        check_axis("dims", &dims)?;
        if dims[0] != 1.0 {
            return Err(FormatError::InvalidAxis {
                axis: "dims",
                message: format!("must start at 1, starts at {}", dims[0]),
            }
            .into());
        }
        check_axis("x", &x)?;
        if x.len() < 2 || x[0] != 0.0 || x[x.len() - 1] != 1.0 {
            return Err(FormatError::InvalidAxis {
                axis: "x",
                message: "must have at least two points spanning exactly [0, 1]".to_string(),
            }
            .into());
        }
        if values.dim() != (dims.len(), x.len()) {
            return Err(FormatError::ShapeMismatch {
                n_dims: dims.len(),
                n_interp: x.len(),
                actual: values.len(),
            }
            .into());
        }
        for (i, row) in values.rows().into_iter().enumerate() {
            let bounded = row.iter().all(|&y| (0.0..=1.0).contains(&y));
            let monotone = row.windows(2).into_iter().all(|w| w[0] <= w[1]);
            let anchored = row[0] == 0.0 && row[row.len() - 1] == 1.0;
            if !(bounded && monotone && anchored) {
                return Err(FormatError::InvalidValues(format!(
                    "row {i} (dims={}) is not a non-decreasing path from 0 to 1",
                    dims[i]
                ))
                .into());
            }
        }
        Ok(Self { dims, x, values })
    }

    /// Sample points along the `dims` axis.
    pub fn dims(&self) -> &[f64] {
        &self.dims
    }

    /// Sample points along the `x` axis.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// The value grid, one row per `dims` sample.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Largest tabulated dimension.
    pub fn dims_max(&self) -> f64 {
        self.dims[self.dims.len() - 1]
    }

    /// Whether this table has exactly the axes `config` would build.
    pub fn matches(&self, config: &TableConfig) -> bool {
        self.x == x_axis(config.n_interp) && self.dims == dims_axis(config.n_dims, config.dims_max)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Approximates `I⁻¹_x(dims/2, 1/2)` for every element of `x`.
    ///
    /// The output has the shape of `x`. Elements `<= 0` map to 0, elements
    /// `>= 1` map to 1, and NaN stays NaN; everything else lands in `[0, 1]`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDims`] if `dims` is not an integer >= 1.
    ///
    /// # Examples
    /// ```
    /// use ndarray::array;
    /// use u_simnum::betainc::{BetaIncInvTable, TableConfig};
    ///
    /// let table = BetaIncInvTable::build(&TableConfig::new(64, 8, 64.0)).unwrap();
    /// let y = table.lookup(2, &array![[0.0, 0.25], [0.75, 1.0]]).unwrap();
    /// // I⁻¹_x(1, 1/2) = 1 - (1 - x)²
    /// assert_eq!(y[[0, 0]], 0.0);
    /// assert!((y[[0, 1]] - 0.4375).abs() < 1e-3);
    /// assert!((y[[1, 0]] - 0.9375).abs() < 1e-3);
    /// assert_eq!(y[[1, 1]], 1.0);
    /// assert!(table.lookup(2.5, &array![0.5]).is_err());
    /// ```
    pub fn lookup<D, S, Dim>(&self, dims: D, x: &ArrayBase<S, Dim>) -> Result<Array<f64, Dim>>
    where
        D: DimsArg,
        S: Data<Elem = f64>,
        Dim: Dimension,
    {
        let span = self.span(validate_dims(dims)?);
        Ok(x.mapv(|p| self.eval(span, p)))
    }

    /// [`lookup`](Self::lookup) over a slice.
    pub fn lookup_slice<D: DimsArg>(&self, dims: D, x: &[f64]) -> Result<Vec<f64>> {
        let span = self.span(validate_dims(dims)?);
        Ok(x.iter().map(|&p| self.eval(span, p)).collect())
    }

    /// [`lookup`](Self::lookup) for a single value.
    pub fn lookup_scalar<D: DimsArg>(&self, dims: D, x: f64) -> Result<f64> {
        let span = self.span(validate_dims(dims)?);
        Ok(self.eval(span, x))
    }

    fn span(&self, dims: usize) -> RowSpan {
        let d = dims as f64;
        let k = self.dims.partition_point(|&v| v < d);
        if k == self.dims.len() {
            let row = k - 1;
            return RowSpan::Beyond {
                row,
                scale: self.dims[row] / d,
            };
        }
        if k == 0 || self.dims[k] == d {
            return RowSpan::Exact(k);
        }
        let (d0, d1) = (self.dims[k - 1], self.dims[k]);
        RowSpan::Between {
            lo: k - 1,
            hi: k,
            s: (1.0 / d - 1.0 / d0) / (1.0 / d1 - 1.0 / d0),
        }
    }

    fn eval(&self, span: RowSpan, p: f64) -> f64 {
        if p.is_nan() {
            return f64::NAN;
        }
        if p <= 0.0 {
            return 0.0;
        }
        if p >= 1.0 {
            return 1.0;
        }
        let y = match span {
            RowSpan::Exact(i) => self.interpolate_row(i, p),
            RowSpan::Between { lo, hi, s } => {
                let y0 = self.interpolate_row(lo, p);
                let y1 = self.interpolate_row(hi, p);
                y0 + s * (y1 - y0)
            }
            RowSpan::Beyond { row, scale } => 1.0 - (1.0 - self.interpolate_row(row, p)) * scale,
        };
        y.clamp(0.0, 1.0)
    }

    /// Interpolates row `i` at `p ∈ (0, 1)`, linear in `w = p^(2/d)`.
    fn interpolate_row(&self, i: usize, p: f64) -> f64 {
        let x = &self.x;
        let j = x.partition_point(|&v| v <= p).clamp(1, x.len() - 1) - 1;
        let (x0, x1) = (x[j], x[j + 1]);
        let (y0, y1) = (self.values[[i, j]], self.values[[i, j + 1]]);

        let exponent = 2.0 / self.dims[i];
        let (w0, w1) = (x0.powf(exponent), x1.powf(exponent));
        let t = if w1 > w0 {
            (p.powf(exponent) - w0) / (w1 - w0)
        } else {
            (p - x0) / (x1 - x0)
        };
        y0 + t.clamp(0.0, 1.0) * (y1 - y0)
    }
}

fn check_axis(axis: &'static str, points: &[f64]) -> Result<()> {
    if points.is_empty() {
        return Err(FormatError::InvalidAxis {
            axis,
            message: "is empty".to_string(),
        }
        .into());
    }
    if points.iter().any(|v| !v.is_finite()) {
        return Err(FormatError::InvalidAxis {
            axis,
            message: "contains a non-finite point".to_string(),
        }
        .into());
    }
    if points.windows(2).any(|w| w[0] >= w[1]) {
        return Err(FormatError::InvalidAxis {
            axis,
            message: "is not strictly increasing".to_string(),
        }
        .into());
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::OnceLock;

    fn table() -> &'static BetaIncInvTable {
        static TABLE: OnceLock<BetaIncInvTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            BetaIncInvTable::build(&TableConfig::new(96, 16, 512.0)).expect("valid config")
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn lookup_in_unit_interval(dims in 1_usize..5000, p in -0.5_f64..1.5) {
            let y = table().lookup_scalar(dims, p).unwrap();
            prop_assert!((0.0..=1.0).contains(&y));
        }

        #[test]
        fn lookup_monotone_in_x(dims in 1_usize..5000, a in 0.0_f64..1.0, b in 0.0_f64..1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let y_lo = table().lookup_scalar(dims, lo).unwrap();
            let y_hi = table().lookup_scalar(dims, hi).unwrap();
            prop_assert!(y_lo <= y_hi, "dims={} x=({}, {}) -> ({}, {})", dims, lo, hi, y_lo, y_hi);
        }

        #[test]
        fn lookup_monotone_in_dims(dims in 1_usize..4000, p in 0.001_f64..0.999) {
            // I⁻¹_p(d/2, 1/2) grows with d
            let y = table().lookup_scalar(dims, p).unwrap();
            let y_next = table().lookup_scalar(dims + 1, p).unwrap();
            prop_assert!(y <= y_next + 1e-12, "dims={} x={}: {} > {}", dims, p, y, y_next);
        }
    }
}
