//! Special mathematical functions.
//!
//! Exact (to near machine precision) evaluations of the incomplete beta
//! function family. These serve as the reference implementation against
//! which the interpolated lookup in [`crate::betainc`] is built and tested.

/// Lanczos approximation of ln Γ(x).
///
/// Reference: Lanczos (1964), "A Precision Approximation of the Gamma
/// Function", *SIAM Journal on Numerical Analysis* 1(1).
///
/// # Accuracy
/// Relative error < 2 × 10⁻¹⁰ for x > 0.
///
/// # Examples
/// ```
/// use u_simnum::special::ln_gamma;
/// // Γ(5) = 24
/// assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
/// ```
pub fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS[1..].iter().enumerate() {
        sum += c / (x + i as f64 + 1.0);
    }

    let t = x + G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Log of the Beta function: `ln B(a, b) = ln Γ(a) + ln Γ(b) − ln Γ(a+b)`.
///
/// # Examples
/// ```
/// use u_simnum::special::ln_beta;
/// // B(1,1) = 1, so ln B(1,1) = 0
/// assert!(ln_beta(1.0, 1.0).abs() < 1e-10);
/// ```
pub fn ln_beta(a: f64, b: f64) -> f64 {
    ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b)
}

// ============================================================================
// Regularized Incomplete Beta Function
// ============================================================================

/// Regularized incomplete beta function I_x(a, b).
///
/// # Definition
/// ```text
/// I_x(a, b) = B(x; a, b) / B(a, b)
/// ```
/// where B(x; a, b) is the incomplete beta function.
///
/// # Algorithm
/// Uses the continued fraction representation (Lentz's method) with
/// symmetry relation for convergence optimization.
///
/// Reference: Press et al. (2007), *Numerical Recipes*, 3rd ed., §6.4.
///
/// # Accuracy
/// Relative error < 1e-10 for typical parameter ranges.
///
/// # Examples
/// ```
/// use u_simnum::special::regularized_incomplete_beta;
/// // I_0(a,b) = 0, I_1(a,b) = 1
/// assert_eq!(regularized_incomplete_beta(0.0, 2.0, 3.0), 0.0);
/// assert_eq!(regularized_incomplete_beta(1.0, 2.0, 3.0), 1.0);
/// // I_0.5(1,1) = 0.5 (uniform)
/// assert!((regularized_incomplete_beta(0.5, 1.0, 1.0) - 0.5).abs() < 1e-10);
/// ```
pub fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Use symmetry relation: I_x(a,b) = 1 - I_{1-x}(b,a)
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(1.0 - x, b, a);
    }

    let ln_prefix = a * x.ln() + b * (-x).ln_1p() - ln_beta(a, b);
    let cf = beta_cf(x, a, b);
    (ln_prefix.exp() / a) * cf
}

/// Continued fraction for the incomplete beta function (Lentz's algorithm).
fn beta_cf(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-30;

    let mut c = 1.0;
    let mut d = 1.0 / (1.0 - (a + b) * x / (a + 1.0)).max(TINY);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m_f = m as f64;
        let num_even = m_f * (b - m_f) * x / ((a + 2.0 * m_f - 1.0) * (a + 2.0 * m_f));
        d = 1.0 / (1.0 + num_even * d).max(TINY);
        c = (1.0 + num_even / c).max(TINY);
        h *= d * c;

        let num_odd =
            -(a + m_f) * (a + b + m_f) * x / ((a + 2.0 * m_f) * (a + 2.0 * m_f + 1.0));
        d = 1.0 / (1.0 + num_odd * d).max(TINY);
        c = (1.0 + num_odd / c).max(TINY);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

// ============================================================================
// Inverse Regularized Incomplete Beta Function
// ============================================================================

/// Inverse of the regularized incomplete beta function in its argument.
///
/// Given `p ∈ [0, 1]`, returns `x` such that `I_x(a, b) = p`.
///
/// # Algorithm
/// Newton's method on `f(x) = I_x(a, b) − p` using the beta density as the
/// derivative, safeguarded by a shrinking bisection bracket `[lo, hi]`.
/// Any Newton step that leaves the bracket (or a non-finite density) is
/// replaced by a bisection step, so convergence is guaranteed; typical
/// inputs need 10–30 evaluations of [`regularized_incomplete_beta`].
///
/// Reference: Press et al. (2007), *Numerical Recipes*, 3rd ed., §6.14.
///
/// # Returns
/// - `0.0` if `p <= 0`, `1.0` if `p >= 1`.
/// - `f64::NAN` if any input is NaN or `a <= 0` or `b <= 0`.
///
/// # Examples
/// ```
/// use u_simnum::special::{inverse_regularized_incomplete_beta, regularized_incomplete_beta};
/// let x = inverse_regularized_incomplete_beta(0.3, 2.5, 0.5);
/// assert!((regularized_incomplete_beta(x, 2.5, 0.5) - 0.3).abs() < 1e-12);
/// // I_x(1, b) = 1 − (1 − x)^b has a closed-form inverse
/// let x = inverse_regularized_incomplete_beta(0.75, 1.0, 0.5);
/// assert!((x - 0.9375).abs() < 1e-10);
/// ```
pub fn inverse_regularized_incomplete_beta(p: f64, a: f64, b: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 1e-15;

    if p.is_nan() || a.is_nan() || b.is_nan() || a <= 0.0 || b <= 0.0 {
        return f64::NAN;
    }
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return 1.0;
    }

    let ln_b = ln_beta(a, b);
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    // Start at the mean of Beta(a, b).
    let mut x = a / (a + b);

    for _ in 0..MAX_ITER {
        let f = regularized_incomplete_beta(x, a, b) - p;
        if f == 0.0 {
            return x;
        }
        if f < 0.0 {
            lo = x;
        } else {
            hi = x;
        }

        let density = ((a - 1.0) * x.ln() + (b - 1.0) * (-x).ln_1p() - ln_b).exp();
        let mut next = if density.is_finite() && density > 0.0 {
            x - f / density
        } else {
            f64::NAN
        };
        if !(next > lo && next < hi) {
            next = 0.5 * (lo + hi);
        }

        if (next - x).abs() <= EPS * x.max(f64::MIN_POSITIVE) || hi - lo <= EPS * hi {
            return next;
        }
        x = next;
    }
    x
}
