//! Ordinary least squares.
//!
//! `fit` solves the normal equations with nalgebra and reports the
//! statistics the unit-root tests need. `fit_line` is the closed-form
//! two-parameter fit used once per bar by the rolling hedge ratio.

use crate::domain::error::StatArbError;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use std::f64::consts::PI;

/// Below this ratio of smallest to largest eigenvalue of the column-scaled
/// normal matrix the design is treated as rank deficient.
const RANK_TOL: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct OlsFit {
    pub params: DVector<f64>,
    pub tvalues: DVector<f64>,
    pub residuals: DVector<f64>,
    pub ssr: f64,
    pub nobs: usize,
    /// Centered R-squared. Only meaningful when the design has a constant.
    pub rsquared: f64,
}

impl OlsFit {
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion for a design without a constant column.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.params.len() as f64
    }
}

pub fn fit(y: &DVector<f64>, x: &DMatrix<f64>) -> Result<OlsFit, StatArbError> {
    let nobs = x.nrows();
    let k = x.ncols();
    if nobs != y.len() {
        return Err(StatArbError::test_failure(format!(
            "design has {} rows but response has {}",
            nobs,
            y.len()
        )));
    }
    if nobs <= k {
        return Err(StatArbError::insufficient("regression", nobs, k + 1));
    }

    let xt = x.transpose();
    let xtx = &xt * x;
    ensure_full_rank(&xtx)?;
    let xtx_inv = xtx
        .try_inverse()
        .ok_or_else(|| StatArbError::test_failure("singular design matrix"))?;
    let params = &xtx_inv * (&xt * y);

    let residuals = y - x * &params;
    let ssr = residuals.dot(&residuals);
    let sigma2 = ssr / (nobs - k) as f64;

    let tvalues = DVector::from_fn(k, |i, _| params[i] / (sigma2 * xtx_inv[(i, i)]).sqrt());

    let y_mean = y.mean();
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let rsquared = if tss > 0.0 { 1.0 - ssr / tss } else { f64::NAN };

    if params.iter().any(|p| !p.is_finite()) {
        return Err(StatArbError::test_failure("non-finite regression coefficients"));
    }

    Ok(OlsFit {
        params,
        tvalues,
        residuals,
        ssr,
        nobs,
        rsquared,
    })
}

/// Rejects designs whose columns are (numerically) linearly dependent.
///
/// Scaling every column to unit length first makes the check independent of
/// the price level, so a constant regressor fails whether or not the
/// constant is exactly representable.
fn ensure_full_rank(xtx: &DMatrix<f64>) -> Result<(), StatArbError> {
    let k = xtx.nrows();
    let norms: Vec<f64> = (0..k).map(|i| xtx[(i, i)].sqrt()).collect();
    if norms.iter().any(|n| !(n.is_finite() && *n > 0.0)) {
        return Err(StatArbError::test_failure("design has a zero or non-finite column"));
    }
    let scaled = DMatrix::from_fn(k, k, |i, j| xtx[(i, j)] / (norms[i] * norms[j]));
    let eig = SymmetricEigen::new(scaled).eigenvalues;
    let (max, min) = (eig.max(), eig.min());
    if !(max > 0.0 && min > max * RANK_TOL) {
        return Err(StatArbError::test_failure("singular design matrix"));
    }
    Ok(())
}

/// Fit y = a + b*x and return (a, b).
///
/// A window where x does not vary has no unique solution; the minimum-norm
/// solution (the pseudo-inverse answer) is returned instead.
pub fn fit_line(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let (x, y) = (&x[..n], &y[..n]);
    let nf = n as f64;

    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut sum_sq = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        sxx += dx * dx;
        sxy += dx * (yi - mean_y);
        sum_sq += xi * xi;
    }

    if sxx <= f64::EPSILON * sum_sq.max(f64::MIN_POSITIVE) {
        let denom = 1.0 + mean_x * mean_x;
        return (mean_y / denom, mean_y * mean_x / denom);
    }

    let slope = sxy / sxx;
    (mean_y - slope * mean_x, slope)
}
