//! Augmented Dickey-Fuller regression without deterministic terms.
//!
//! dx[t] = g*x[t] + sum_{j=1..p} c_j*dx[t-j] + e[t], where dx[t] = x[t+1] - x[t].
//! The lag p is chosen by minimum AIC over 0..=maxlag on a common sample,
//! then the regression is refitted at p on the longest sample available.
//! The statistic is the t-value of g.

use crate::domain::error::StatArbError;
use crate::domain::ols;
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfResult {
    pub statistic: f64,
    pub used_lag: usize,
    pub nobs: usize,
}

/// Schwert's rule, capped so that every candidate regression keeps
/// enough degrees of freedom.
pub fn max_lag(nobs: usize) -> Option<usize> {
    let schwert = (12.0 * (nobs as f64 / 100.0).powf(0.25)).ceil() as usize;
    (nobs / 2).checked_sub(1).map(|cap| cap.min(schwert))
}

pub fn adf_no_trend(x: &[f64]) -> Result<AdfResult, StatArbError> {
    let n = x.len();
    let maxlag = max_lag(n).ok_or_else(|| StatArbError::insufficient("unit-root test", n, 4))?;
    if n < 4 {
        return Err(StatArbError::insufficient("unit-root test", n, 4));
    }

    let (lo, hi) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return Err(StatArbError::test_failure("non-finite input to unit-root test"));
    }
    if lo == hi {
        return Err(StatArbError::test_failure("unit-root test input is constant"));
    }

    let dx: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    let (y, design) = lagged_design(x, &dx, maxlag, maxlag);
    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=maxlag {
        let cols = design.columns(0, lag + 1).into_owned();
        let aic = ols::fit(&y, &cols)?.aic();
        match best {
            Some((best_aic, _)) if aic >= best_aic => {}
            _ => best = Some((aic, lag)),
        }
    }
    let used_lag = best.map(|(_, lag)| lag).unwrap_or(0);

    let (y, design) = lagged_design(x, &dx, used_lag, used_lag);
    let fit = ols::fit(&y, &design)?;
    let statistic = fit.tvalues[0];
    if statistic.is_nan() {
        return Err(StatArbError::test_failure("undefined unit-root statistic"));
    }

    Ok(AdfResult {
        statistic,
        used_lag,
        nobs: y.len(),
    })
}

/// Rows t = start..dx.len(): response dx[t], regressors
/// [x[t], dx[t-1], ..., dx[t-lags]].
fn lagged_design(x: &[f64], dx: &[f64], start: usize, lags: usize) -> (DVector<f64>, DMatrix<f64>) {
    let rows = dx.len() - start;
    let y = DVector::from_fn(rows, |r, _| dx[start + r]);
    let design = DMatrix::from_fn(rows, lags + 1, |r, c| {
        let t = start + r;
        if c == 0 { x[t] } else { dx[t - c] }
    });
    (y, design)
}
