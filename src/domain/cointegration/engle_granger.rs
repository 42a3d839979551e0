//! Engle-Granger two-step test for a pair of series.
//!
//! 1. Regress y0 on [y1, 1].
//! 2. Test the residual for a unit root and convert the statistic to a
//!    MacKinnon p-value for the two-variable, constant-only case.

use super::adf::adf_no_trend;
use super::mackinnon::{self, CriticalValues};
use crate::domain::error::StatArbError;
use crate::domain::ols;
use nalgebra::{DMatrix, DVector};

pub const MIN_PAIRWISE_OBS: usize = 20;

/// R-squared at or above 1 - COLLINEAR_TOL means the pair is (almost)
/// perfectly collinear and the unit-root step is skipped.
const COLLINEAR_TOL: f64 = 100.0 * 1.490_116_119_384_765_6e-8;

/// Relative range under which a series counts as constant.
const FLAT_TOL: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct EngleGrangerResult {
    pub statistic: f64,
    pub pvalue: f64,
    pub critical_values: CriticalValues,
    pub hedge_ratio: f64,
    pub intercept: f64,
    pub used_lag: usize,
}

pub fn engle_granger(y0: &[f64], y1: &[f64]) -> Result<EngleGrangerResult, StatArbError> {
    if y0.len() != y1.len() {
        return Err(StatArbError::Data {
            reason: format!(
                "pairwise test needs equal lengths, got {} and {}",
                y0.len(),
                y1.len()
            ),
        });
    }
    let n = y0.len();
    if n < MIN_PAIRWISE_OBS {
        return Err(StatArbError::insufficient("pairwise test", n, MIN_PAIRWISE_OBS));
    }

    // Fails the same way at any price level.
    for (leg, values) in [("y0", y0), ("y1", y1)] {
        if is_flat(values) {
            return Err(StatArbError::test_failure(format!("pairwise leg {leg} is constant")));
        }
    }

    let y = DVector::from_column_slice(y0);
    let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { y1[i] } else { 1.0 });
    let fit = ols::fit(&y, &x)?;

    let critical_values = mackinnon::critical_values(n - 1);

    if !(fit.rsquared < 1.0 - COLLINEAR_TOL) {
        return Ok(EngleGrangerResult {
            statistic: f64::NEG_INFINITY,
            pvalue: 0.0,
            critical_values,
            hedge_ratio: fit.params[0],
            intercept: fit.params[1],
            used_lag: 0,
        });
    }

    let adf = adf_no_trend(fit.residuals.as_slice())?;

    Ok(EngleGrangerResult {
        statistic: adf.statistic,
        pvalue: mackinnon::pvalue(adf.statistic),
        critical_values,
        hedge_ratio: fit.params[0],
        intercept: fit.params[1],
        used_lag: adf.used_lag,
    })
}

fn is_flat(values: &[f64]) -> bool {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    hi - lo <= FLAT_TOL * hi.abs().max(lo.abs())
}

/// Just the p-value, for the per-bar retest.
pub fn engle_granger_pvalue(y0: &[f64], y1: &[f64]) -> Result<f64, StatArbError> {
    engle_granger(y0, y1).map(|r| r.pvalue)
}
