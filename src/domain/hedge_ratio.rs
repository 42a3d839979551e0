//! Rolling hedge ratio.
//!
//! For every index i >= window, fit y = a + b*x over the preceding `window`
//! observations (excluding i) and store b at i. Indices before the first
//! fit are back-filled from it.

use crate::domain::error::StatArbError;
use crate::domain::ols::fit_line;

pub fn rolling_beta(x: &[f64], y: &[f64], window: usize) -> Result<Vec<f64>, StatArbError> {
    if x.len() != y.len() {
        return Err(StatArbError::insufficient(
            "hedge ratio (y aligned with x)",
            y.len(),
            x.len(),
        ));
    }
    if window < 2 {
        return Err(StatArbError::insufficient("hedge ratio window", window, 2));
    }
    let n = x.len();
    if window >= n {
        return Err(StatArbError::insufficient("hedge ratio", n, window + 1));
    }

    let mut beta = vec![f64::NAN; n];
    for i in window..n {
        let (_, b) = fit_line(&x[i - window..i], &y[i - window..i]);
        beta[i] = b;
    }

    forward_fill(&mut beta);
    back_fill(&mut beta);
    Ok(beta)
}

fn forward_fill(values: &mut [f64]) {
    let mut last = f64::NAN;
    for v in values.iter_mut() {
        if v.is_nan() {
            *v = last;
        } else {
            last = *v;
        }
    }
}

fn back_fill(values: &mut [f64]) {
    let mut next = f64::NAN;
    for v in values.iter_mut().rev() {
        if v.is_nan() {
            *v = next;
        } else {
            next = *v;
        }
    }
}
