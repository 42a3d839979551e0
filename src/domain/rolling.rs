//! Trailing-window mean and standard deviation.
//!
//! Window ending at i covers values[i+1-n ..= i]. Warmup: the first (n-1)
//! entries are NaN, as is any window containing a NaN.
//! Standard deviation is the sample estimate (divisor n-1). A window of
//! identical values has a standard deviation of exactly zero.

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, sample_std)
}

fn rolling_apply(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 || window > values.len() {
        return out;
    }

    for i in (window - 1)..values.len() {
        let w = &values[i + 1 - window..=i];
        if w.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = f(w);
    }
    out
}

fn sample_std(w: &[f64]) -> f64 {
    if w.len() < 2 {
        return f64::NAN;
    }
    if w.iter().all(|&v| v == w[0]) {
        return 0.0;
    }

    let n = w.len() as f64;
    let mean = w.iter().sum::<f64>() / n;
    let ss: f64 = w
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum();
    (ss / (n - 1.0)).sqrt()
}

/// Mean of the finite entries; NaN when there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}
