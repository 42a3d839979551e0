//! Spread, rolling z-score and entry/exit signals for one pair.

use crate::domain::cointegration::engle_granger::engle_granger_pvalue;
use crate::domain::error::StatArbError;
use crate::domain::params::StrategyParams;
use crate::domain::rolling::{rolling_mean, rolling_std};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalParams {
    pub window: usize,
    pub entry_z: f64,
    pub exit_z: f64,
    pub coint_pval: f64,
}

impl From<&StrategyParams> for SignalParams {
    fn from(p: &StrategyParams) -> Self {
        Self {
            window: p.lookback,
            entry_z: p.entry_z,
            exit_z: p.exit_z,
            coint_pval: p.coint_pval,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpreadSignals {
    pub spread: Vec<f64>,
    pub spread_mean: Vec<f64>,
    pub spread_std: Vec<f64>,
    /// NaN during warmup and wherever the window has zero variance.
    pub zscore: Vec<f64>,
    /// `None` before the first full retest window.
    pub coint_mask: Vec<Option<bool>>,
    pub long_entry: Vec<bool>,
    pub short_entry: Vec<bool>,
    pub exit_trade: Vec<bool>,
}

impl SpreadSignals {
    pub fn len(&self) -> usize {
        self.spread.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spread.is_empty()
    }
}

pub fn compute_signals(
    x: &[f64],
    y: &[f64],
    beta: &[f64],
    params: &SignalParams,
) -> Result<SpreadSignals, StatArbError> {
    let n = x.len();
    if y.len() != n || beta.len() != n {
        return Err(StatArbError::insufficient(
            "spread inputs of equal length",
            y.len().min(beta.len()),
            n,
        ));
    }

    let spread: Vec<f64> = (0..n).map(|i| y[i] - beta[i] * x[i]).collect();
    let spread_mean = rolling_mean(&spread, params.window);
    let spread_std = rolling_std(&spread, params.window);
    let zscore: Vec<f64> = (0..n)
        .map(|i| zscore(spread[i], spread_mean[i], spread_std[i]))
        .collect();

    let coint_mask = coint_mask(x, y, params.window, params.coint_pval)?;

    let mut long_entry = vec![false; n];
    let mut short_entry = vec![false; n];
    let mut exit_trade = vec![false; n];
    for i in 0..n {
        let valid = coint_mask[i] == Some(true);
        let z = zscore[i];
        long_entry[i] = valid && z < -params.entry_z;
        short_entry[i] = valid && z > params.entry_z;
        exit_trade[i] = !valid || z.abs() < params.exit_z;
    }

    Ok(SpreadSignals {
        spread,
        spread_mean,
        spread_std,
        zscore,
        coint_mask,
        long_entry,
        short_entry,
        exit_trade,
    })
}

fn zscore(value: f64, mean: f64, std: f64) -> f64 {
    if std == 0.0 || std.is_nan() || mean.is_nan() {
        f64::NAN
    } else {
        (value - mean) / std
    }
}

/// Re-run the pairwise test on the trailing window ending before each bar.
///
/// A numerically failed test marks the bar as not cointegrated. A window
/// too short for the test is an error.
pub fn coint_mask(
    x: &[f64],
    y: &[f64],
    window: usize,
    coint_pval: f64,
) -> Result<Vec<Option<bool>>, StatArbError> {
    let n = x.len().min(y.len());
    let mut mask = vec![None; n];

    for i in window..n {
        let start = i - window;
        mask[i] = match engle_granger_pvalue(&x[start..i], &y[start..i]) {
            Ok(p) => Some(p < coint_pval),
            Err(e) if e.is_recoverable() => {
                tracing::debug!(index = i, "cointegration retest failed: {e}");
                Some(false)
            }
            Err(e) => return Err(e),
        };
    }

    Ok(mask)
}
