//! Pair strategy performance summary.

use super::position::Position;
use super::rolling::nan_mean;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BacktestMetrics {
    pub total_return: f64,
    pub sharpe: f64,
    pub trade_count: usize,
    pub avg_hedge_ratio: f64,
    /// Share of bars with a defined retest that passed, in percent.
    pub cointegration_valid_pct: f64,
}

impl BacktestMetrics {
    /// All inputs are per-bar and of equal length.
    ///
    /// The bar return is `pos[t-1] * (dy[t] - beta[t] * dx[t])` where dx and
    /// dy are the first differences of the simple percentage returns.
    pub fn compute(
        x: &[f64],
        y: &[f64],
        beta: &[f64],
        positions: &[Position],
        coint_mask: &[Option<bool>],
    ) -> Self {
        let n = x
            .len()
            .min(y.len())
            .min(beta.len())
            .min(positions.len());

        let dx = first_difference(&pct_change(&x[..n]));
        let dy = first_difference(&pct_change(&y[..n]));

        let returns: Vec<f64> = (1..n)
            .map(|t| {
                let r = positions[t - 1].as_f64() * (dy[t] - beta[t] * dx[t]);
                if r.is_nan() { 0.0 } else { r }
            })
            .collect();

        let total_return = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;
        let sharpe = compute_sharpe(&returns);

        let trade_count = positions
            .windows(2)
            .filter(|w| w[1].direction() != w[0].direction())
            .count();

        let avg_hedge_ratio = nan_mean(beta);

        let defined: Vec<bool> = coint_mask.iter().filter_map(|m| *m).collect();
        let cointegration_valid_pct = if defined.is_empty() {
            0.0
        } else {
            100.0 * defined.iter().filter(|&&v| v).count() as f64 / defined.len() as f64
        };

        BacktestMetrics {
            total_return,
            sharpe,
            trade_count,
            avg_hedge_ratio,
            cointegration_valid_pct,
        }
    }

    /// Reporting precision: four decimals, two for the percentage.
    pub fn rounded(&self) -> Self {
        BacktestMetrics {
            total_return: round_to(self.total_return, 4),
            sharpe: round_to(self.sharpe, 4),
            trade_count: self.trade_count,
            avg_hedge_ratio: round_to(self.avg_hedge_ratio, 4),
            cointegration_valid_pct: round_to(self.cointegration_valid_pct, 2),
        }
    }
}

fn pct_change(prices: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; prices.len()];
    for t in 1..prices.len() {
        let r = (prices[t] - prices[t - 1]) / prices[t - 1];
        out[t] = if r.is_nan() { 0.0 } else { r };
    }
    out
}

fn first_difference(values: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    for t in 1..values.len() {
        out[t] = values[t] - values[t - 1];
    }
    out
}

fn compute_sharpe(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
