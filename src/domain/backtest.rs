//! Pair backtest: hedge ratio, signals, positions and metrics in one call.

use crate::domain::error::StatArbError;
use crate::domain::hedge_ratio::rolling_beta;
use crate::domain::metrics::BacktestMetrics;
use crate::domain::params::StrategyParams;
use crate::domain::position::{Position, generate_positions};
use crate::domain::spread::{SignalParams, SpreadSignals, compute_signals};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub hedge_ratio: Vec<f64>,
    pub signals: SpreadSignals,
    pub positions: Vec<Position>,
    pub metrics: BacktestMetrics,
}

impl BacktestResult {
    fn short_history() -> Self {
        BacktestResult {
            hedge_ratio: Vec::new(),
            signals: SpreadSignals {
                spread: Vec::new(),
                spread_mean: Vec::new(),
                spread_std: Vec::new(),
                zscore: Vec::new(),
                coint_mask: Vec::new(),
                long_entry: Vec::new(),
                short_entry: Vec::new(),
                exit_trade: Vec::new(),
            },
            positions: Vec::new(),
            metrics: BacktestMetrics::default(),
        }
    }

    /// True when the history was too short to evaluate.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Backtest the spread `y - beta * x`.
pub fn run_backtest(x: &[f64], y: &[f64], params: &StrategyParams) -> Result<BacktestResult, StatArbError> {
    if x.len() != y.len() {
        return Err(StatArbError::insufficient(
            "backtest (y aligned with x)",
            y.len(),
            x.len(),
        ));
    }
    params.validate()?;

    let n = x.len();
    if n < params.min_valid {
        tracing::debug!(
            observations = n,
            min_valid = params.min_valid,
            "history below minimum, returning zeroed metrics"
        );
        return Ok(BacktestResult::short_history());
    }
    if n <= params.lookback {
        return Err(StatArbError::insufficient("backtest", n, params.lookback + 1));
    }

    let hedge_ratio = rolling_beta(x, y, params.lookback)?;
    let signals = compute_signals(x, y, &hedge_ratio, &SignalParams::from(params))?;
    let positions = generate_positions(&signals.long_entry, &signals.short_entry, &signals.exit_trade);
    let metrics = BacktestMetrics::compute(x, y, &hedge_ratio, &positions, &signals.coint_mask);

    tracing::debug!(
        lookback = params.lookback,
        entry_z = params.entry_z,
        exit_z = params.exit_z,
        coint_pval = params.coint_pval,
        total_return = metrics.total_return,
        trades = metrics.trade_count,
        "backtest complete"
    );

    Ok(BacktestResult {
        hedge_ratio,
        signals,
        positions,
        metrics,
    })
}

/// Evaluate each parameter record against the same pair. Failures are
/// reported per record and do not stop the sweep.
pub fn run_grid(
    x: &[f64],
    y: &[f64],
    grid: &[StrategyParams],
) -> Vec<(StrategyParams, Result<BacktestMetrics, StatArbError>)> {
    grid.iter()
        .map(|params| {
            let outcome = run_backtest(x, y, params).map(|r| r.metrics);
            if let Err(e) = &outcome {
                tracing::warn!(lookback = params.lookback, "grid point failed: {e}");
            }
            (*params, outcome)
        })
        .collect()
}
