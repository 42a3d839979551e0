//! Immutable per-call parameter records.
//!
//! `StrategyParams` drives one pair backtest, `ClusterConfig` one cluster
//! screening. Both are plain values; nothing in the engine keeps them
//! between calls.

use crate::domain::cointegration::CriticalLevel;
use crate::domain::cointegration::johansen::DetOrder;
use crate::domain::error::StatArbError;
use crate::domain::price_series::{MAX_SUPPORTED_ASSETS, MIN_CLUSTER_SIZE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyParams {
    /// Window for the hedge ratio, the z-score and the cointegration retest.
    pub lookback: usize,
    pub entry_z: f64,
    pub exit_z: f64,
    pub coint_pval: f64,
    /// Below this many bars a backtest returns zeroed metrics.
    pub min_valid: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            lookback: 100,
            entry_z: 2.0,
            exit_z: 0.5,
            coint_pval: 0.05,
            min_valid: 50,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), StatArbError> {
        if self.lookback < 2 {
            return Err(invalid("strategy", "lookback", "lookback must be at least 2"));
        }
        if !(self.entry_z > 0.0) || !self.entry_z.is_finite() {
            return Err(invalid("strategy", "entry_z", "entry_z must be positive"));
        }
        if !(self.exit_z >= 0.0 && self.exit_z < self.entry_z) {
            return Err(invalid(
                "strategy",
                "exit_z",
                "exit_z must be in [0, entry_z)",
            ));
        }
        if !(self.coint_pval > 0.0 && self.coint_pval < 1.0) {
            return Err(invalid(
                "strategy",
                "coint_pval",
                "coint_pval must be between 0 and 1",
            ));
        }
        Ok(())
    }

    /// The sweep grid external optimizers iterate over, in grid order.
    pub fn parameter_grid() -> Vec<StrategyParams> {
        const LOOKBACKS: [usize; 4] = [60, 100, 150, 200];
        const ENTRY_Z: [f64; 3] = [1.5, 2.0, 2.5];
        const EXIT_Z: [f64; 3] = [0.3, 0.5, 0.7];
        const COINT_PVAL: [f64; 3] = [0.01, 0.05, 0.1];

        let base = StrategyParams::default();
        let mut grid = Vec::with_capacity(LOOKBACKS.len() * 27);
        for &lookback in &LOOKBACKS {
            for &entry_z in &ENTRY_Z {
                for &exit_z in &EXIT_Z {
                    for &coint_pval in &COINT_PVAL {
                        grid.push(StrategyParams {
                            lookback,
                            entry_z,
                            exit_z,
                            coint_pval,
                            ..base
                        });
                    }
                }
            }
        }
        grid
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConfig {
    /// Significance level of the pairwise test.
    pub p_threshold: f64,
    /// Smallest rank for a multivariate cluster to count as valid.
    pub min_rank: usize,
    pub max_assets: usize,
    pub level: CriticalLevel,
    pub det_order: DetOrder,
    pub k_ar_diff: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            p_threshold: 0.05,
            min_rank: 1,
            max_assets: 6,
            level: CriticalLevel::NinetyFive,
            det_order: DetOrder::Constant,
            k_ar_diff: 1,
        }
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<(), StatArbError> {
        if !(self.p_threshold > 0.0 && self.p_threshold < 1.0) {
            return Err(invalid(
                "cluster",
                "p_threshold",
                "p_threshold must be between 0 and 1",
            ));
        }
        if self.min_rank < 1 {
            return Err(invalid("cluster", "min_rank", "min_rank must be at least 1"));
        }
        if self.max_assets < MIN_CLUSTER_SIZE || self.max_assets > MAX_SUPPORTED_ASSETS {
            return Err(invalid(
                "cluster",
                "max_assets",
                &format!("max_assets must be between {MIN_CLUSTER_SIZE} and {MAX_SUPPORTED_ASSETS}"),
            ));
        }
        Ok(())
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> StatArbError {
    StatArbError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
