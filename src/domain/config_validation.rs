//! Configuration validation.
//!
//! Reads the `[strategy]`, `[cluster]` and `[data]` sections into typed
//! parameter records. Missing keys take the engine defaults; present but
//! malformed or out-of-range values are rejected with their section/key.

use crate::domain::cointegration::CriticalLevel;
use crate::domain::cointegration::johansen::DetOrder;
use crate::domain::error::StatArbError;
use crate::domain::params::{ClusterConfig, StrategyParams};
use crate::ports::config_port::ConfigPort;

pub fn strategy_params(config: &dyn ConfigPort) -> Result<StrategyParams, StatArbError> {
    let defaults = StrategyParams::default();
    let params = StrategyParams {
        lookback: read_count(config, "strategy", "lookback", defaults.lookback)?,
        entry_z: read_double(config, "strategy", "entry_z", defaults.entry_z)?,
        exit_z: read_double(config, "strategy", "exit_z", defaults.exit_z)?,
        coint_pval: read_double(config, "strategy", "coint_pval", defaults.coint_pval)?,
        min_valid: read_count(config, "strategy", "min_valid", defaults.min_valid)?,
    };
    params.validate()?;
    Ok(params)
}

pub fn cluster_config(config: &dyn ConfigPort) -> Result<ClusterConfig, StatArbError> {
    let defaults = ClusterConfig::default();

    let significance = read_int(config, "cluster", "significance", defaults.level.percent())?;
    let level = CriticalLevel::from_percent(significance).ok_or_else(|| StatArbError::ConfigInvalid {
        section: "cluster".to_string(),
        key: "significance".to_string(),
        reason: "significance must be one of 90, 95, 99".to_string(),
    })?;

    let det_code = read_int(config, "cluster", "det_order", defaults.det_order.code())?;
    let det_order = DetOrder::from_code(det_code).ok_or_else(|| StatArbError::ConfigInvalid {
        section: "cluster".to_string(),
        key: "det_order".to_string(),
        reason: "det_order must be -1, 0 or 1".to_string(),
    })?;

    let cluster = ClusterConfig {
        p_threshold: read_double(config, "cluster", "p_threshold", defaults.p_threshold)?,
        min_rank: read_count(config, "cluster", "min_rank", defaults.min_rank)?,
        max_assets: read_count(config, "cluster", "max_assets", defaults.max_assets)?,
        level,
        det_order,
        k_ar_diff: read_count(config, "cluster", "k_ar_diff", defaults.k_ar_diff)?,
    };
    cluster.validate()?;
    Ok(cluster)
}

pub fn data_dir(config: &dyn ConfigPort) -> Result<String, StatArbError> {
    match config.get_string("data", "dir") {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(StatArbError::ConfigMissing {
            section: "data".to_string(),
            key: "dir".to_string(),
        }),
    }
}

fn read_int(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<i64, StatArbError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| StatArbError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("expected an integer, got '{}'", raw.trim()),
        }),
    }
}

fn read_count(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> Result<usize, StatArbError> {
    let value = read_int(config, section, key, default as i64)?;
    usize::try_from(value).map_err(|_| StatArbError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("{key} must be non-negative"),
    })
}

fn read_double(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, StatArbError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<f64>().map_err(|_| StatArbError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("expected a number, got '{}'", raw.trim()),
        }),
    }
}
