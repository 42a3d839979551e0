//! Core domain types and the evaluation engine.

pub mod backtest;
pub mod cluster;
pub mod cointegration;
pub mod config_validation;
pub mod error;
pub mod hedge_ratio;
pub mod metrics;
pub mod ols;
pub mod params;
pub mod position;
pub mod price_series;
pub mod rolling;
pub mod spread;
