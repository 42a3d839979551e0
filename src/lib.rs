//! statarb: cointegration screening and adaptive pair-trading backtests.
//!
//! Hexagonal architecture: the pure evaluation engine in [`domain`], port
//! traits in [`ports`], concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
