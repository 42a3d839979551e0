//! Cointegration tests.
//!
//! Two variants, chosen by group size: Engle-Granger for pairs and the
//! Johansen trace test for three or more series. Both produce a
//! [`TestOutcome`] which the cluster evaluator turns into a scored
//! [`CointegrationResult`](crate::domain::cluster::CointegrationResult).

pub mod adf;
pub mod engle_granger;
pub mod johansen;
pub mod mackinnon;

use crate::domain::error::StatArbError;
use crate::domain::params::ClusterConfig;
use crate::domain::price_series::MAX_SUPPORTED_ASSETS;
use mackinnon::CriticalValues;
use std::fmt;

/// Column of the rank-test critical value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CriticalLevel {
    Ninety,
    #[default]
    NinetyFive,
    NinetyNine,
}

impl CriticalLevel {
    pub fn column(self) -> usize {
        match self {
            CriticalLevel::Ninety => 0,
            CriticalLevel::NinetyFive => 1,
            CriticalLevel::NinetyNine => 2,
        }
    }

    pub fn from_percent(pct: i64) -> Option<Self> {
        match pct {
            90 => Some(CriticalLevel::Ninety),
            95 => Some(CriticalLevel::NinetyFive),
            99 => Some(CriticalLevel::NinetyNine),
            _ => None,
        }
    }

    pub fn percent(self) -> i64 {
        match self {
            CriticalLevel::Ninety => 90,
            CriticalLevel::NinetyFive => 95,
            CriticalLevel::NinetyNine => 99,
        }
    }
}

/// Rank-test diagnostics, ordered by descending eigenvalue.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenInfo {
    pub eigenvalues: Vec<f64>,
    /// One vector per eigenvalue, one component per series.
    pub eigenvectors: Vec<Vec<f64>>,
    /// Trace statistic for hypothesized rank r = 0, 1, ...
    pub trace_stats: Vec<f64>,
    pub max_eigen_stats: Vec<f64>,
    pub critical_values: Vec<f64>,
    pub level: CriticalLevel,
}

/// Residual unit-root diagnostics of the pairwise test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwiseDiagnostics {
    pub statistic: f64,
    pub critical_values: CriticalValues,
    pub hedge_ratio: f64,
    pub used_lag: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CointegrationMethod {
    Pairwise,
    Multivariate,
}

impl fmt::Display for CointegrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CointegrationMethod::Pairwise => write!(f, "Engle-Granger"),
            CointegrationMethod::Multivariate => write!(f, "Johansen"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub method: CointegrationMethod,
    pub rank: usize,
    pub pvalue: Option<f64>,
    pub eigen_info: Option<EigenInfo>,
    pub pairwise: Option<PairwiseDiagnostics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CointegrationTest {
    Pairwise,
    Multivariate,
}

impl CointegrationTest {
    pub fn for_cluster_size(size: usize) -> Result<Self, StatArbError> {
        match size {
            2 => Ok(CointegrationTest::Pairwise),
            n if n >= 3 => Ok(CointegrationTest::Multivariate),
            n => Err(StatArbError::InvalidClusterSize {
                size: n,
                min: 2,
                max: MAX_SUPPORTED_ASSETS,
            }),
        }
    }

    pub fn method(self) -> CointegrationMethod {
        match self {
            CointegrationTest::Pairwise => CointegrationMethod::Pairwise,
            CointegrationTest::Multivariate => CointegrationMethod::Multivariate,
        }
    }

    pub fn run(self, columns: &[&[f64]], config: &ClusterConfig) -> Result<TestOutcome, StatArbError> {
        match self {
            CointegrationTest::Pairwise => {
                let [y0, y1] = columns else {
                    return Err(StatArbError::InvalidClusterSize {
                        size: columns.len(),
                        min: 2,
                        max: 2,
                    });
                };
                let res = engle_granger::engle_granger(y0, y1)?;
                Ok(TestOutcome {
                    method: CointegrationMethod::Pairwise,
                    rank: usize::from(res.pvalue < config.p_threshold),
                    pvalue: Some(res.pvalue),
                    eigen_info: None,
                    pairwise: Some(PairwiseDiagnostics {
                        statistic: res.statistic,
                        critical_values: res.critical_values,
                        hedge_ratio: res.hedge_ratio,
                        used_lag: res.used_lag,
                    }),
                })
            }
            CointegrationTest::Multivariate => {
                let res = johansen::johansen(columns, config.det_order, config.k_ar_diff, config.level)?;
                Ok(TestOutcome {
                    method: CointegrationMethod::Multivariate,
                    rank: res.rank,
                    pvalue: None,
                    eigen_info: Some(res.eigen),
                    pairwise: None,
                })
            }
        }
    }
}
