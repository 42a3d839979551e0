//! Cluster screening: run the right cointegration test for a group of
//! series, score the outcome and decide validity.
//!
//! A numerical failure inside a test downgrades that cluster to a
//! zero-confidence result so that one bad group cannot abort a batch.
//! Undersized or malformed input is still an error.

use crate::domain::cointegration::{
    CointegrationMethod, CointegrationTest, EigenInfo, PairwiseDiagnostics, TestOutcome,
};
use crate::domain::error::StatArbError;
use crate::domain::params::ClusterConfig;
use crate::domain::price_series::{Cluster, MIN_CLUSTER_SIZE, PriceSeries};
use std::collections::BTreeMap;
use std::fmt;

/// Multivariate scores reach 1.0 at this rank.
const RANK_NORMALIZATION: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CointegrationResult {
    pub method: CointegrationMethod,
    pub rank: usize,
    pub pvalue: Option<f64>,
    pub eigen_info: Option<EigenInfo>,
    pub pairwise: Option<PairwiseDiagnostics>,
    pub score: f64,
    pub valid: bool,
    /// Set when the test failed numerically and the result was downgraded.
    pub error: Option<String>,
}

impl CointegrationResult {
    fn downgraded(method: CointegrationMethod, reason: String) -> Self {
        Self {
            method,
            rank: 0,
            pvalue: match method {
                CointegrationMethod::Pairwise => Some(1.0),
                CointegrationMethod::Multivariate => None,
            },
            eigen_info: None,
            pairwise: None,
            score: 0.0,
            valid: false,
            error: Some(reason),
        }
    }
}

impl fmt::Display for CointegrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]  Rank={}  Score={:.2}  Valid={}",
            self.method, self.rank, self.score, self.valid
        )
    }
}

pub fn score(outcome: &TestOutcome) -> f64 {
    match outcome.method {
        CointegrationMethod::Pairwise => outcome.pvalue.map_or(0.0, |p| (1.0 - p).max(0.0)),
        CointegrationMethod::Multivariate => (outcome.rank as f64 / RANK_NORMALIZATION).min(1.0),
    }
}

#[derive(Debug, Clone)]
pub struct ClusterScreening {
    pub valid: BTreeMap<String, CointegrationResult>,
    pub skipped: Vec<SkippedCluster>,
}

#[derive(Debug, Clone)]
pub struct SkippedCluster {
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    TooManyAssets { assets: usize },
    Rejected(String),
}

#[derive(Debug, Clone, Copy)]
pub struct ClusterEvaluator {
    config: ClusterConfig,
}

impl ClusterEvaluator {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn evaluate(&self, cluster: &Cluster) -> Result<CointegrationResult, StatArbError> {
        if cluster.len() > self.config.max_assets {
            return Err(StatArbError::InvalidClusterSize {
                size: cluster.len(),
                min: MIN_CLUSTER_SIZE,
                max: self.config.max_assets,
            });
        }

        let test = CointegrationTest::for_cluster_size(cluster.len())?;
        let outcome = match test.run(&cluster.columns(), &self.config) {
            Ok(outcome) => outcome,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    assets = ?cluster.names(),
                    method = %test.method(),
                    "cointegration test failed, scoring cluster as invalid: {e}"
                );
                return Ok(CointegrationResult::downgraded(test.method(), e.to_string()));
            }
            Err(e) => return Err(e),
        };

        let score = (score(&outcome) * 1000.0).round() / 1000.0;
        let valid = match outcome.method {
            CointegrationMethod::Pairwise => outcome.rank == 1,
            CointegrationMethod::Multivariate => outcome.rank >= self.config.min_rank,
        };

        tracing::debug!(
            assets = ?cluster.names(),
            method = %outcome.method,
            rank = outcome.rank,
            score,
            valid,
            "cluster evaluated"
        );

        Ok(CointegrationResult {
            method: outcome.method,
            rank: outcome.rank,
            pvalue: outcome.pvalue,
            eigen_info: outcome.eigen_info,
            pairwise: outcome.pairwise,
            score,
            valid,
            error: None,
        })
    }

    pub fn evaluate_series(&self, series: Vec<PriceSeries>) -> Result<CointegrationResult, StatArbError> {
        let cluster = Cluster::new(series)?;
        self.evaluate(&cluster)
    }

    /// Screen named clusters and keep the valid ones. Clusters wider than
    /// `max_assets` are skipped without testing.
    pub fn filter_valid_clusters(&self, clusters: &BTreeMap<String, Cluster>) -> ClusterScreening {
        let mut valid = BTreeMap::new();
        let mut skipped = Vec::new();

        for (name, cluster) in clusters {
            if cluster.len() > self.config.max_assets {
                tracing::info!(
                    cluster = %name,
                    assets = cluster.len(),
                    max_assets = self.config.max_assets,
                    "skipping cluster above asset limit"
                );
                skipped.push(SkippedCluster {
                    name: name.clone(),
                    reason: SkipReason::TooManyAssets {
                        assets: cluster.len(),
                    },
                });
                continue;
            }

            match self.evaluate(cluster) {
                Ok(result) if result.valid => {
                    valid.insert(name.clone(), result);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(cluster = %name, "skipping cluster: {e}");
                    skipped.push(SkippedCluster {
                        name: name.clone(),
                        reason: SkipReason::Rejected(e.to_string()),
                    });
                }
            }
        }

        ClusterScreening { valid, skipped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cointegration::CriticalLevel;
    use approx::assert_relative_eq;

    fn outcome(method: CointegrationMethod, rank: usize, pvalue: Option<f64>) -> TestOutcome {
        TestOutcome {
            method,
            rank,
            pvalue,
            eigen_info: None,
            pairwise: None,
        }
    }

    #[test]
    fn pairwise_score_is_one_minus_pvalue() {
        let o = outcome(CointegrationMethod::Pairwise, 1, Some(0.02));
        assert_relative_eq!(score(&o), 0.98);
        let o = outcome(CointegrationMethod::Pairwise, 0, Some(1.0));
        assert_relative_eq!(score(&o), 0.0);
    }

    #[test]
    fn multivariate_score_saturates() {
        for (rank, expected) in [(0, 0.0), (1, 1.0 / 3.0), (2, 2.0 / 3.0), (3, 1.0), (5, 1.0)] {
            let o = outcome(CointegrationMethod::Multivariate, rank, None);
            assert_relative_eq!(score(&o), expected);
        }
    }

    #[test]
    fn display_summary() {
        let r = CointegrationResult::downgraded(CointegrationMethod::Multivariate, "x".into());
        assert_eq!(r.to_string(), "[Johansen]  Rank=0  Score=0.00  Valid=false");
    }

    #[test]
    fn numerical_failure_is_downgraded() {
        let trend: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let evaluator = ClusterEvaluator::new(ClusterConfig::default());
        let result = evaluator
            .evaluate_series(vec![
                PriceSeries::new("A", trend.clone()),
                PriceSeries::new("B", vec![5.0; 60]),
            ])
            .unwrap();
        assert_eq!(result.rank, 0);
        assert_eq!(result.score, 0.0);
        assert!(!result.valid);
        assert_eq!(result.pvalue, Some(1.0));
        assert!(result.error.is_some());
    }

    #[test]
    fn short_cluster_is_hard_failure() {
        let evaluator = ClusterEvaluator::new(ClusterConfig::default());
        let err = evaluator
            .evaluate_series(vec![
                PriceSeries::new("A", vec![1.0, 2.0, 3.0]),
                PriceSeries::new("B", vec![2.0, 1.0, 3.0]),
            ])
            .unwrap_err();
        assert!(matches!(err, StatArbError::InsufficientData { .. }));
    }

    #[test]
    fn configured_max_assets_enforced() {
        let config = ClusterConfig {
            max_assets: 2,
            level: CriticalLevel::NinetyNine,
            ..Default::default()
        };
        let series = (0..3)
            .map(|i| PriceSeries::new(format!("S{i}"), vec![1.0; 40]))
            .collect();
        let err = ClusterEvaluator::new(config).evaluate_series(series).unwrap_err();
        assert!(matches!(
            err,
            StatArbError::InvalidClusterSize { size: 3, max: 2, .. }
        ));
    }
}
