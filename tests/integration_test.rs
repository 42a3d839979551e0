//! Integration tests for the evaluation engine.
//!
//! Tests cover:
//! - Pairwise and multivariate screening through the cluster evaluator
//! - Batch screening of named clusters fetched through a data port
//! - Rolling hedge ratio, spread and position invariants of full backtests
//! - The constant-price degenerate scenario
//! - Parameter grid sweeps

mod common;

use common::*;
use statarb::domain::backtest::{run_backtest, run_grid};
use statarb::domain::cluster::{ClusterEvaluator, SkipReason};
use statarb::domain::cointegration::CointegrationMethod;
use statarb::domain::cointegration::engle_granger::engle_granger_pvalue;
use statarb::domain::error::StatArbError;
use statarb::domain::hedge_ratio::rolling_beta;
use statarb::domain::params::{ClusterConfig, StrategyParams};
use statarb::domain::position::Position;
use statarb::domain::price_series::{Cluster, PriceSeries};
use statarb::ports::data_port::DataPort;
use std::collections::BTreeMap;

fn evaluator() -> ClusterEvaluator {
    ClusterEvaluator::new(ClusterConfig::default())
}

mod pairwise_screening {
    use super::*;

    #[test]
    fn noisy_copy_is_cointegrated() {
        let x = random_walk(42, 400, 0.0);
        let y = add_noise(&x, 43, 0.3);

        let result = evaluator()
            .evaluate_series(vec![PriceSeries::new("X", x), PriceSeries::new("Y", y)])
            .unwrap();

        assert_eq!(result.method, CointegrationMethod::Pairwise);
        assert_eq!(result.rank, 1);
        assert!(result.valid);
        assert!(result.score > 0.9, "score {}", result.score);
        assert!(result.error.is_none());
        let diag = result.pairwise.unwrap();
        assert!((diag.hedge_ratio - 1.0).abs() < 0.1);
    }

    #[test]
    fn independent_walks_rarely_reject() {
        let trials = 20;
        let above = (0..trials)
            .filter(|&seed| {
                let x = random_walk(1_000 + seed, 300, 0.0);
                let y = random_walk(5_000 + seed, 300, 0.0);
                engle_granger_pvalue(&x, &y).unwrap() > 0.05
            })
            .count();

        assert!(above >= 15, "only {above} of {trials} above 0.05");
    }

    #[test]
    fn evaluation_is_deterministic() {
        let (x, y) = cointegrated_pair(7, 250);
        let series = vec![PriceSeries::new("X", x), PriceSeries::new("Y", y)];

        let first = evaluator().evaluate_series(series.clone()).unwrap();
        let second = evaluator().evaluate_series(series).unwrap();

        assert_eq!(first, second);
    }
}

mod multivariate_screening {
    use super::*;

    fn three_series() -> Vec<PriceSeries> {
        let x = random_walk(11, 400, 0.0);
        let y = add_noise(&x, 12, 0.5);
        let combo: Vec<f64> = x.iter().zip(&y).map(|(a, b)| 0.5 * a + 0.2 * b).collect();
        let z = add_noise(&combo, 13, 0.5);
        vec![
            PriceSeries::new("X", x),
            PriceSeries::new("Y", y),
            PriceSeries::new("Z", z),
        ]
    }

    #[test]
    fn three_related_series_have_positive_rank() {
        let result = evaluator().evaluate_series(three_series()).unwrap();

        assert_eq!(result.method, CointegrationMethod::Multivariate);
        assert!(result.rank >= 1, "rank {}", result.rank);
        assert!(result.valid);
        assert!(result.pvalue.is_none());

        let eigen = result.eigen_info.unwrap();
        assert_eq!(eigen.eigenvalues.len(), 3);
        assert_eq!(eigen.eigenvectors.len(), 3);
        assert!(eigen.eigenvalues.windows(2).all(|w| w[0] >= w[1]));
        assert!(eigen.eigenvalues.iter().all(|&l| (0.0..1.0).contains(&l)));
        assert!(eigen.trace_stats.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn score_is_rank_over_three() {
        let result = evaluator().evaluate_series(three_series()).unwrap();
        let expected = ((result.rank as f64 / 3.0).min(1.0) * 1000.0).round() / 1000.0;
        assert_eq!(result.score, expected);
    }

    #[test]
    fn deterministic_across_calls() {
        let a = evaluator().evaluate_series(three_series()).unwrap();
        let b = evaluator().evaluate_series(three_series()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicated_series_downgraded_not_raised() {
        let x = random_walk(3, 200, 0.0);
        let y = random_walk(4, 200, 0.0);
        let result = evaluator()
            .evaluate_series(vec![
                PriceSeries::new("X", x.clone()),
                PriceSeries::new("Y", y),
                PriceSeries::new("X2", x),
            ])
            .unwrap();

        assert_eq!(result.rank, 0);
        assert_eq!(result.score, 0.0);
        assert!(!result.valid);
        assert!(result.error.is_some());
    }
}

mod batch_screening {
    use super::*;

    fn port() -> MockDataPort {
        let (a, b) = cointegrated_pair(21, 300);
        let c = random_walk(22, 300, 100.0);
        let d = random_walk(23, 300, 100.0);
        let mut port = MockDataPort::new()
            .with_series(dated_series("AAA", a))
            .with_series(dated_series("BBB", b))
            .with_series(dated_series("CCC", c))
            .with_series(dated_series("DDD", d))
            .with_series(dated_series("SHORT1", random_walk(24, 10, 50.0)))
            .with_series(dated_series("SHORT2", random_walk(25, 10, 50.0)))
            .with_error("BROKEN", "feed offline");
        for i in 0..7 {
            port = port.with_series(dated_series(&format!("W{i}"), random_walk(30 + i, 300, 100.0)));
        }
        port
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn filter_keeps_valid_and_reports_skipped() {
        let port = port();
        let wide: Vec<String> = (0..7).map(|i| format!("W{i}")).collect();

        let mut clusters = BTreeMap::new();
        clusters.insert("pair".to_string(), port.fetch_cluster(&symbols(&["AAA", "BBB"])).unwrap());
        clusters.insert("short".to_string(), port.fetch_cluster(&symbols(&["SHORT1", "SHORT2"])).unwrap());
        clusters.insert("wide".to_string(), port.fetch_cluster(&wide).unwrap());

        let screening = evaluator().filter_valid_clusters(&clusters);

        assert!(screening.valid.contains_key("pair"));
        assert!(!screening.valid.contains_key("short"));
        assert!(!screening.valid.contains_key("wide"));

        let wide_skip = screening.skipped.iter().find(|s| s.name == "wide").unwrap();
        assert_eq!(wide_skip.reason, SkipReason::TooManyAssets { assets: 7 });
        let short_skip = screening.skipped.iter().find(|s| s.name == "short").unwrap();
        assert!(matches!(short_skip.reason, SkipReason::Rejected(_)));
    }

    #[test]
    fn unrelated_pair_is_not_kept() {
        let port = port();
        let mut clusters = BTreeMap::new();
        clusters.insert("walks".to_string(), port.fetch_cluster(&symbols(&["CCC", "DDD"])).unwrap());

        let screening = evaluator().filter_valid_clusters(&clusters);

        // Either rejected by the test or kept; never skipped.
        assert!(screening.skipped.is_empty());
    }

    #[test]
    fn fetch_errors_surface() {
        let port = port();
        let err = port.fetch_cluster(&symbols(&["AAA", "BROKEN"])).unwrap_err();
        assert!(matches!(err, StatArbError::Data { reason } if reason == "feed offline"));
    }

    #[test]
    fn single_series_cluster_rejected() {
        let port = port();
        let err = port.fetch_cluster(&symbols(&["AAA"])).unwrap_err();
        assert!(matches!(err, StatArbError::InvalidClusterSize { size: 1, .. }));
    }

    #[test]
    fn data_range_from_port() {
        let port = port();
        let (first, last, count) = port.data_range("AAA").unwrap().unwrap();
        assert_eq!(first, date(2020, 1, 1));
        assert_eq!(count, 300);
        assert_eq!(last, calendar(300)[299]);
    }
}

mod backtest_properties {
    use super::*;

    fn params() -> StrategyParams {
        StrategyParams {
            lookback: 60,
            ..Default::default()
        }
    }

    #[test]
    fn rolling_beta_full_length_without_nan() {
        let (x, y) = cointegrated_pair(5, 300);
        let beta = rolling_beta(&x, &y, 60).unwrap();
        assert_eq!(beta.len(), 300);
        assert!(beta.iter().all(|b| !b.is_nan()));
    }

    #[test]
    fn positions_follow_signals() {
        for seed in [1, 2, 3] {
            let (x, y) = cointegrated_pair(seed, 300);
            let result = run_backtest(&x, &y, &params()).unwrap();
            let s = &result.signals;
            let p = &result.positions;

            assert_eq!(p[0], Position::Flat);
            for i in 1..p.len() {
                match p[i] {
                    Position::Long => assert!(s.long_entry[i] || (p[i - 1] == Position::Long && !s.exit_trade[i])),
                    Position::Short => assert!(s.short_entry[i] || (p[i - 1] == Position::Short && !s.exit_trade[i])),
                    Position::Flat => {}
                }
            }
        }
    }

    #[test]
    fn trade_count_matches_position_changes() {
        let (x, y) = cointegrated_pair(8, 300);
        let result = run_backtest(&x, &y, &params()).unwrap();

        let changes = result
            .positions
            .windows(2)
            .filter(|w| w[0] != w[1])
            .count();
        assert_eq!(result.metrics.trade_count, changes);
    }

    #[test]
    fn mask_is_undefined_only_before_lookback() {
        let (x, y) = cointegrated_pair(9, 200);
        let result = run_backtest(&x, &y, &params()).unwrap();
        let mask = &result.signals.coint_mask;

        assert!(mask[..60].iter().all(Option::is_none));
        assert!(mask[60..].iter().all(Option::is_some));
    }

    #[test]
    fn cointegrated_pair_is_mostly_valid() {
        let (x, y) = cointegrated_pair(10, 300);
        let result = run_backtest(&x, &y, &params()).unwrap();
        assert!(result.metrics.cointegration_valid_pct > 50.0);
        assert!((result.metrics.avg_hedge_ratio - 1.5).abs() < 0.3);
    }
}

mod degenerate {
    use super::*;

    #[test]
    fn constant_prices_never_trade() {
        let x = vec![100.0; 150];
        let y = vec![50.0; 150];

        let result = run_backtest(&x, &y, &StrategyParams {
            lookback: 60,
            ..Default::default()
        })
        .unwrap();

        assert!(result.signals.zscore.iter().all(|z| z.is_nan()));
        assert!(result.positions.iter().all(|p| *p == Position::Flat));
        assert_eq!(result.metrics.total_return, 0.0);
        assert_eq!(result.metrics.trade_count, 0);
        assert_eq!(result.metrics.sharpe, 0.0);
    }

    #[test]
    fn constant_pair_cluster_is_downgraded() {
        // Levels that are and are not exactly representable must agree.
        for (a, b) in [(100.0, 50.0), (1.1, 2.2), (100.1, 50.3), (0.1, 0.7), (33.3, 12.7)] {
            let cluster = Cluster::new(vec![
                PriceSeries::new("X", vec![a; 80]),
                PriceSeries::new("Y", vec![b; 80]),
            ])
            .unwrap();

            let result = evaluator().evaluate(&cluster).unwrap();

            assert!(!result.valid, "pair {a}/{b}");
            assert_eq!(result.rank, 0);
            assert_eq!(result.score, 0.0);
            assert!(result.error.is_some());
        }
    }

    #[test]
    fn constant_leg_against_moving_leg_is_downgraded() {
        let moving: Vec<f64> = (0..80).map(|i| 10.0 + (i as f64 * 0.3).sin()).collect();
        for level in [5.1, 0.3, 77.7, 5.0] {
            for series in [
                vec![PriceSeries::new("M", moving.clone()), PriceSeries::new("C", vec![level; 80])],
                vec![PriceSeries::new("C", vec![level; 80]), PriceSeries::new("M", moving.clone())],
            ] {
                let result = evaluator().evaluate(&Cluster::new(series).unwrap()).unwrap();
                assert!(!result.valid, "level {level}");
                assert_eq!(result.score, 0.0);
            }
        }
    }

    #[test]
    fn flat_stretch_gives_nan_zscore_and_no_entry() {
        // Both legs move, then hold still for longer than two lookbacks.
        let mut x: Vec<f64> = random_walk(12, 120, 100.0);
        let mut y: Vec<f64> = x.iter().map(|v| 1.5 * v + 20.0).collect();
        let (x_last, y_last) = (x[119], y[119]);
        x.extend(std::iter::repeat_n(x_last, 200));
        y.extend(std::iter::repeat_n(y_last, 200));

        let result = run_backtest(&x, &y, &StrategyParams {
            lookback: 60,
            ..Default::default()
        })
        .unwrap();
        let s = &result.signals;

        let flat: Vec<usize> = (0..s.len()).filter(|&i| s.spread_std[i] == 0.0).collect();
        assert!(!flat.is_empty());
        for &i in &flat {
            assert!(s.zscore[i].is_nan(), "bar {i}");
            assert!(!s.long_entry[i] && !s.short_entry[i], "bar {i}");
            assert!(s.exit_trade[i], "bar {i}");
        }
        assert_eq!(*result.positions.last().unwrap(), Position::Flat);
    }
}

mod grid {
    use super::*;

    #[test]
    fn sweep_covers_every_point() {
        let (x, y) = cointegrated_pair(12, 260);
        let grid: Vec<StrategyParams> = StrategyParams::parameter_grid()
            .into_iter()
            .filter(|p| p.lookback <= 100 && p.coint_pval == 0.05)
            .collect();

        let results = run_grid(&x, &y, &grid);

        assert_eq!(results.len(), grid.len());
        for ((params, outcome), expected) in results.iter().zip(&grid) {
            assert_eq!(params, expected);
            let metrics = outcome.as_ref().unwrap();
            assert!(metrics.total_return.is_finite());
        }
    }

    #[test]
    fn lookback_longer_than_history_fails_point() {
        let (x, y) = cointegrated_pair(13, 180);
        let grid = [StrategyParams {
            lookback: 200,
            ..Default::default()
        }];

        let results = run_grid(&x, &y, &grid);

        assert!(matches!(
            results[0].1,
            Err(StatArbError::InsufficientData { have: 180, need: 201, .. })
        ));
    }
}
