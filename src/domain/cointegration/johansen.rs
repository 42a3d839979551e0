//! Johansen trace test for the cointegration rank of a group of series.
//!
//! Short-run dynamics (k_ar_diff lagged differences) are concentrated out by
//! OLS residuals; the eigenvalues of the reduced-rank problem
//! S_k0 S_00^-1 S_0k v = lambda S_kk v then give the trace statistics.

use super::{CriticalLevel, EigenInfo};
use crate::domain::error::StatArbError;
use nalgebra::{DMatrix, SymmetricEigen};

pub const MIN_MULTIVARIATE_OBS: usize = 20;

/// Deterministic terms assumed in the levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetOrder {
    /// No deterministic terms.
    None,
    /// Constant.
    Constant,
    /// Constant and linear trend.
    Trend,
}

impl DetOrder {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(DetOrder::None),
            0 => Some(DetOrder::Constant),
            1 => Some(DetOrder::Trend),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            DetOrder::None => -1,
            DetOrder::Constant => 0,
            DetOrder::Trend => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JohansenResult {
    pub rank: usize,
    pub eigen: EigenInfo,
}

// Trace critical values (90%, 95%, 99%) by number of remaining series.
const TRACE_CV_NONE: [[f64; 3]; 12] = [
    [2.9762, 4.1296, 6.9406],
    [10.4741, 12.3212, 16.3640],
    [21.7781, 24.2761, 29.5147],
    [37.0339, 40.1749, 46.5716],
    [56.2839, 60.0627, 67.6367],
    [79.5329, 83.9383, 92.7136],
    [106.7351, 111.7797, 121.7375],
    [137.9954, 143.6691, 154.7977],
    [173.2292, 179.5199, 191.8122],
    [212.4721, 219.4051, 232.8291],
    [255.6732, 263.2603, 277.9962],
    [302.9054, 311.1288, 326.9716],
];

const TRACE_CV_CONSTANT: [[f64; 3]; 12] = [
    [2.7055, 3.8415, 6.6349],
    [13.4294, 15.4943, 19.9349],
    [27.0669, 29.7961, 35.4628],
    [44.4929, 47.8545, 54.6815],
    [65.8202, 69.8189, 77.8202],
    [91.1090, 95.7542, 104.9637],
    [120.3673, 125.6185, 135.9825],
    [153.6341, 159.5290, 171.0905],
    [190.8714, 197.3772, 210.0366],
    [232.1030, 239.2468, 253.2526],
    [277.3740, 285.1402, 300.2821],
    [326.5354, 334.9795, 351.2150],
];

const TRACE_CV_TREND: [[f64; 3]; 12] = [
    [2.7055, 3.8415, 6.6349],
    [16.1619, 18.3985, 23.1485],
    [32.0645, 35.0116, 41.0815],
    [51.6492, 55.2459, 62.5202],
    [75.1027, 79.3422, 87.7748],
    [102.4674, 107.3429, 116.9829],
    [133.7852, 139.2780, 150.0778],
    [169.0618, 175.1584, 187.1891],
    [208.3582, 215.1268, 228.2226],
    [251.6293, 259.0267, 273.3838],
    [298.8836, 306.8988, 322.4264],
    [350.1125, 358.7190, 375.3203],
];

pub fn trace_critical_value(remaining: usize, det_order: DetOrder, level: CriticalLevel) -> Option<f64> {
    let table = match det_order {
        DetOrder::None => &TRACE_CV_NONE,
        DetOrder::Constant => &TRACE_CV_CONSTANT,
        DetOrder::Trend => &TRACE_CV_TREND,
    };
    remaining
        .checked_sub(1)
        .and_then(|i| table.get(i))
        .map(|row| row[level.column()])
}

pub fn johansen(
    columns: &[&[f64]],
    det_order: DetOrder,
    k_ar_diff: usize,
    level: CriticalLevel,
) -> Result<JohansenResult, StatArbError> {
    let k = columns.len();
    if k < 2 || k > TRACE_CV_CONSTANT.len() {
        return Err(StatArbError::InvalidClusterSize {
            size: k,
            min: 2,
            max: TRACE_CV_CONSTANT.len(),
        });
    }
    let n = columns[0].len();
    if columns.iter().any(|c| c.len() != n) {
        return Err(StatArbError::Data {
            reason: "rank test needs equally long series".to_string(),
        });
    }

    // Rows left after differencing and lagging must exceed the regressors.
    let need = MIN_MULTIVARIATE_OBS.max(k * (k_ar_diff + 1) + k_ar_diff + 3);
    if n < need {
        return Err(StatArbError::insufficient("rank test", n, need));
    }
    if columns.iter().flat_map(|c| c.iter()).any(|v| !v.is_finite()) {
        return Err(StatArbError::test_failure("non-finite input to rank test"));
    }

    let levels = detrend(
        &DMatrix::from_fn(n, k, |i, j| columns[j][i]),
        det_order,
    )?;
    let dx = DMatrix::from_fn(n - 1, k, |i, j| levels[(i + 1, j)] - levels[(i, j)]);

    let t = n - 1 - k_ar_diff;
    let lagged = DMatrix::from_fn(t, k * k_ar_diff, |r, c| {
        let lag = c / k + 1;
        dx[(k_ar_diff + r - lag, c % k)]
    });
    let current = dx.rows(k_ar_diff, t).into_owned();
    let lagged_levels = levels.rows(1, t).into_owned();

    let short_run = if det_order == DetOrder::None {
        DetOrder::None
    } else {
        DetOrder::Constant
    };
    let lagged = detrend(&lagged, short_run)?;
    let current = detrend(&current, short_run)?;
    let lagged_levels = detrend(&lagged_levels, short_run)?;

    let r0 = residualize(&current, &lagged)?;
    let rk = residualize(&lagged_levels, &lagged)?;

    let tf = t as f64;
    let s00 = r0.transpose() * &r0 / tf;
    let s0k = r0.transpose() * &rk / tf;
    let skk = rk.transpose() * &rk / tf;

    ensure_well_conditioned(&s00, "residual covariance S00")?;
    ensure_well_conditioned(&skk, "level covariance S_kk")?;

    let s00_inv = s00
        .try_inverse()
        .ok_or_else(|| StatArbError::test_failure("singular residual covariance S00"))?;
    let sig = s0k.transpose() * s00_inv * &s0k;

    let chol = skk
        .cholesky()
        .ok_or_else(|| StatArbError::test_failure("S_kk is not positive definite"))?;
    let l_inv = chol
        .l()
        .try_inverse()
        .ok_or_else(|| StatArbError::test_failure("singular Cholesky factor"))?;
    let reduced = &l_inv * sig * l_inv.transpose();
    let reduced = (&reduced + reduced.transpose()) * 0.5;
    let decomposition = SymmetricEigen::new(reduced);

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| {
        decomposition.eigenvalues[b]
            .partial_cmp(&decomposition.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let back = l_inv.transpose();
    let mut eigenvalues = Vec::with_capacity(k);
    let mut eigenvectors = Vec::with_capacity(k);
    for &i in &order {
        let raw = decomposition.eigenvalues[i];
        if !raw.is_finite() || raw >= 1.0 {
            return Err(StatArbError::test_failure(format!(
                "eigenvalue {raw} outside [0, 1)"
            )));
        }
        // Tiny negatives are rounding noise.
        eigenvalues.push(raw.max(0.0));

        let mut v: Vec<f64> = (&back * decomposition.eigenvectors.column(i))
            .iter()
            .copied()
            .collect();
        if v.iter().find(|c| **c != 0.0).is_some_and(|c| *c < 0.0) {
            v.iter_mut().for_each(|c| *c = -*c);
        }
        eigenvectors.push(v);
    }

    let log_terms: Vec<f64> = eigenvalues.iter().map(|l| (1.0 - l).ln()).collect();
    let trace_stats: Vec<f64> = (0..k)
        .map(|i| -tf * log_terms[i..].iter().sum::<f64>())
        .collect();
    let max_eigen_stats: Vec<f64> = log_terms.iter().map(|lt| -tf * lt).collect();
    let critical_values: Vec<f64> = (0..k)
        .map(|i| trace_critical_value(k - i, det_order, level).unwrap_or(f64::INFINITY))
        .collect();

    let rank = trace_stats
        .iter()
        .zip(&critical_values)
        .take_while(|(stat, cv)| stat > cv)
        .count();

    Ok(JohansenResult {
        rank,
        eigen: EigenInfo {
            eigenvalues,
            eigenvectors,
            trace_stats,
            max_eigen_stats,
            critical_values,
            level,
        },
    })
}

/// Remove column means (Constant) or a fitted line in time (Trend).
fn detrend(m: &DMatrix<f64>, order: DetOrder) -> Result<DMatrix<f64>, StatArbError> {
    match order {
        DetOrder::None => Ok(m.clone()),
        DetOrder::Constant => {
            let mut out = m.clone();
            for mut col in out.column_iter_mut() {
                let mean = col.mean();
                col.add_scalar_mut(-mean);
            }
            Ok(out)
        }
        DetOrder::Trend => {
            let trend = DMatrix::from_fn(m.nrows(), 2, |i, j| if j == 0 { 1.0 } else { i as f64 });
            residualize(m, &trend)
        }
    }
}

/// Below this ratio of smallest to largest eigenvalue a moment matrix is
/// treated as singular.
const CONDITION_TOL: f64 = 1e-10;

fn ensure_well_conditioned(m: &DMatrix<f64>, what: &str) -> Result<(), StatArbError> {
    let eig = SymmetricEigen::new(m.clone()).eigenvalues;
    let (max, min) = (eig.max(), eig.min());
    if !(max > 0.0 && min > max * CONDITION_TOL) {
        return Err(StatArbError::test_failure(format!("{what} is singular")));
    }
    Ok(())
}

/// Residuals of regressing every column of y on z; y itself when z is empty.
fn residualize(y: &DMatrix<f64>, z: &DMatrix<f64>) -> Result<DMatrix<f64>, StatArbError> {
    if z.ncols() == 0 {
        return Ok(y.clone());
    }
    let zt = z.transpose();
    let coef = (&zt * z)
        .try_inverse()
        .ok_or_else(|| StatArbError::test_failure("singular lagged-difference design"))?
        * (zt * y);
    Ok(y - z * coef)
}
