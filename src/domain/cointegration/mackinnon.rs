//! MacKinnon approximate p-values and critical values for the residual-based
//! cointegration test with a constant in the cointegrating regression.
//!
//! p-values use the MacKinnon (1994) asymptotic response surfaces; critical
//! values use the finite-sample surfaces of MacKinnon (2010). Only the
//! two-variable case is tabulated since larger groups go through the rank
//! test instead.

use statrs::distribution::{ContinuousCDF, Normal};

/// Above this statistic the p-value is 1.
const TAU_MAX: f64 = 0.92;
/// Below this statistic the p-value is 0.
const TAU_MIN: f64 = -18.86;
/// Switch point between the small-p and large-p polynomials.
const TAU_STAR: f64 = -2.62;

const TAU_SMALLP: [f64; 3] = [2.92, 1.5012, 0.039796];
const TAU_LARGEP: [f64; 4] = [2.1945, 0.64695, -0.29198, -0.042377];

/// (1%, 5%, 10%) rows of b0 + b1/T + b2/T^2.
const TAU_2010: [[f64; 3]; 3] = [
    [-3.89644, -10.9519, -33.527],
    [-3.33613, -6.1101, -6.823],
    [-3.04445, -4.2412, -2.720],
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

pub fn pvalue(stat: f64) -> f64 {
    if stat.is_nan() {
        return f64::NAN;
    }
    if stat > TAU_MAX {
        return 1.0;
    }
    if stat < TAU_MIN {
        return 0.0;
    }

    let z = if stat <= TAU_STAR {
        polyval(&TAU_SMALLP, stat)
    } else {
        polyval(&TAU_LARGEP, stat)
    };
    standard_normal_cdf(z)
}

pub fn critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs.max(1) as f64;
    let row = |c: &[f64; 3]| polyval(c, inv);
    CriticalValues {
        one_pct: row(&TAU_2010[0]),
        five_pct: row(&TAU_2010[1]),
        ten_pct: row(&TAU_2010[2]),
    }
}

/// c0 + c1*x + c2*x^2 + ...
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn standard_normal_cdf(z: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(n) => n.cdf(z),
        Err(_) => f64::NAN,
    }
}
