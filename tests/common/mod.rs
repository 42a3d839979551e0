#![allow(dead_code)]

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use statarb::domain::error::StatArbError;
use statarb::domain::price_series::PriceSeries;
use statarb::ports::data_port::DataPort;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.data.insert(series.name.clone(), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(&self, symbol: &str) -> Result<PriceSeries, StatArbError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StatArbError::Data {
                reason: reason.clone(),
            });
        }
        self.data.get(symbol).cloned().ok_or_else(|| StatArbError::Data {
            reason: format!("unknown symbol {symbol}"),
        })
    }

    fn list_symbols(&self) -> Result<Vec<String>, StatArbError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days starting 2020-01-01.
pub fn calendar(n: usize) -> Vec<NaiveDate> {
    let start = date(2020, 1, 1);
    (0..n)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect()
}

pub fn random_walk(seed: u64, n: usize, start: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let step = Normal::new(0.0, 1.0).unwrap();
    let mut level = start;
    (0..n)
        .map(|_| {
            level += step.sample(&mut rng);
            level
        })
        .collect()
}

pub fn add_noise(values: &[f64], seed: u64, sd: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sd).unwrap();
    values.iter().map(|v| v + noise.sample(&mut rng)).collect()
}

pub fn dated_series(name: &str, values: Vec<f64>) -> PriceSeries {
    PriceSeries::with_dates(name, calendar(values.len()), values).unwrap()
}

/// `x` a random walk around 100 and `y = 1.5 x + 20 + noise`.
pub fn cointegrated_pair(seed: u64, n: usize) -> (Vec<f64>, Vec<f64>) {
    let x = random_walk(seed, n, 100.0);
    let scaled: Vec<f64> = x.iter().map(|v| 1.5 * v + 20.0).collect();
    let y = add_noise(&scaled, seed.wrapping_add(1_000), 1.0);
    (x, y)
}

pub fn write_price_csv(dir: &Path, symbol: &str, values: &[f64]) {
    let mut content = String::from("date,open,close\n");
    for (d, v) in calendar(values.len()).iter().zip(values) {
        writeln!(content, "{},{:.6},{:.6}", d.format("%Y-%m-%d"), v, v).unwrap();
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
