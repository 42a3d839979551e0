//! Price series and aligned clusters.
//!
//! A cluster is an immutable group of 2..N equally long series sharing one
//! time index. Alignment is done up front by [`align_series`]; the engine
//! never fills gaps itself.

use crate::domain::error::StatArbError;
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub const MIN_CLUSTER_SIZE: usize = 2;
/// Largest cluster the multivariate critical value tables cover.
pub const MAX_SUPPORTED_ASSETS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub name: String,
    /// Empty for synthetic series without a calendar.
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl PriceSeries {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            dates: Vec::new(),
            values,
        }
    }

    pub fn with_dates(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
    ) -> Result<Self, StatArbError> {
        let name = name.into();
        if dates.len() != values.len() {
            return Err(StatArbError::Data {
                reason: format!(
                    "{} has {} dates but {} prices",
                    name,
                    dates.len(),
                    values.len()
                ),
            });
        }
        Ok(Self {
            name,
            dates,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

#[derive(Debug, Clone)]
pub struct Cluster {
    series: Vec<PriceSeries>,
}

impl Cluster {
    pub fn new(series: Vec<PriceSeries>) -> Result<Self, StatArbError> {
        if series.len() < MIN_CLUSTER_SIZE || series.len() > MAX_SUPPORTED_ASSETS {
            return Err(StatArbError::InvalidClusterSize {
                size: series.len(),
                min: MIN_CLUSTER_SIZE,
                max: MAX_SUPPORTED_ASSETS,
            });
        }

        let expected = series[0].len();
        if let Some(bad) = series.iter().find(|s| s.len() != expected) {
            return Err(StatArbError::insufficient(
                format!("{} aligned with {}", bad.name, series[0].name),
                bad.len(),
                expected,
            ));
        }

        Ok(Self { series })
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Number of observations per asset.
    pub fn observations(&self) -> usize {
        self.series[0].len()
    }

    pub fn series(&self) -> &[PriceSeries] {
        &self.series
    }

    pub fn columns(&self) -> Vec<&[f64]> {
        self.series.iter().map(|s| s.values.as_slice()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Restrict every series to the dates present in all of them.
pub fn align_series(series: &[PriceSeries]) -> Vec<PriceSeries> {
    let Some(first) = series.first() else {
        return Vec::new();
    };

    let mut common: BTreeSet<NaiveDate> = first.dates.iter().copied().collect();
    for s in &series[1..] {
        let dates: BTreeSet<NaiveDate> = s.dates.iter().copied().collect();
        common = common.intersection(&dates).copied().collect();
    }

    series
        .iter()
        .map(|s| {
            let (dates, values) = s
                .dates
                .iter()
                .zip(&s.values)
                .filter(|(d, _)| common.contains(d))
                .map(|(d, v)| (*d, *v))
                .unzip();
            PriceSeries {
                name: s.name.clone(),
                dates,
                values,
            }
        })
        .collect()
}
