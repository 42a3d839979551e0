//! Price history port trait.

use crate::domain::error::StatArbError;
use crate::domain::price_series::{Cluster, PriceSeries, align_series};
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for one symbol, oldest first.
    fn fetch_closes(&self, symbol: &str) -> Result<PriceSeries, StatArbError>;

    fn list_symbols(&self) -> Result<Vec<String>, StatArbError>;

    /// First date, last date and bar count, or `None` for an empty history.
    fn data_range(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StatArbError> {
        let series = self.fetch_closes(symbol)?;
        Ok(series
            .first_date()
            .zip(series.last_date())
            .map(|(first, last)| (first, last, series.len())))
    }

    /// Fetch every symbol and restrict them to their common dates.
    fn fetch_cluster(&self, symbols: &[String]) -> Result<Cluster, StatArbError> {
        let series = symbols
            .iter()
            .map(|s| self.fetch_closes(s))
            .collect::<Result<Vec<_>, _>>()?;
        Cluster::new(align_series(&series))
    }
}
