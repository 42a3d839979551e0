//! CSV price history adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a header row. The `date`
//! (YYYY-MM-DD) and `close` columns are located by name; other columns are
//! ignored.

use crate::domain::error::StatArbError;
use crate::domain::price_series::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, StatArbError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| StatArbError::Data {
            reason: format!("missing {name} column"),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_closes(&self, symbol: &str) -> Result<PriceSeries, StatArbError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| StatArbError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| StatArbError::Data {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let date_col = column_index(&headers, "date")?;
        let close_col = column_index(&headers, "close")?;

        let mut rows: Vec<(NaiveDate, f64)> = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| StatArbError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| StatArbError::Data {
                reason: format!("{symbol} row {}: invalid date '{date_str}': {e}", line + 1),
            })?;

            let close_str = record.get(close_col).unwrap_or_default().trim();
            let close: f64 = close_str.parse().map_err(|e| StatArbError::Data {
                reason: format!("{symbol} row {}: invalid close '{close_str}': {e}", line + 1),
            })?;

            rows.push((date, close));
        }

        rows.sort_by_key(|(date, _)| *date);
        let (dates, values) = rows.into_iter().unzip();
        PriceSeries::with_dates(symbol, dates, values)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StatArbError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StatArbError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
