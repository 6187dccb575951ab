//! CSV bar loading.
//!
//! Bars arrive as one CSV per instrument/timeframe with a
//! `timestamp,open,high,low,close,volume` header. Timestamps are UTC,
//! either RFC 3339 or `YYYY-MM-DD HH:MM:SS`. Validation is delegated to
//! `BarSeries::new`, so malformed or out-of-order data fails the load
//! rather than the run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use fxlab_core::domain::{Bar, Timeframe};
use fxlab_core::store::{BarSeries, BarStore, DataError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("csv error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("row {row}: unparseable timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },
    #[error("{path} contains no bars in the requested window")]
    Empty { path: PathBuf },
    #[error(transparent)]
    Data(#[from] DataError),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Load one timeframe's bars from a CSV file, optionally windowed by date.
pub fn load_series(
    path: &Path,
    timeframe: Timeframe,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<BarSeries, LoadError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let mut bars = Vec::new();
    for (row, record) in reader.deserialize::<CsvRow>().enumerate() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let timestamp =
            parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::BadTimestamp {
                row: row + 1,
                value: record.timestamp.clone(),
            })?;
        let date = timestamp.date_naive();
        if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
            continue;
        }
        bars.push(Bar {
            timestamp,
            timeframe,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    if bars.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(BarSeries::new(timeframe, bars)?)
}

/// Load the finest series from CSV and derive the requested higher
/// timeframes by resampling, so multi-timeframe consistency holds by
/// construction.
pub fn load_store(
    path: &Path,
    instrument: &str,
    base: Timeframe,
    derive: &[Timeframe],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<BarStore, LoadError> {
    let series = load_series(path, base, start, end)?;
    let mut store = BarStore::new(instrument, series);
    for &timeframe in derive {
        if timeframe != base {
            store.derive(timeframe)?;
        }
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file
    }

    #[test]
    fn loads_h1_bars_from_csv() {
        let file = write_csv(&[
            "2024-03-04 00:00:00,1.1000,1.1010,1.0990,1.1005,120",
            "2024-03-04 01:00:00,1.1005,1.1020,1.1000,1.1015,95",
        ]);
        let series = load_series(file.path(), Timeframe::H1, None, None).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[1].close, 1.1015);
    }

    #[test]
    fn accepts_rfc3339_timestamps() {
        let file = write_csv(&["2024-03-04T00:00:00Z,1.1,1.2,1.0,1.15,10"]);
        let series = load_series(file.path(), Timeframe::H1, None, None).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let file = write_csv(&["yesterday,1.1,1.2,1.0,1.15,10"]);
        let err = load_series(file.path(), Timeframe::H1, None, None).unwrap_err();
        assert!(matches!(err, LoadError::BadTimestamp { row: 1, .. }));
    }

    #[test]
    fn rejects_out_of_order_rows() {
        let file = write_csv(&[
            "2024-03-04 01:00:00,1.1,1.2,1.0,1.15,10",
            "2024-03-04 00:00:00,1.1,1.2,1.0,1.15,10",
        ]);
        let err = load_series(file.path(), Timeframe::H1, None, None).unwrap_err();
        assert!(matches!(err, LoadError::Data(DataError::OutOfOrder { .. })));
    }

    #[test]
    fn window_filter_applies_and_empty_window_errors() {
        let file = write_csv(&[
            "2024-03-04 00:00:00,1.1,1.2,1.0,1.15,10",
            "2024-03-05 00:00:00,1.1,1.2,1.0,1.15,10",
        ]);
        let series = load_series(
            file.path(),
            Timeframe::H1,
            NaiveDate::from_ymd_opt(2024, 3, 5),
            None,
        )
        .unwrap();
        assert_eq!(series.len(), 1);

        let err = load_series(
            file.path(),
            Timeframe::H1,
            NaiveDate::from_ymd_opt(2025, 1, 1),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }

    #[test]
    fn load_store_derives_higher_timeframes() {
        let rows: Vec<String> = (0..8)
            .map(|i| format!("2024-03-04 0{i}:00:00,1.10,1.11,1.09,1.105,10"))
            .collect();
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let file = write_csv(&refs);
        let store = load_store(
            file.path(),
            "EURUSD",
            Timeframe::H1,
            &[Timeframe::H4],
            None,
            None,
        )
        .unwrap();
        assert!(store.timeframes().any(|tf| tf == Timeframe::H4));
        assert_eq!(store.series(Timeframe::H4).unwrap().len(), 2);
    }
}
