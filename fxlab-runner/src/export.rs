//! Artifact export: JSON for structured results, CSV for trade and equity
//! logs that spreadsheets can open directly.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use fxlab_core::domain::TradeRecord;
use fxlab_core::engine::EquityPoint;

use crate::fitness::FitnessResult;
use crate::optimizer::EvolveOutcome;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot serialize {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot write csv {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), value).map_err(|source| {
        ExportError::Json {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path).map_err(|source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    for row in rows {
        writer.serialize(row).map_err(|source| ExportError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_trades_csv(path: &Path, trades: &[TradeRecord]) -> Result<(), ExportError> {
    write_csv(path, trades)
}

pub fn write_equity_csv(path: &Path, curve: &[EquityPoint]) -> Result<(), ExportError> {
    write_csv(path, curve)
}

/// Write one run's artifacts into `dir`: `result.json` (fitness, metrics,
/// rejections, flags), `trades.csv`, `equity.csv`.
pub fn export_run(dir: &Path, result: &FitnessResult) -> Result<(), ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    write_json(&dir.join("result.json"), result)?;
    write_trades_csv(&dir.join("trades.csv"), &result.trades)?;
    write_equity_csv(&dir.join("equity.csv"), &result.equity_curve)?;
    Ok(())
}

/// Write an evolve run's artifacts: per-generation `history.json` plus the
/// best genome's full run under `best/`.
pub fn export_evolution(dir: &Path, outcome: &EvolveOutcome) -> Result<(), ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    write_json(&dir.join("history.json"), &outcome.history)?;
    export_run(&dir.join("best"), &outcome.best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use fxlab_core::domain::{Direction, ExitReason};
    use fxlab_core::engine::ConstraintFlags;
    use fxlab_core::strategy::{Genome, TemplateId};
    use tempfile::tempdir;

    fn sample_result() -> FitnessResult {
        let t = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        FitnessResult {
            genome: Genome::default_for(TemplateId::MaCrossover),
            fitness: 0.42,
            metrics: None,
            equity_curve: vec![EquityPoint {
                timestamp: t,
                balance: 10_000.0,
                equity: 10_010.0,
                drawdown: 0.0,
            }],
            trades: vec![TradeRecord {
                position_id: 1,
                instrument: "EURUSD".into(),
                direction: Direction::Long,
                size: 10_000.0,
                entry_time: t,
                entry_price: 1.1000,
                exit_time: t + Duration::hours(2),
                exit_price: 1.1010,
                net_pnl: 10.0,
                exit_reason: ExitReason::TakeProfit,
            }],
            rejections: Vec::new(),
            violations: ConstraintFlags::default(),
            failed: false,
            config_hash: "abc".into(),
        }
    }

    #[test]
    fn export_run_writes_all_artifacts() {
        let dir = tempdir().unwrap();
        export_run(dir.path(), &sample_result()).unwrap();

        let json = fs::read_to_string(dir.path().join("result.json")).unwrap();
        assert!(json.contains("\"fitness\": 0.42"));

        let trades = fs::read_to_string(dir.path().join("trades.csv")).unwrap();
        assert!(trades.lines().count() >= 2); // header + one trade
        assert!(trades.contains("EURUSD"));

        let equity = fs::read_to_string(dir.path().join("equity.csv")).unwrap();
        assert!(equity.contains("10010"));
    }

    #[test]
    fn exported_result_json_parses_back() {
        let dir = tempdir().unwrap();
        let result = sample_result();
        export_run(dir.path(), &result).unwrap();
        let text = fs::read_to_string(dir.path().join("result.json")).unwrap();
        let back: FitnessResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result);
    }
}
