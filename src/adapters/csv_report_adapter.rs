//! CSV/JSON report writer.
//!
//! A run directory gets `equity.csv`, `trades.csv`, `fills.csv` and
//! `summary.json`. Feature exports go to a single CSV with one column per
//! indicator and a trailing `target` label column.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradelabError;
use crate::domain::features::FeatureFrame;
use crate::domain::metrics::Summary;
use crate::domain::ohlcv::Timestamp;
use crate::domain::position::{FillNote, FillReason};
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    pub fn write_features(
        &self,
        frame: &FeatureFrame,
        labels: &[Option<bool>],
        path: &Path,
    ) -> Result<(), TradelabError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;

        let mut header = vec!["timestamp".to_string()];
        header.extend(frame.names().iter().cloned());
        header.push("target".to_string());
        wtr.write_record(&header).map_err(csv_err)?;

        for (i, row) in frame.rows().iter().enumerate() {
            let mut record = vec![row.timestamp.to_rfc3339()];
            record.extend(
                frame
                    .names()
                    .iter()
                    .map(|name| row.get(name).map(|v| v.to_string()).unwrap_or_default()),
            );
            record.push(match labels.get(i).copied().flatten() {
                Some(true) => "1".to_string(),
                Some(false) => "0".to_string(),
                None => String::new(),
            });
            wtr.write_record(&record).map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn csv_err(e: csv::Error) -> TradelabError {
    TradelabError::Io(std::io::Error::other(e))
}

#[derive(Serialize)]
struct FillRow {
    timestamp: Timestamp,
    price: f64,
    requested_quantity: f64,
    quantity: f64,
    commission: f64,
    cash_after: f64,
    position_after: f64,
    reason: FillReason,
    note: &'static str,
}

fn note_label(note: Option<FillNote>) -> &'static str {
    match note {
        None => "",
        Some(FillNote::Clamped { .. }) => "clamped",
        Some(FillNote::Rejected { .. }) => "rejected",
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<(), TradelabError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        summary: &Summary,
        output_dir: &Path,
    ) -> Result<(), TradelabError> {
        fs::create_dir_all(output_dir)?;

        write_rows(&output_dir.join("equity.csv"), result.equity_curve())?;
        write_rows(&output_dir.join("trades.csv"), result.trades())?;
        write_rows(
            &output_dir.join("fills.csv"),
            result.fills().iter().map(|f| FillRow {
                timestamp: f.timestamp,
                price: f.price,
                requested_quantity: f.requested_quantity,
                quantity: f.quantity,
                commission: f.commission,
                cash_after: f.cash_after,
                position_after: f.position_after,
                reason: f.reason,
                note: note_label(f.note),
            }),
        )?;

        let json = serde_json::to_string_pretty(summary)
            .map_err(|e| TradelabError::Io(std::io::Error::other(e)))?;
        fs::write(output_dir.join("summary.json"), json)?;

        log::info!("report written to {}", output_dir.display());
        Ok(())
    }
}
