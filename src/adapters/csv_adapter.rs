//! CSV file data adapter.
//!
//! Reads `<base>/<SYMBOL>.csv`, or a single explicit file. The timestamp
//! column may be named `time`, `date` or `Date`; price columns are matched
//! case-insensitively. Rows are sorted chronologically but otherwise passed
//! through untouched, so duplicates still reach `BarSeries` validation.

use crate::domain::error::TradelabError;
use crate::domain::ohlcv::{OhlcvBar, Timestamp};
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

const TIME_COLUMNS: [&str; 3] = ["time", "date", "Date"];

pub struct CsvAdapter {
    base_path: PathBuf,
    file: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            file: None,
        }
    }

    /// Serve every symbol from one file.
    pub fn with_file(file: PathBuf) -> Self {
        Self {
            base_path: file.parent().map(Path::to_path_buf).unwrap_or_default(),
            file: Some(file),
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        match &self.file {
            Some(file) => file.clone(),
            None => self.base_path.join(format!("{symbol}.csv")),
        }
    }
}

fn data_err(reason: impl Into<String>) -> TradelabError {
    TradelabError::Data {
        reason: reason.into(),
    }
}

pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, TradelabError> {
        let time = TIME_COLUMNS
            .iter()
            .find_map(|name| headers.iter().position(|h| h.trim() == *name))
            .ok_or_else(|| data_err("no time column (expected time, date or Date)"))?;
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| data_err(format!("missing {name} column")))
        };
        Ok(Columns {
            time,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            volume: find("volume").ok(),
        })
    }
}

fn field(record: &csv::StringRecord, index: usize, name: &str, line: usize) -> Result<f64, TradelabError> {
    let raw = record
        .get(index)
        .ok_or_else(|| data_err(format!("line {line}: missing {name}")))?;
    raw.trim()
        .parse()
        .map_err(|e| data_err(format!("line {line}: invalid {name} '{raw}': {e}")))
}

pub fn read_bars(path: &Path) -> Result<Vec<OhlcvBar>, TradelabError> {
    let content = fs::read_to_string(path)
        .map_err(|e| data_err(format!("failed to read {}: {}", path.display(), e)))?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| data_err(format!("CSV header error: {e}")))?
        .clone();
    let columns = Columns::locate(&headers)?;

    let mut bars = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = result.map_err(|e| data_err(format!("CSV parse error: {e}")))?;
        let raw_time = record.get(columns.time).unwrap_or_default();
        let timestamp = parse_timestamp(raw_time)
            .ok_or_else(|| data_err(format!("line {line}: invalid timestamp '{raw_time}'")))?;

        bars.push(OhlcvBar {
            timestamp,
            open: field(&record, columns.open, "open", line)?,
            high: field(&record, columns.high, "high", line)?,
            low: field(&record, columns.low, "low", line)?,
            close: field(&record, columns.close, "close", line)?,
            volume: match columns.volume {
                Some(index) => field(&record, index, "volume", line)?,
                None => 0.0,
            },
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    log::debug!("read {} bars from {}", bars.len(), path.display());
    Ok(bars)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<Vec<OhlcvBar>, TradelabError> {
        let mut bars = read_bars(&self.csv_path(symbol))?;
        bars.retain(|b| {
            start.is_none_or(|s| b.timestamp >= s) && end.is_none_or(|e| b.timestamp <= e)
        });
        Ok(bars)
    }
}
