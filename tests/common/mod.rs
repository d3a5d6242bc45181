#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;
use tradelab::domain::bar_series::BarSeries;
use tradelab::domain::error::TradelabError;
pub use tradelab::domain::ohlcv::{OhlcvBar, Timestamp};
use tradelab::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<Vec<OhlcvBar>, TradelabError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradelabError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| start.is_none_or(|s| b.timestamp >= s))
            .filter(|b| end.is_none_or(|e| b.timestamp <= e))
            .collect())
    }
}

/// Midnight UTC on the `n`th day of January 2024 (1-based).
pub fn day(n: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n - 1)
}

pub fn make_bar(n: i64, open: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: day(n),
        open,
        high: open.max(close) + 1.0,
        low: open.min(close) - 1.0,
        close,
        volume: 1_000.0,
    }
}

/// Daily bars with `open == close`, starting on day 1.
pub fn flat_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i as i64 + 1, c, c))
        .collect()
}

/// Daily bars that open at the previous close.
pub fn gapless_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let open = if i == 0 { c } else { closes[i - 1] };
            make_bar(i as i64 + 1, open, c)
        })
        .collect()
}

pub fn make_series(closes: &[f64]) -> BarSeries {
    BarSeries::new(gapless_bars(closes)).unwrap()
}

/// 20 daily bars: close 100 through day 14, 110 from day 15.
pub fn step_scenario() -> BarSeries {
    let closes: Vec<f64> = (1..=20).map(|d| if d < 15 { 100.0 } else { 110.0 }).collect();
    BarSeries::new(flat_bars(&closes)).unwrap()
}
