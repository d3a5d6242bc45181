//! Feature frames and the indicator engine.
//!
//! `IndicatorEngine::compute` turns a `BarSeries` into a `FeatureFrame`
//! with one `FeatureRow` per bar. Each indicator keeps its own warm-up:
//! a row holds `None` for an indicator until that indicator's window is
//! filled.

use crate::domain::bar_series::{check_ordering, BarSeries};
use crate::domain::error::TradelabError;
use crate::domain::indicator::{self, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::Timestamp;
use chrono::Duration;
use std::collections::BTreeMap;

/// A named indicator column.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorDef {
    pub name: String,
    pub kind: IndicatorType,
}

impl IndicatorDef {
    pub fn new(name: impl Into<String>, kind: IndicatorType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Column named after the indicator itself, e.g. `RSI(14)`.
    pub fn of(kind: IndicatorType) -> Self {
        Self::new(kind.to_string(), kind)
    }

    pub fn window(&self) -> usize {
        self.kind.window()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    pub indicators: Vec<IndicatorDef>,
    /// Largest tolerated step between consecutive bars. `None` disables the check.
    pub max_gap: Option<Duration>,
}

impl FeatureConfig {
    pub fn new(indicators: Vec<IndicatorDef>) -> Self {
        Self {
            indicators,
            max_gap: None,
        }
    }

    /// RSI, short/long EMA, ATR and a one-bar log return.
    pub fn standard(rsi_period: usize, ema_short: usize, ema_long: usize, atr_period: usize) -> Self {
        Self::new(vec![
            IndicatorDef::new("rsi", IndicatorType::Rsi(rsi_period)),
            IndicatorDef::new("ema_short", IndicatorType::Ema(ema_short)),
            IndicatorDef::new("ema_long", IndicatorType::Ema(ema_long)),
            IndicatorDef::new("atr", IndicatorType::Atr(atr_period)),
            IndicatorDef::new("log_return", IndicatorType::LogReturn),
        ])
    }

    pub fn with_max_gap(mut self, max_gap: Duration) -> Self {
        self.max_gap = Some(max_gap);
        self
    }

    /// Bars needed before every indicator is valid.
    pub fn max_window(&self) -> usize {
        self.indicators.iter().map(IndicatorDef::window).max().unwrap_or(1)
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self::standard(14, 20, 50, 14)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub timestamp: Timestamp,
    pub values: BTreeMap<String, Option<f64>>,
}

impl FeatureRow {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().flatten()
    }

    /// True once every indicator in the row has left its warm-up.
    pub fn is_complete(&self) -> bool {
        self.values.values().all(Option::is_some)
    }

    /// Values in the requested order; `Err(name)` names the first missing one.
    pub fn vector(&self, names: &[String]) -> Result<Vec<f64>, String> {
        names
            .iter()
            .map(|name| self.get(name).ok_or_else(|| name.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    names: Vec<String>,
    rows: Vec<FeatureRow>,
    warmup: usize,
}

impl FeatureFrame {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&FeatureRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first row in which every indicator is valid.
    pub fn warmup(&self) -> usize {
        self.warmup
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: FeatureConfig,
}

impl IndicatorEngine {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn compute(&self, series: &BarSeries) -> Result<FeatureFrame, TradelabError> {
        let bars = series.bars();
        check_ordering(bars, self.config.max_gap)?;

        let required = self.config.max_window();
        if bars.len() < required {
            return Err(TradelabError::InsufficientWarmup {
                bars: bars.len(),
                required,
            });
        }

        let columns: Vec<(&IndicatorDef, IndicatorSeries)> = self
            .config
            .indicators
            .iter()
            .map(|def| (def, indicator::calculate(bars, def.kind)))
            .collect();

        let rows = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| FeatureRow {
                timestamp: bar.timestamp,
                values: columns
                    .iter()
                    .map(|(def, series)| (def.name.clone(), series.value_at(i)))
                    .collect(),
            })
            .collect();

        log::debug!(
            "computed {} indicators over {} bars (warm-up {})",
            columns.len(),
            bars.len(),
            required - 1
        );

        Ok(FeatureFrame {
            names: self.config.indicators.iter().map(|d| d.name.clone()).collect(),
            rows,
            warmup: required - 1,
        })
    }
}
