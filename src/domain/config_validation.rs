//! Application configuration: read from a `ConfigPort`, defaulted and
//! validated into the explicit values the core consumes.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TradelabError;
use crate::domain::execution::{ExecutionConfig, InsufficientFundsPolicy};
use crate::domain::features::FeatureConfig;
use crate::domain::metrics::ReportConfig;
use crate::domain::ohlcv::Timestamp;
use crate::ports::config_port::ConfigPort;
use chrono::{Duration, NaiveDate};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub dir: PathBuf,
    /// Explicit CSV file; overrides `<dir>/<symbol>.csv`.
    pub file: Option<PathBuf>,
    pub symbol: String,
    pub timeframe: String,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data: DataConfig,
    pub features: FeatureConfig,
    pub horizon_days: usize,
    pub backtest: BacktestConfig,
    pub model_path: Option<PathBuf>,
    pub report: ReportConfig,
    pub output_dir: PathBuf,
}

impl AppConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, TradelabError> {
        let data = DataConfig {
            dir: PathBuf::from(string_or(config, "data", "dir", "data")),
            file: config.get_string("data", "file").map(PathBuf::from),
            symbol: string_or(config, "data", "symbol", "SPY"),
            timeframe: string_or(config, "data", "timeframe", "D1"),
            start: date(config, "data", "start")?,
            end: date(config, "data", "end")?
                .map(|day| day + Duration::days(1) - Duration::nanoseconds(1)),
        };
        if let (Some(start), Some(end)) = (data.start, data.end) {
            if start > end {
                return Err(invalid("data", "start", "start must not be after end"));
            }
        }

        let mut features = FeatureConfig::standard(
            period(config, "rsi_period", 14)?,
            period(config, "ema_short", 20)?,
            period(config, "ema_long", 50)?,
            period(config, "atr_period", 14)?,
        );
        let default_gap = default_max_gap_days(&data.timeframe).unwrap_or(0);
        let max_gap_days = config.get_int("features", "max_gap_days", default_gap)?;
        if max_gap_days < 0 {
            return Err(invalid("features", "max_gap_days", "must be non-negative"));
        }
        // 0 turns the gap check off.
        if max_gap_days > 0 {
            features = features.with_max_gap(Duration::days(max_gap_days));
        }
        let horizon_days = period(config, "horizon_days", 5)?;

        let backtest = backtest_config(config)?;

        let report = ReportConfig {
            risk_free_rate: config.get_double("report", "risk_free_rate", 0.0)?,
            periods_per_year: config.get_double("report", "periods_per_year", 252.0)?,
        };
        if !(0.0..1.0).contains(&report.risk_free_rate) {
            return Err(invalid("report", "risk_free_rate", "must be in [0, 1)"));
        }
        if report.periods_per_year <= 0.0 {
            return Err(invalid("report", "periods_per_year", "must be positive"));
        }

        Ok(AppConfig {
            data,
            features,
            horizon_days,
            backtest,
            model_path: config.get_string("model", "path").map(PathBuf::from),
            report,
            output_dir: PathBuf::from(string_or(config, "report", "output_dir", "reports")),
        })
    }
}

fn backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TradelabError> {
    let initial_capital = config.get_double("backtest", "initial_capital", 100.0)?;
    if !(initial_capital > 0.0 && initial_capital.is_finite()) {
        return Err(invalid("backtest", "initial_capital", "must be positive"));
    }

    let commission_rate = config.get_double("backtest", "commission_rate", 0.001)?;
    if !(0.0..1.0).contains(&commission_rate) {
        return Err(invalid("backtest", "commission_rate", "must be in [0, 1)"));
    }

    let slippage_rate = config.get_double("backtest", "slippage", 0.0001)?;
    if !(0.0..1.0).contains(&slippage_rate) {
        return Err(invalid("backtest", "slippage", "must be in [0, 1)"));
    }

    let threshold = config.get_double("backtest", "threshold", 0.5)?;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(invalid("backtest", "threshold", "must be in [0, 1]"));
    }

    let position_size = config.get_double("backtest", "position_size", 1.0)?;
    if !(position_size > 0.0 && position_size <= 1.0) {
        return Err(invalid("backtest", "position_size", "must be in (0, 1]"));
    }

    let funds_policy = match config.get_string("backtest", "insufficient_funds") {
        None => InsufficientFundsPolicy::Clamp,
        Some(raw) => raw
            .parse()
            .map_err(|reason: String| invalid("backtest", "insufficient_funds", &reason))?,
    };

    Ok(BacktestConfig {
        initial_capital,
        threshold,
        allow_shorting: config.get_bool("backtest", "allow_shorting", false)?,
        close_at_end: config.get_bool("backtest", "close_at_end", true)?,
        execution: ExecutionConfig {
            commission_rate,
            slippage_rate,
            position_size,
            whole_units: config.get_bool("backtest", "whole_units", false)?,
            funds_policy,
        },
    })
}

fn invalid(section: &str, key: &str, reason: &str) -> TradelabError {
    TradelabError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn string_or(config: &dyn ConfigPort, section: &str, key: &str, default: &str) -> String {
    config
        .get_string(section, key)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Largest calendar gap tolerated between consecutive bars of a timeframe
/// before data is treated as missing. Covers weekends and market holidays.
pub fn default_max_gap_days(timeframe: &str) -> Option<i64> {
    match timeframe.trim().to_ascii_uppercase().as_str() {
        "D1" => Some(7),
        "W1" => Some(21),
        "MN1" | "MN" => Some(62),
        tf if (tf.starts_with('H') || tf.starts_with('M'))
            && tf.len() > 1
            && tf[1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            Some(5)
        }
        _ => None,
    }
}

fn period(config: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, TradelabError> {
    let value = config.get_int("features", key, default)?;
    if value < 1 {
        return Err(invalid("features", key, "must be at least 1"));
    }
    Ok(value as usize)
}

fn date(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<Timestamp>, TradelabError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    let day = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(section, key, "expected YYYY-MM-DD"))?;
    Ok(day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()))
}
