//! Technical indicator implementations.
//!
//! Every indicator is an explicit accumulator folded left-to-right over the
//! bars: the value emitted for bar `i` is a function of the accumulator
//! built from bars `0..i` and bar `i` itself, never of anything later.
//!
//! - `IndicatorType`: indicator identity + parameters
//! - `Accumulator`: one step of the fold
//! - `IndicatorSeries`: the folded output, one `IndicatorPoint` per bar

pub mod atr;
pub mod ema;
pub mod log_return;
pub mod obv;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;

use crate::domain::ohlcv::{OhlcvBar, Timestamp};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: Timestamp,
    /// `None` while the indicator is still warming up.
    pub value: Option<f64>,
}

impl IndicatorPoint {
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Roc(usize),
    Stddev(usize),
    Obv,
    LogReturn,
}

impl IndicatorType {
    /// Number of bars (inclusive of the current one) needed for a valid value.
    /// Row `i` is valid iff `i + 1 >= window()`.
    pub fn window(&self) -> usize {
        match *self {
            IndicatorType::Sma(n)
            | IndicatorType::Ema(n)
            | IndicatorType::Atr(n)
            | IndicatorType::Stddev(n) => n.max(1),
            IndicatorType::Rsi(n) | IndicatorType::Roc(n) => n.max(1) + 1,
            IndicatorType::Obv => 1,
            IndicatorType::LogReturn => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }
}

/// One step of an indicator fold. `step` consumes the accumulator and
/// returns its successor together with the value for `bar`.
pub trait Accumulator: Sized {
    fn step(self, bar: &OhlcvBar) -> (Self, Option<f64>);
}

/// Fold `init` over `bars` in order, producing one point per bar.
pub fn fold_series<A: Accumulator>(
    bars: &[OhlcvBar],
    init: A,
    indicator_type: IndicatorType,
) -> IndicatorSeries {
    let mut acc = init;
    let mut values = Vec::with_capacity(bars.len());
    for bar in bars {
        let (next, value) = acc.step(bar);
        acc = next;
        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            value,
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

/// Compute a single indicator over `bars`.
pub fn calculate(bars: &[OhlcvBar], indicator_type: IndicatorType) -> IndicatorSeries {
    match indicator_type {
        IndicatorType::Sma(n) => sma::calculate_sma(bars, n),
        IndicatorType::Ema(n) => ema::calculate_ema(bars, n),
        IndicatorType::Rsi(n) => rsi::calculate_rsi(bars, n),
        IndicatorType::Atr(n) => atr::calculate_atr(bars, n),
        IndicatorType::Roc(n) => roc::calculate_roc(bars, n),
        IndicatorType::Stddev(n) => stddev::calculate_stddev(bars, n),
        IndicatorType::Obv => obv::calculate_obv(bars),
        IndicatorType::LogReturn => log_return::calculate_log_return(bars),
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::LogReturn => write!(f, "LOGRET"),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::{Duration, TimeZone, Utc};

    pub fn make_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }
}
