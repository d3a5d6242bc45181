//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are invalid (need n price changes to compute initial average).

use crate::domain::indicator::{fold_series, Accumulator, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct RsiState {
    period: usize,
    prev_close: Option<f64>,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_close: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

impl Accumulator for RsiState {
    fn step(self, bar: &OhlcvBar) -> (Self, Option<f64>) {
        let Some(prev_close) = self.prev_close else {
            return (
                Self {
                    prev_close: Some(bar.close),
                    ..self
                },
                None,
            );
        };

        let change = bar.close - prev_close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let changes = self.changes + 1;
        let n = self.period as f64;

        let (avg_gain, avg_loss) = if changes <= self.period {
            // Running sums until the seed average is complete.
            (self.avg_gain + gain, self.avg_loss + loss)
        } else {
            (
                (self.avg_gain * (n - 1.0) + gain) / n,
                (self.avg_loss * (n - 1.0) + loss) / n,
            )
        };

        let (avg_gain, avg_loss, value) = if changes < self.period {
            (avg_gain, avg_loss, None)
        } else if changes == self.period {
            let (g, l) = (avg_gain / n, avg_loss / n);
            (g, l, Some(rsi_value(g, l)))
        } else {
            (avg_gain, avg_loss, Some(rsi_value(avg_gain, avg_loss)))
        };

        let next = Self {
            prev_close: Some(bar.close),
            changes,
            avg_gain,
            avg_loss,
            ..self
        };
        (next, value)
    }
}

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    fold_series(bars, RsiState::new(period), IndicatorType::Rsi(period))
}
