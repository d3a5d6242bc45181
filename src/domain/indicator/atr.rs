//! Average True Range indicator.
//!
//! TR[0] = high - low, TR[i] = true_range(prev_close). Seed with the mean of
//! the first n TRs, then Wilder smoothing: ATR[i] = (ATR[i-1]*(n-1) + TR[i]) / n.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{fold_series, Accumulator, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct AtrState {
    period: usize,
    prev_close: Option<f64>,
    seen: usize,
    tr_sum: f64,
    atr: f64,
}

impl AtrState {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_close: None,
            seen: 0,
            tr_sum: 0.0,
            atr: 0.0,
        }
    }
}

impl Accumulator for AtrState {
    fn step(self, bar: &OhlcvBar) -> (Self, Option<f64>) {
        let tr = match self.prev_close {
            Some(prev) => bar.true_range(prev),
            None => bar.high - bar.low,
        };
        let seen = self.seen + 1;
        let n = self.period as f64;
        let prev_close = Some(bar.close);

        if seen < self.period {
            let next = Self {
                prev_close,
                seen,
                tr_sum: self.tr_sum + tr,
                ..self
            };
            (next, None)
        } else if seen == self.period {
            let atr = (self.tr_sum + tr) / n;
            (Self { prev_close, seen, atr, ..self }, Some(atr))
        } else {
            let atr = (self.atr * (n - 1.0) + tr) / n;
            (Self { prev_close, seen, atr, ..self }, Some(atr))
        }
    }
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    fold_series(bars, AtrState::new(period), IndicatorType::Atr(period))
}
