//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{fold_series, Accumulator, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct EmaState {
    period: usize,
    k: f64,
    seen: usize,
    sum: f64,
    ema: f64,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            seen: 0,
            sum: 0.0,
            ema: 0.0,
        }
    }
}

impl Accumulator for EmaState {
    fn step(self, bar: &OhlcvBar) -> (Self, Option<f64>) {
        let seen = self.seen + 1;
        if seen < self.period {
            let next = Self {
                seen,
                sum: self.sum + bar.close,
                ..self
            };
            (next, None)
        } else if seen == self.period {
            let ema = (self.sum + bar.close) / self.period as f64;
            (Self { seen, ema, ..self }, Some(ema))
        } else {
            let ema = bar.close * self.k + self.ema * (1.0 - self.k);
            (Self { seen, ema, ..self }, Some(ema))
        }
    }
}

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    fold_series(bars, EmaState::new(period), IndicatorType::Ema(period))
}
