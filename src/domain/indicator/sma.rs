//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{fold_series, Accumulator, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct SmaState {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl SmaState {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
        }
    }
}

impl Accumulator for SmaState {
    fn step(mut self, bar: &OhlcvBar) -> (Self, Option<f64>) {
        self.window.push_back(bar.close);
        self.sum += bar.close;
        if self.window.len() > self.period {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
            }
        }
        let value = (self.window.len() == self.period).then(|| self.sum / self.period as f64);
        (self, value)
    }
}

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    fold_series(bars, SmaState::new(period), IndicatorType::Sma(period))
}
