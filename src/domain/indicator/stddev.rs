//! Standard Deviation indicator.
//!
//! Population standard deviation over n closing prices.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{fold_series, Accumulator, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct StddevState {
    period: usize,
    closes: VecDeque<f64>,
}

impl StddevState {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            closes: VecDeque::with_capacity(period + 1),
        }
    }
}

impl Accumulator for StddevState {
    fn step(mut self, bar: &OhlcvBar) -> (Self, Option<f64>) {
        self.closes.push_back(bar.close);
        if self.closes.len() > self.period {
            self.closes.pop_front();
        }
        if self.closes.len() < self.period {
            return (self, None);
        }

        let n = self.period as f64;
        let mean = self.closes.iter().sum::<f64>() / n;
        let variance = self
            .closes
            .iter()
            .map(|c| {
                let diff = c - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;
        (self, Some(variance.sqrt()))
    }
}

pub fn calculate_stddev(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    fold_series(bars, StddevState::new(period), IndicatorType::Stddev(period))
}
