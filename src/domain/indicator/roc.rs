//! ROC (Rate of Change) indicator implementation.
//!
//! ROC(n)[i] = ((C[i] - C[i-n]) / C[i-n]) * 100
//! If C[i-n] == 0: ROC = 0
//! Warmup: first n bars invalid.

use crate::domain::indicator::{fold_series, Accumulator, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct RocState {
    period: usize,
    closes: VecDeque<f64>,
}

impl RocState {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            closes: VecDeque::with_capacity(period + 1),
        }
    }
}

impl Accumulator for RocState {
    fn step(mut self, bar: &OhlcvBar) -> (Self, Option<f64>) {
        self.closes.push_back(bar.close);
        if self.closes.len() > self.period + 1 {
            self.closes.pop_front();
        }
        let value = if self.closes.len() == self.period + 1 {
            let prev_close = self.closes[0];
            Some(if prev_close == 0.0 {
                0.0
            } else {
                ((bar.close - prev_close) / prev_close) * 100.0
            })
        } else {
            None
        };
        (self, value)
    }
}

pub fn calculate_roc(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    fold_series(bars, RocState::new(period), IndicatorType::Roc(period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn roc_basic() {
        let series = calculate_roc(&make_bars(&[100.0, 105.0, 110.0, 99.0]), 2);
        assert_eq!(series.value_at(1), None);
        assert!((series.value_at(2).unwrap() - 10.0).abs() < 1e-9);
        // (99 - 105) / 105 * 100
        assert!((series.value_at(3).unwrap() - (-6.0 / 105.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn roc_zero_base() {
        let series = calculate_roc(&make_bars(&[0.0, 5.0]), 1);
        assert_eq!(series.value_at(1), Some(0.0));
    }
}
