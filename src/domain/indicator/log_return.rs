//! One-bar logarithmic close-to-close return: ln(C[i] / C[i-1]).
//! Warmup: first bar is invalid. Non-positive closes yield 0.

use crate::domain::indicator::{fold_series, Accumulator, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogReturnState {
    prev_close: Option<f64>,
}

impl Accumulator for LogReturnState {
    fn step(self, bar: &OhlcvBar) -> (Self, Option<f64>) {
        let value = self.prev_close.map(|prev| {
            if prev > 0.0 && bar.close > 0.0 {
                (bar.close / prev).ln()
            } else {
                0.0
            }
        });
        (
            LogReturnState {
                prev_close: Some(bar.close),
            },
            value,
        )
    }
}

pub fn calculate_log_return(bars: &[OhlcvBar]) -> IndicatorSeries {
    fold_series(bars, LogReturnState::default(), IndicatorType::LogReturn)
}
