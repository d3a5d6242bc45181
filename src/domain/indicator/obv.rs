//! OBV (On-Balance Volume) indicator implementation.

use crate::domain::indicator::{fold_series, Accumulator, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObvState {
    prev_close: Option<f64>,
    obv: f64,
}

impl Accumulator for ObvState {
    /// OBV[0] = volume[0]; then add volume on up closes, subtract on down
    /// closes, carry forward on unchanged closes. No warmup.
    fn step(self, bar: &OhlcvBar) -> (Self, Option<f64>) {
        let obv = match self.prev_close {
            None => bar.volume,
            Some(prev) if bar.close > prev => self.obv + bar.volume,
            Some(prev) if bar.close < prev => self.obv - bar.volume,
            Some(_) => self.obv,
        };
        let next = ObvState {
            prev_close: Some(bar.close),
            obv,
        };
        (next, Some(obv))
    }
}

pub fn calculate_obv(bars: &[OhlcvBar]) -> IndicatorSeries {
    fold_series(bars, ObvState::default(), IndicatorType::Obv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn obv_tracks_direction() {
        let series = calculate_obv(&make_bars(&[10.0, 11.0, 11.0, 9.0]));
        assert_eq!(series.value_at(0), Some(1000.0));
        assert_eq!(series.value_at(1), Some(2000.0));
        assert_eq!(series.value_at(2), Some(2000.0));
        assert_eq!(series.value_at(3), Some(1000.0));
    }

    #[test]
    fn obv_indicator_type() {
        assert_eq!(calculate_obv(&[]).indicator_type, IndicatorType::Obv);
    }
}
