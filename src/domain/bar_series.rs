//! Ordered, immutable bar series.
//!
//! A `BarSeries` can only be built from bars with strictly increasing
//! timestamps that each satisfy the OHLCV envelope. Everything downstream
//! (indicators, simulation) relies on that ordering.

use crate::domain::error::{OrderingError, TradelabError};
use crate::domain::ohlcv::{OhlcvBar, Timestamp};
use chrono::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    bars: Vec<OhlcvBar>,
}

impl BarSeries {
    pub fn new(bars: Vec<OhlcvBar>) -> Result<Self, TradelabError> {
        for (index, bar) in bars.iter().enumerate() {
            bar.validate()
                .map_err(|reason| TradelabError::InvalidBar { index, reason })?;
        }
        check_ordering(&bars, None)?;
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn get(&self, index: usize) -> Option<&OhlcvBar> {
        self.bars.get(index)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.bars.iter().map(|b| b.timestamp)
    }

    /// The first `len` bars as a new series. Any prefix of a valid series is valid.
    pub fn prefix(&self, len: usize) -> BarSeries {
        BarSeries {
            bars: self.bars[..len.min(self.bars.len())].to_vec(),
        }
    }
}

/// Verify strictly increasing timestamps and, when `max_gap` is set, that no
/// step between neighbours exceeds it.
pub fn check_ordering(bars: &[OhlcvBar], max_gap: Option<Duration>) -> Result<(), OrderingError> {
    for (i, pair) in bars.windows(2).enumerate() {
        let index = i + 1;
        let previous = pair[0].timestamp;
        let current = pair[1].timestamp;

        if current == previous {
            return Err(OrderingError::Duplicate {
                index,
                timestamp: current,
            });
        }
        if current < previous {
            return Err(OrderingError::Unordered {
                index,
                previous,
                current,
            });
        }
        if let Some(max_gap) = max_gap {
            let gap = current - previous;
            if gap > max_gap {
                return Err(OrderingError::Gap {
                    index,
                    gap,
                    max_gap,
                });
            }
        }
    }
    Ok(())
}
