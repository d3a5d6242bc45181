//! Data access port trait.

use crate::domain::error::TradelabError;
use crate::domain::ohlcv::{OhlcvBar, Timestamp};

pub trait DataPort {
    /// Bars for `symbol` within the inclusive bounds, in chronological order.
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<Vec<OhlcvBar>, TradelabError>;
}
