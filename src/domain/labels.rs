//! Forward-looking direction labels for training datasets.
//!
//! These look ahead by construction and are only written alongside exported
//! features. The simulator never reads them.

use crate::domain::bar_series::BarSeries;

/// `Some(true)` when the close `horizon` bars ahead is above the current
/// close. The last `horizon` rows have no future and are `None`.
pub fn direction_labels(series: &BarSeries, horizon: usize) -> Vec<Option<bool>> {
    let bars = series.bars();
    if horizon == 0 {
        return vec![None; bars.len()];
    }
    (0..bars.len())
        .map(|i| bars.get(i + horizon).map(|ahead| ahead.close > bars[i].close))
        .collect()
}
