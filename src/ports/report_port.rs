//! Report output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradelabError;
use crate::domain::metrics::Summary;
use std::path::Path;

/// Port for persisting a finished run.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        summary: &Summary,
        output_dir: &Path,
    ) -> Result<(), TradelabError>;
}
