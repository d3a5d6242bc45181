//! Threshold sweeps: independent backtests run in parallel.

use rayon::prelude::*;

use crate::domain::backtest::{run_backtest, BacktestConfig};
use crate::domain::bar_series::BarSeries;
use crate::domain::error::TradelabError;
use crate::domain::features::FeatureFrame;
use crate::domain::metrics::{PerformanceReport, Summary};
use crate::domain::signal::SignalSource;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub threshold: f64,
    pub summary: Summary,
}

/// Upper bound on the number of runs a single sweep may schedule.
pub const MAX_SWEEP_POINTS: usize = 10_000;

fn sweep_invalid(key: &str, reason: impl Into<String>) -> TradelabError {
    TradelabError::ConfigInvalid {
        section: "sweep".to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Thresholds from `start` to `end` inclusive in `step` increments.
///
/// Both bounds must lie in [0, 1] with `start <= end`, and the step must be
/// finite and positive.
pub fn threshold_grid(start: f64, end: f64, step: f64) -> Result<Vec<f64>, TradelabError> {
    for (key, value) in [("from", start), ("to", end)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(sweep_invalid(key, format!("{value} is outside [0, 1]")));
        }
    }
    if end < start {
        return Err(sweep_invalid("to", format!("{end} is below from ({start})")));
    }
    if !(step.is_finite() && step > 0.0) {
        return Err(sweep_invalid("step", format!("{step} must be finite and positive")));
    }

    let span = ((end - start) / step + 1e-9).floor();
    if span >= MAX_SWEEP_POINTS as f64 {
        return Err(sweep_invalid(
            "step",
            format!("{step} yields more than {MAX_SWEEP_POINTS} thresholds"),
        ));
    }
    let count = span as usize;
    Ok((0..=count).map(|i| start + step * i as f64).collect())
}

/// One backtest per threshold. Each run owns a fresh source from `factory`,
/// so the runs share nothing mutable. Results come back in threshold order.
pub fn run_threshold_sweep<S, F>(
    base: &BacktestConfig,
    thresholds: &[f64],
    series: &BarSeries,
    frame: &FeatureFrame,
    report: &PerformanceReport,
    factory: F,
) -> Result<Vec<SweepPoint>, TradelabError>
where
    S: SignalSource,
    F: Fn() -> S + Sync,
{
    log::info!("sweeping {} thresholds over {} bars", thresholds.len(), series.len());

    thresholds
        .par_iter()
        .map(|&threshold| {
            let config = BacktestConfig {
                threshold,
                ..base.clone()
            };
            let mut source = factory();
            let result = run_backtest(config, series, frame, &mut source)?;
            Ok(SweepPoint {
                threshold,
                summary: report.summarize(result.equity_curve(), result.trades()),
            })
        })
        .collect()
}
