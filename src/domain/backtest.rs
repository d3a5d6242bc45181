//! Backtest simulator and event loop.
//!
//! Each bar is processed in a fixed order: fill the pending decision at the
//! open, optionally liquidate on the final bar, mark equity at the close,
//! then decide on the bar's feature row. A decision made on bar `i` is only
//! ever filled on bar `i + 1`.

use crate::domain::bar_series::BarSeries;
use crate::domain::error::TradelabError;
use crate::domain::execution::{close_position, open_position, Direction, ExecutionConfig};
use crate::domain::features::FeatureFrame;
use crate::domain::ohlcv::Timestamp;
use crate::domain::portfolio::{EquityPoint, Portfolio};
use crate::domain::position::{Fill, FillReason, Trade};
use crate::domain::signal::{Signal, SignalSource};

/// Maps a signal and the current exposure to a target exposure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingRule {
    pub threshold: f64,
    pub allow_shorting: bool,
}

impl TradingRule {
    /// A probability exactly at the threshold holds the current exposure.
    pub fn target(&self, signal: Signal, current: Direction) -> Direction {
        let up = signal.probability_up();
        let down = signal.probability_down();

        if up > self.threshold {
            Direction::Long
        } else if self.allow_shorting && down > self.threshold {
            Direction::Short
        } else if up == self.threshold || (self.allow_shorting && down == self.threshold) {
            current
        } else {
            Direction::Flat
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub threshold: f64,
    pub allow_shorting: bool,
    /// Liquidate any open position at the final bar's close.
    pub close_at_end: bool,
    pub execution: ExecutionConfig,
}

impl BacktestConfig {
    pub fn rule(&self) -> TradingRule {
        TradingRule {
            threshold: self.threshold,
            allow_shorting: self.allow_shorting,
        }
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100.0,
            threshold: 0.5,
            allow_shorting: false,
            close_at_end: true,
            execution: ExecutionConfig::default(),
        }
    }
}

/// Everything a finished (or stopped) run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub config: BacktestConfig,
    pub portfolio: Portfolio,
    pub bars_processed: usize,
    pub decisions: usize,
}

impl BacktestResult {
    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.portfolio.equity_curve
    }

    pub fn trades(&self) -> &[Trade] {
        &self.portfolio.trades
    }

    pub fn fills(&self) -> &[Fill] {
        &self.portfolio.fills
    }

    pub fn final_equity(&self) -> f64 {
        self.portfolio
            .equity_curve
            .last()
            .map(|p| p.total_equity)
            .unwrap_or(self.portfolio.initial_capital)
    }
}

/// Streaming simulator over one aligned series and feature frame.
pub struct Simulator<'a> {
    config: BacktestConfig,
    series: &'a BarSeries,
    frame: &'a FeatureFrame,
    portfolio: Portfolio,
    cursor: usize,
    pending: Option<Direction>,
    decisions: usize,
}

impl<'a> Simulator<'a> {
    pub fn new(
        config: BacktestConfig,
        series: &'a BarSeries,
        frame: &'a FeatureFrame,
    ) -> Result<Self, TradelabError> {
        if frame.len() != series.len() {
            return Err(TradelabError::FrameMismatch {
                reason: format!("{} rows for {} bars", frame.len(), series.len()),
            });
        }
        if let Some(index) = series
            .timestamps()
            .zip(frame.rows())
            .position(|(ts, row)| ts != row.timestamp)
        {
            return Err(TradelabError::FrameMismatch {
                reason: format!("row {index} timestamp differs from its bar"),
            });
        }

        let portfolio = Portfolio::new(config.initial_capital);
        Ok(Simulator {
            config,
            series,
            frame,
            portfolio,
            cursor: 0,
            pending: None,
            decisions: 0,
        })
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Index of the next bar to process.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.series.len()
    }

    /// Process one bar. Returns `None` once the series is exhausted.
    ///
    /// A signal failure leaves the simulator untouched at the failing bar.
    pub fn step<S: SignalSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Option<&EquityPoint>, TradelabError> {
        let i = self.cursor;
        let series = self.series;
        let Some(bar) = series.get(i) else {
            return Ok(None);
        };
        let last = i + 1 == series.len();

        let signal = match self.frame.get(i) {
            Some(row) if i >= self.frame.warmup() && !last => Some(source.predict(row)?),
            _ => None,
        };

        if let Some(target) = self.pending.take() {
            self.rebalance(target, bar.open, bar.timestamp);
        }

        if last && self.config.close_at_end {
            close_position(
                &mut self.portfolio,
                bar.close,
                bar.timestamp,
                FillReason::EndOfData,
                &self.config.execution,
            );
        }

        if let Some(signal) = signal {
            let current = Direction::of(&self.portfolio.position);
            let target = self.config.rule().target(signal, current);
            self.decisions += 1;
            if target != current {
                log::debug!(
                    "{}: p_up {:.3} -> {:?}, filling next open",
                    bar.timestamp,
                    signal.probability_up(),
                    target
                );
                self.pending = Some(target);
            }
        }

        self.cursor += 1;
        Ok(Some(self.portfolio.record_equity(bar.timestamp, bar.close)))
    }

    fn rebalance(&mut self, target: Direction, price: f64, timestamp: Timestamp) {
        let current = Direction::of(&self.portfolio.position);
        if target == current {
            return;
        }
        let execution = &self.config.execution;
        if current != Direction::Flat {
            close_position(&mut self.portfolio, price, timestamp, FillReason::Signal, execution);
        }
        if target != Direction::Flat {
            open_position(&mut self.portfolio, target, price, timestamp, execution);
        }
    }

    pub fn finish(self) -> BacktestResult {
        log::info!(
            "backtest finished: {} bars, {} decisions, {} trades, equity {:.2}",
            self.cursor,
            self.decisions,
            self.portfolio.trades.len(),
            self.portfolio
                .equity_curve
                .last()
                .map(|p| p.total_equity)
                .unwrap_or(self.portfolio.cash)
        );
        BacktestResult {
            config: self.config,
            portfolio: self.portfolio,
            bars_processed: self.cursor,
            decisions: self.decisions,
        }
    }
}

/// Run a whole series through a fresh simulator.
pub fn run_backtest<S: SignalSource + ?Sized>(
    config: BacktestConfig,
    series: &BarSeries,
    frame: &FeatureFrame,
    source: &mut S,
) -> Result<BacktestResult, TradelabError> {
    let mut simulator = Simulator::new(config, series, frame)?;
    while simulator.step(source)?.is_some() {}
    Ok(simulator.finish())
}
