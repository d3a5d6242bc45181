//! Portfolio state and equity tracking.

use crate::domain::ohlcv::Timestamp;
use crate::domain::position::{Fill, Position, Trade};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EquityPoint {
    pub timestamp: Timestamp,
    pub cash: f64,
    pub position_value: f64,
    pub total_equity: f64,
}

/// Cash, the single position, and the append-only histories of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Position,
    pub trades: Vec<Trade>,
    pub fills: Vec<Fill>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: Position::flat(),
            trades: Vec::new(),
            fills: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// cash + quantity × price
    pub fn total_equity(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn record_fill(&mut self, fill: Fill) {
        self.fills.push(fill);
    }

    pub fn record_equity(&mut self, timestamp: Timestamp, close: f64) -> &EquityPoint {
        let position_value = self.position.market_value(close);
        self.equity_curve.push(EquityPoint {
            timestamp,
            cash: self.cash,
            position_value,
            total_equity: self.cash + position_value,
        });
        &self.equity_curve[self.equity_curve.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(100000.0);
        assert!((portfolio.cash - 100000.0).abs() < f64::EPSILON);
        assert!((portfolio.initial_capital - 100000.0).abs() < f64::EPSILON);
        assert!(portfolio.position.is_flat());
        assert!(portfolio.trades.is_empty());
        assert!(portfolio.fills.is_empty());
        assert!(portfolio.equity_curve.is_empty());
    }

    #[test]
    fn record_equity_marks_position() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.cash = 0.0;
        portfolio.position.quantity = 100.0;
        portfolio.position.average_entry_price = 100.0;
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();

        let point = portfolio.record_equity(ts, 110.0).clone();
        assert_eq!(point.timestamp, ts);
        assert!((point.position_value - 11_000.0).abs() < f64::EPSILON);
        assert!((point.total_equity - 11_000.0).abs() < f64::EPSILON);
        assert_eq!(portfolio.equity_curve.len(), 1);
    }

    #[test]
    fn total_equity_short_position() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.cash = 20_000.0;
        portfolio.position.quantity = -100.0;
        assert!((portfolio.total_equity(90.0) - 11_000.0).abs() < f64::EPSILON);
    }
}
