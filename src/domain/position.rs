//! Position, trade and fill records.

use crate::domain::ohlcv::Timestamp;

/// The single open position of a run. Zero quantity means flat.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub quantity: f64,
    pub average_entry_price: f64,
    pub entry_timestamp: Option<Timestamp>,
    /// Commission paid to open; charged against the closing trade's P&L.
    pub entry_commission: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self {
            quantity: 0.0,
            average_entry_price: 0.0,
            entry_timestamp: None,
            entry_commission: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0.0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0.0
    }

    /// Signed mark-to-market value.
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.average_entry_price)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::flat()
    }
}

/// A closed round trip.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Trade {
    pub entry_timestamp: Timestamp,
    pub exit_timestamp: Timestamp,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Signed: positive for longs, negative for shorts.
    pub quantity: f64,
    pub commission_paid: f64,
    pub realized_pnl: f64,
}

/// Annotation left on a fill when cash could not cover the requested size.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillNote {
    Clamped { requested: f64, filled: f64 },
    Rejected { requested: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillReason {
    Signal,
    EndOfData,
}

/// One execution (or rejected attempt) against the portfolio.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Fill {
    pub timestamp: Timestamp,
    pub price: f64,
    pub requested_quantity: f64,
    /// Signed quantity actually traded; zero when rejected.
    pub quantity: f64,
    pub commission: f64,
    pub cash_after: f64,
    pub position_after: f64,
    pub reason: FillReason,
    pub note: Option<FillNote>,
}
