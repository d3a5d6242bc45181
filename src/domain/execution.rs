//! Fill simulation: slippage, sizing, commissions and the insufficient-funds
//! policy.
//!
//! Every fill preserves `cash + quantity × fill_price` except for the
//! commission it charges.

use crate::domain::ohlcv::Timestamp;
use crate::domain::portfolio::Portfolio;
use crate::domain::position::{Fill, FillNote, FillReason, Position, Trade};

/// What to do when cash cannot cover a requested opening fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsufficientFundsPolicy {
    /// Fill the largest affordable quantity.
    #[default]
    Clamp,
    /// Skip the fill entirely.
    Reject,
}

impl std::str::FromStr for InsufficientFundsPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clamp" => Ok(Self::Clamp),
            "reject" | "skip" => Ok(Self::Reject),
            other => Err(format!("unknown policy '{other}' (expected clamp or reject)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
    Flat,
}

impl Direction {
    pub fn of(position: &Position) -> Self {
        if position.is_long() {
            Direction::Long
        } else if position.is_short() {
            Direction::Short
        } else {
            Direction::Flat
        }
    }

    fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
            Direction::Flat => 0.0,
        }
    }
}

/// Configuration for fill execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Fraction of notional charged per fill.
    pub commission_rate: f64,
    /// Fraction by which fills are moved against the trader.
    pub slippage_rate: f64,
    /// Fraction of equity committed when opening a position.
    pub position_size: f64,
    pub whole_units: bool,
    pub funds_policy: InsufficientFundsPolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            commission_rate: 0.0,
            slippage_rate: 0.0,
            position_size: 1.0,
            whole_units: false,
            funds_policy: InsufficientFundsPolicy::Clamp,
        }
    }
}

/// commission = |notional| × commission_rate
pub fn calculate_commission(notional: f64, config: &ExecutionConfig) -> f64 {
    notional.abs() * config.commission_rate
}

/// Buying pays up, selling receives less.
pub fn apply_slippage(market_price: f64, buying: bool, slippage_rate: f64) -> f64 {
    if buying {
        market_price * (1.0 + slippage_rate)
    } else {
        market_price * (1.0 - slippage_rate)
    }
}

fn round_units(quantity: f64, config: &ExecutionConfig) -> f64 {
    if config.whole_units {
        quantity.floor()
    } else {
        quantity
    }
}

/// Close the open position at `market_price`. Returns the closed trade, or
/// `None` when already flat.
///
/// There is no margin model: buying back a short above its sale proceeds
/// leaves cash negative. Only opening fills are held to the cash check, so
/// later entries are rejected until cash recovers.
pub fn close_position(
    portfolio: &mut Portfolio,
    market_price: f64,
    timestamp: Timestamp,
    reason: FillReason,
    config: &ExecutionConfig,
) -> Option<Trade> {
    if portfolio.position.is_flat() {
        return None;
    }
    let position = std::mem::take(&mut portfolio.position);
    let quantity = position.quantity;

    // Selling a long, buying back a short.
    let exit_price = apply_slippage(market_price, quantity < 0.0, config.slippage_rate);
    let exit_commission = calculate_commission(quantity * exit_price, config);

    portfolio.cash += quantity * exit_price - exit_commission;

    let commission_paid = position.entry_commission + exit_commission;
    let realized_pnl = (exit_price - position.average_entry_price) * quantity - commission_paid;

    portfolio.record_fill(Fill {
        timestamp,
        price: exit_price,
        requested_quantity: -quantity,
        quantity: -quantity,
        commission: exit_commission,
        cash_after: portfolio.cash,
        position_after: 0.0,
        reason,
        note: None,
    });

    let trade = Trade {
        entry_timestamp: position.entry_timestamp.unwrap_or(timestamp),
        exit_timestamp: timestamp,
        entry_price: position.average_entry_price,
        exit_price,
        quantity,
        commission_paid,
        realized_pnl,
    };
    log::debug!(
        "closed {:+} @ {:.4} on {}: pnl {:.2}",
        quantity,
        exit_price,
        timestamp,
        realized_pnl
    );
    portfolio.record_trade(trade.clone());
    Some(trade)
}

/// Open a position in `direction` from flat at `market_price`.
///
/// Size is `equity × position_size / fill_price`. If cash cannot cover
/// notional plus commission the configured policy clamps or rejects, and the
/// fill carries a [`FillNote`]. Returns the recorded fill.
pub fn open_position(
    portfolio: &mut Portfolio,
    direction: Direction,
    market_price: f64,
    timestamp: Timestamp,
    config: &ExecutionConfig,
) -> Option<Fill> {
    if direction == Direction::Flat || !portfolio.position.is_flat() {
        return None;
    }

    let fill_price = apply_slippage(market_price, direction == Direction::Long, config.slippage_rate);
    if fill_price <= 0.0 {
        return None;
    }

    let equity = portfolio.cash.max(0.0);
    let requested = round_units(equity * config.position_size / fill_price, config);
    let unit_cost = fill_price * (1.0 + config.commission_rate);
    let affordable = round_units(portfolio.cash.max(0.0) / unit_cost, config);

    let (quantity, note) = if requested <= affordable * (1.0 + 1e-12) {
        (requested, None)
    } else {
        match config.funds_policy {
            InsufficientFundsPolicy::Clamp if affordable > 0.0 => (
                affordable,
                Some(FillNote::Clamped {
                    requested,
                    filled: affordable,
                }),
            ),
            _ => (0.0, Some(FillNote::Rejected { requested })),
        }
    };

    if quantity <= 0.0 {
        let fill = Fill {
            timestamp,
            price: fill_price,
            requested_quantity: direction.sign() * requested,
            quantity: 0.0,
            commission: 0.0,
            cash_after: portfolio.cash,
            position_after: portfolio.position.quantity,
            reason: FillReason::Signal,
            note: note.or(Some(FillNote::Rejected { requested })),
        };
        log::debug!("rejected {:?} entry on {}: insufficient funds", direction, timestamp);
        portfolio.record_fill(fill.clone());
        return Some(fill);
    }

    let signed = direction.sign() * quantity;
    let commission = calculate_commission(signed * fill_price, config);
    portfolio.cash -= signed * fill_price + commission;
    if direction == Direction::Long && portfolio.cash < 0.0 {
        // Rounding residue from the affordability division.
        portfolio.cash = 0.0;
    }

    portfolio.position = Position {
        quantity: signed,
        average_entry_price: fill_price,
        entry_timestamp: Some(timestamp),
        entry_commission: commission,
    };

    let fill = Fill {
        timestamp,
        price: fill_price,
        requested_quantity: direction.sign() * requested,
        quantity: signed,
        commission,
        cash_after: portfolio.cash,
        position_after: signed,
        reason: FillReason::Signal,
        note,
    };
    log::debug!(
        "opened {:+} @ {:.4} on {} (commission {:.4})",
        signed,
        fill_price,
        timestamp,
        commission
    );
    portfolio.record_fill(fill.clone());
    Some(fill)
}
