//! Performance report over an equity curve and its closed trades.

use super::portfolio::EquityPoint;
use super::position::Trade;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportConfig {
    /// Annual risk-free rate used for Sharpe and Sortino.
    pub risk_free_rate: f64,
    pub periods_per_year: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            risk_free_rate: 0.0,
            periods_per_year: 252.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Summary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Largest peak-to-trough fall, as a fraction of the peak.
    pub max_drawdown: f64,
    /// Longest run of points spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub trade_count: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub average_trade_pnl: f64,
    pub profit_factor: f64,
    pub total_commission: f64,
    pub final_equity: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceReport {
    config: ReportConfig,
}

impl PerformanceReport {
    pub fn new(config: ReportConfig) -> Self {
        PerformanceReport { config }
    }

    pub fn summarize(&self, equity: &[EquityPoint], trades: &[Trade]) -> Summary {
        let initial = equity.first().map(|p| p.total_equity).unwrap_or(0.0);
        let final_equity = equity.last().map(|p| p.total_equity).unwrap_or(initial);

        let total_return = if initial > 0.0 {
            final_equity / initial - 1.0
        } else {
            0.0
        };

        let periods = equity.len().saturating_sub(1) as f64;
        let annualized_return = if periods > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(self.config.periods_per_year / periods) - 1.0
        } else {
            0.0
        };

        let drawdown = Drawdown::scan(equity);
        let (sharpe_ratio, sortino_ratio) = self.risk_adjusted(equity);
        let stats = TradeStats::collect(trades);

        Summary {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown: drawdown.max,
            max_drawdown_duration: drawdown.longest,
            trade_count: trades.len(),
            trades_won: stats.won,
            trades_lost: stats.lost,
            win_rate: ratio(stats.won as f64, trades.len() as f64),
            average_trade_pnl: ratio(stats.gross_profit - stats.gross_loss, trades.len() as f64),
            profit_factor: if stats.gross_loss > 0.0 {
                stats.gross_profit / stats.gross_loss
            } else if stats.gross_profit > 0.0 {
                f64::INFINITY
            } else {
                0.0
            },
            total_commission: stats.commission,
            final_equity,
        }
    }

    fn risk_adjusted(&self, equity: &[EquityPoint]) -> (f64, f64) {
        let returns: Vec<f64> = equity
            .windows(2)
            .map(|w| {
                let prev = w[0].total_equity;
                if prev > 0.0 {
                    w[1].total_equity / prev - 1.0
                } else {
                    0.0
                }
            })
            .collect();
        if returns.is_empty() {
            return (0.0, 0.0);
        }

        let n = returns.len() as f64;
        let period_rf = self.config.risk_free_rate / self.config.periods_per_year;
        let mean = returns.iter().sum::<f64>() / n;
        let excess = mean - period_rf;
        let scale = self.config.periods_per_year.sqrt();

        let stddev = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
        let downside = (returns
            .iter()
            .filter(|&&r| r < period_rf)
            .map(|r| (r - period_rf).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();

        let annualize = |dev: f64| if dev > 0.0 { excess / dev * scale } else { 0.0 };
        (annualize(stddev), annualize(downside))
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

struct Drawdown {
    max: f64,
    longest: usize,
}

impl Drawdown {
    /// Single pass, tracking the running peak.
    fn scan(equity: &[EquityPoint]) -> Self {
        let mut peak = f64::NEG_INFINITY;
        let mut max = 0.0_f64;
        let mut run = 0usize;
        let mut longest = 0usize;

        for point in equity {
            let value = point.total_equity;
            if value >= peak {
                peak = value;
                run = 0;
                continue;
            }
            run += 1;
            longest = longest.max(run);
            if peak > 0.0 {
                max = max.max((peak - value) / peak);
            }
        }

        Drawdown { max, longest }
    }
}

#[derive(Default)]
struct TradeStats {
    won: usize,
    lost: usize,
    gross_profit: f64,
    gross_loss: f64,
    commission: f64,
}

impl TradeStats {
    fn collect(trades: &[Trade]) -> Self {
        trades.iter().fold(TradeStats::default(), |mut stats, trade| {
            let pnl = trade.realized_pnl;
            if pnl > 0.0 {
                stats.won += 1;
                stats.gross_profit += pnl;
            } else if pnl < 0.0 {
                stats.lost += 1;
                stats.gross_loss += -pnl;
            }
            stats.commission += trade.commission_paid;
            stats
        })
    }
}
