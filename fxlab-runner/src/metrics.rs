//! Performance metrics — pure functions over the equity curve and trades.
//!
//! Every metric is equity curve and/or trade list in, scalar out, with no
//! reach into the engine. Ratios are annualized from per-bar returns using
//! the number of bars a forex year holds at the base timeframe.

use serde::{Deserialize, Serialize};

use fxlab_core::domain::{TradeRecord, Timeframe};

/// Bars per year for annualization: 24 hours x 5 trading days x 52 weeks,
/// scaled to the base timeframe.
pub fn periods_per_year(timeframe: Timeframe) -> f64 {
    let minutes_per_year = 24.0 * 60.0 * 5.0 * 52.0;
    minutes_per_year / timeframe.minutes() as f64
}

/// Aggregate performance metrics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub sharpe: f64,
    pub sortino: f64,
    /// Worst peak-to-trough decline, positive fraction.
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub trade_count: usize,
    pub reject_count: usize,
    pub max_consecutive_losses: usize,
}

impl PerformanceMetrics {
    pub fn compute(
        equity_curve: &[f64],
        trades: &[TradeRecord],
        reject_count: usize,
        base: Timeframe,
    ) -> Self {
        let ppy = periods_per_year(base);
        Self {
            total_return: total_return(equity_curve),
            sharpe: sharpe_ratio(equity_curve, ppy),
            sortino: sortino_ratio(equity_curve, ppy),
            max_drawdown: max_drawdown(equity_curve),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            expectancy: expectancy(trades),
            trade_count: trades.len(),
            reject_count,
            max_consecutive_losses: max_consecutive_losses(trades),
        }
    }
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let initial = equity_curve[0];
    if initial <= 0.0 {
        return 0.0;
    }
    (equity_curve[equity_curve.len() - 1] - initial) / initial
}

/// Worst peak-to-trough drawdown as a positive fraction of the peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst: f64 = 0.0;
    for &equity in equity_curve {
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            worst = worst.max((peak - equity) / peak);
        }
    }
    worst
}

fn per_bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Annualized Sharpe ratio from per-bar returns (zero risk-free rate).
/// Returns 0.0 when variance vanishes or fewer than 2 returns exist.
pub fn sharpe_ratio(equity_curve: &[f64], periods_per_year: f64) -> f64 {
    let returns = per_bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean(&returns) / std * periods_per_year.sqrt()
}

/// Annualized Sortino ratio (downside deviation only). Returns 0.0 when no
/// downside exists.
pub fn sortino_ratio(equity_curve: &[f64], periods_per_year: f64) -> f64 {
    let returns = per_bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let downside_sq: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).collect();
    if downside_sq.is_empty() {
        return 0.0;
    }
    let downside = (downside_sq.iter().sum::<f64>() / downside_sq.len() as f64).sqrt();
    if downside < 1e-15 {
        return 0.0;
    }
    mean(&returns) / downside * periods_per_year.sqrt()
}

/// Fraction of trades with positive net P/L. Zero trades → 0.0.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross profit over gross loss. All-winning → f64::INFINITY; no trades
/// or all-flat → 0.0.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.net_pnl > 0.0).map(|t| t.net_pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| -t.net_pnl)
        .sum();
    if gross_loss < 1e-15 {
        if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        gross_profit / gross_loss
    }
}

/// Mean net P/L per trade.
pub fn expectancy(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.net_pnl).sum::<f64>() / trades.len() as f64
}

pub fn max_consecutive_losses(trades: &[TradeRecord]) -> usize {
    let mut worst = 0;
    let mut streak = 0;
    for trade in trades {
        if trade.net_pnl < 0.0 {
            streak += 1;
            worst = worst.max(streak);
        } else {
            streak = 0;
        }
    }
    worst
}
