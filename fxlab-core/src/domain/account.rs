//! Account and position state.
//!
//! `AccountState` is owned by whoever drives the simulation (the backtest
//! runner or the execution bridge) and mutated only through the fill & risk
//! simulator. Strategies receive it by shared reference and can never touch
//! it — there is deliberately no global account anywhere in this crate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for long, -1.0 for short. P/L = sign * (exit - entry) * size.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// An open position. Created by an accepted open intent, mutated only by the
/// simulator (stop adjustments, trailing), destroyed on close or stop-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: u64,
    pub instrument: String,
    pub direction: Direction,
    /// Size in base-currency units.
    pub size: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: Option<f64>,
    pub opened_at: DateTime<Utc>,
    /// Most favorable price seen since entry; anchor for trailing stops.
    pub best_price: f64,
}

impl Position {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.direction.sign() * (price - self.entry_price) * self.size
    }

    /// Margin locked by this position at the given leverage.
    pub fn used_margin(&self, leverage: f64) -> f64 {
        self.size * self.entry_price / leverage
    }

    /// Absolute distance between entry and current stop.
    pub fn stop_distance(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }
}

/// Account state for one run or one live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountState {
    /// Realized balance.
    pub balance: f64,
    /// Balance plus unrealized P/L as of the last mark-to-market.
    pub equity: f64,
    pub positions: Vec<Position>,
    /// Realized P/L since the current day started.
    pub daily_pnl: f64,
    /// Balance at the start of the current day; daily-loss ceilings are a
    /// fraction of this.
    pub day_start_balance: f64,
    /// Calendar day (UTC) the daily counters refer to.
    pub day: Option<NaiveDate>,
    /// Highest equity seen since the run started.
    pub peak_equity: f64,
    /// Worst peak-to-trough decline seen so far, as a positive fraction.
    pub max_drawdown: f64,
    next_position_id: u64,
}

impl AccountState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            equity: initial_balance,
            positions: Vec::new(),
            daily_pnl: 0.0,
            day_start_balance: initial_balance,
            day: None,
            peak_equity: initial_balance,
            max_drawdown: 0.0,
            next_position_id: 1,
        }
    }

    pub fn next_position_id(&mut self) -> u64 {
        let id = self.next_position_id;
        self.next_position_id += 1;
        id
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions_for<'a>(&'a self, instrument: &'a str) -> impl Iterator<Item = &'a Position> {
        self.positions.iter().filter(move |p| p.instrument == instrument)
    }

    pub fn has_position(&self, instrument: &str) -> bool {
        self.positions_for(instrument).next().is_some()
    }

    /// Margin currently locked across all open positions.
    pub fn used_margin(&self, leverage: f64) -> f64 {
        self.positions.iter().map(|p| p.used_margin(leverage)).sum()
    }

    /// Equity not locked as margin; new positions must fit inside this.
    pub fn free_margin(&self, leverage: f64) -> f64 {
        self.equity - self.used_margin(leverage)
    }

    /// Record realized P/L from a closed trade.
    pub fn realize(&mut self, net_pnl: f64) {
        self.balance += net_pnl;
        self.daily_pnl += net_pnl;
    }

    /// Mark all open positions to the given price and refresh the
    /// equity/peak/drawdown figures.
    pub fn mark_to_market(&mut self, price: f64) {
        let unrealized: f64 = self.positions.iter().map(|p| p.unrealized_pnl(price)).sum();
        self.equity = self.balance + unrealized;
        if self.equity > self.peak_equity {
            self.peak_equity = self.equity;
        }
        if self.peak_equity > 0.0 {
            let dd = (self.peak_equity - self.equity) / self.peak_equity;
            if dd > self.max_drawdown {
                self.max_drawdown = dd;
            }
        }
    }

    /// Drawdown from the peak as of the last mark-to-market, as a positive
    /// fraction of the peak.
    pub fn current_drawdown(&self) -> f64 {
        if self.peak_equity <= 0.0 {
            return 0.0;
        }
        ((self.peak_equity - self.equity) / self.peak_equity).max(0.0)
    }

    /// Reset the daily counters when the simulated calendar day changes.
    /// Returns true if a new day started.
    pub fn roll_day(&mut self, day: NaiveDate) -> bool {
        if self.day == Some(day) {
            return false;
        }
        self.day = Some(day);
        self.daily_pnl = 0.0;
        self.day_start_balance = self.balance;
        true
    }
}
