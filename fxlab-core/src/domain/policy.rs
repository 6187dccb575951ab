//! Risk policy — immutable per run, shared by reference between the
//! simulator and (read-only) the strategy evaluator.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed risk policy; fatal at run start, before any simulation step.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be a fraction in (0, 1], got {value}")]
    FractionOutOfRange { field: &'static str, value: f64 },
    #[error("max_open_positions must be at least 1")]
    ZeroPositions,
    #[error("session window {index} has zero length")]
    EmptySession { index: usize },
}

/// Trailing-stop rule applied by the simulator to open positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrailingRule {
    /// No trailing; the stop stays where the strategy put it.
    None,
    /// Stop follows the best price seen at a fixed distance, ratcheting
    /// only in the position's favor.
    FixedDistance { distance: f64 },
}

/// A daily trading window in UTC. Windows that wrap midnight
/// (`start > end`) are supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            // Overnight window, e.g. 22:00-06:00.
            time >= self.start || time < self.end
        }
    }
}

/// Risk limits and trading-session rules for one run or live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Daily realized-loss ceiling as a fraction of the day-start balance.
    pub max_daily_loss: f64,
    /// Peak-to-trough equity drawdown ceiling as a positive fraction.
    pub max_drawdown: f64,
    pub max_open_positions: usize,
    /// Fraction of balance risked between entry and stop on each trade.
    pub risk_per_trade: f64,
    /// Account leverage used for the margin check.
    pub leverage: f64,
    pub trailing: TrailingRule,
    /// Allowed trading windows (UTC). Empty means always open.
    pub sessions: Vec<SessionWindow>,
}

impl RiskPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        fraction("max_daily_loss", self.max_daily_loss)?;
        fraction("max_drawdown", self.max_drawdown)?;
        fraction("risk_per_trade", self.risk_per_trade)?;
        if self.max_open_positions == 0 {
            return Err(PolicyError::ZeroPositions);
        }
        if !(self.leverage > 0.0) {
            return Err(PolicyError::NonPositive {
                field: "leverage",
                value: self.leverage,
            });
        }
        if let TrailingRule::FixedDistance { distance } = self.trailing {
            if !(distance > 0.0) {
                return Err(PolicyError::NonPositive {
                    field: "trailing.distance",
                    value: distance,
                });
            }
        }
        for (index, win) in self.sessions.iter().enumerate() {
            if win.start == win.end {
                return Err(PolicyError::EmptySession { index });
            }
        }
        Ok(())
    }

    /// Whether trading is allowed at the given instant.
    pub fn session_open(&self, at: DateTime<Utc>) -> bool {
        if self.sessions.is_empty() {
            return true;
        }
        let time = at.time();
        self.sessions.iter().any(|w| w.contains(time))
    }
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            max_daily_loss: 0.05,
            max_drawdown: 0.20,
            max_open_positions: 3,
            risk_per_trade: 0.01,
            leverage: 30.0,
            trailing: TrailingRule::None,
            sessions: Vec::new(),
        }
    }
}

fn fraction(field: &'static str, value: f64) -> Result<(), PolicyError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(PolicyError::FractionOutOfRange { field, value })
    }
}
