//! Trade log records: completed round trips and rejected intents.

use super::account::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    /// Closed by a strategy intent.
    Signal,
    /// Forced close on the last bar of the run window.
    EndOfData,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Signal => "signal",
            ExitReason::EndOfData => "end_of_data",
        };
        f.write_str(s)
    }
}

/// A complete round-trip trade: entry fill to exit fill.
///
/// Entry and exit prices already include spread and slippage, so
/// `net_pnl = direction.sign() * (exit - entry) * size` holds exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub position_id: u64,
    pub instrument: String,
    pub direction: Direction,
    pub size: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub net_pnl: f64,
    pub exit_reason: ExitReason,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

/// Why an intent was rejected by the fill & risk simulator.
///
/// Rejections are policy outcomes, not errors: the run keeps going and every
/// rejection is individually recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    SessionClosed,
    RiskLimitExceeded,
    InsufficientMargin,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectReason::SessionClosed => "SessionClosed",
            RejectReason::RiskLimitExceeded => "RiskLimitExceeded",
            RejectReason::InsufficientMargin => "InsufficientMargin",
        };
        f.write_str(s)
    }
}

/// A rejected intent, kept in the run report alongside the trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedIntent {
    pub timestamp: DateTime<Utc>,
    pub instrument: String,
    /// "open" / "close" / "modify".
    pub intent_kind: String,
    pub reason: RejectReason,
    pub context: String,
}
