//! Trading intents — what a strategy asks for, before risk adjustment.
//!
//! Intents are produced fresh on every evaluation step and consumed by the
//! fill & risk simulator in the same step; they are never persisted.

use super::account::Direction;
use serde::{Deserialize, Serialize};

/// A strategy's requested trading action for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub instrument: String,
    pub action: IntentAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentAction {
    /// Open a new position. `size_hint` is advisory only: the simulator
    /// sizes the trade from the risk policy and the stop distance, never
    /// from the raw request.
    Open {
        direction: Direction,
        size_hint: f64,
        stop_loss: f64,
        take_profit: Option<f64>,
    },
    /// Close all open positions on the instrument.
    Close,
    /// Adjust stop-loss and/or take-profit on open positions.
    Modify {
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    },
}

impl Intent {
    pub fn open(
        instrument: impl Into<String>,
        direction: Direction,
        stop_loss: f64,
        take_profit: Option<f64>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            action: IntentAction::Open {
                direction,
                size_hint: 0.0,
                stop_loss,
                take_profit,
            },
        }
    }

    pub fn close(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            action: IntentAction::Close,
        }
    }

    pub fn modify(
        instrument: impl Into<String>,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            action: IntentAction::Modify {
                stop_loss,
                take_profit,
            },
        }
    }

    /// Single-word action label for logs and rejection records.
    pub fn kind(&self) -> &'static str {
        match self.action {
            IntentAction::Open { .. } => "open",
            IntentAction::Close => "close",
            IntentAction::Modify { .. } => "modify",
        }
    }
}
