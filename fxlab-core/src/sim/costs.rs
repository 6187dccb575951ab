//! Transaction cost model: spread and slippage.

use serde::{Deserialize, Serialize};

/// How slippage is applied to fills. Always adverse: buys fill higher,
/// sells fill lower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlippageModel {
    None,
    /// Fixed price offset per fill (e.g. 0.0001 = one pip on a 4-digit pair).
    FixedPoints { points: f64 },
    /// Offset proportional to the fill price.
    Fraction { fraction: f64 },
}

impl SlippageModel {
    fn offset(&self, price: f64) -> f64 {
        match self {
            SlippageModel::None => 0.0,
            SlippageModel::FixedPoints { points } => *points,
            SlippageModel::Fraction { fraction } => price * fraction,
        }
    }
}

/// Spread plus slippage, applied symmetrically around the reference price.
///
/// The reference price is treated as a mid quote; half the spread lands
/// on each side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub spread: f64,
    pub slippage: SlippageModel,
}

impl CostModel {
    pub fn frictionless() -> Self {
        Self {
            spread: 0.0,
            slippage: SlippageModel::None,
        }
    }

    /// Effective price paid when buying at `reference`.
    pub fn buy_price(&self, reference: f64) -> f64 {
        reference + self.spread / 2.0 + self.slippage.offset(reference)
    }

    /// Effective price received when selling at `reference`.
    pub fn sell_price(&self, reference: f64) -> f64 {
        reference - self.spread / 2.0 - self.slippage.offset(reference)
    }
}

impl Default for CostModel {
    fn default() -> Self {
        // One-pip spread on a 4-digit major, no slippage.
        Self {
            spread: 0.0001,
            slippage: SlippageModel::None,
        }
    }
}
