//! Execution bridge: the live-trading seam.
//!
//! The bridge drives the same strategy evaluation and the same intent gate
//! as the backtest engine, then hands accepted orders to a `BrokerAdapter`
//! instead of mutating a simulated account directly. Risk checks are never
//! re-implemented on the live side; whatever the simulator would reject,
//! the bridge rejects before the broker ever sees it.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{
    AccountState, Bar, Direction, Intent, RejectedIntent, RiskPolicy, TradeRecord,
};
use crate::sim::{apply_intent, CostModel, FillOutcome};
use crate::store::MarketState;
use crate::strategy::Strategy;

/// An order the bridge has already gated and sized.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub instrument: String,
    pub direction: Direction,
    pub size: f64,
    pub stop_loss: f64,
    pub take_profit: Option<f64>,
    pub requested_at: DateTime<Utc>,
}

/// Broker-side failures. Distinct from policy rejections, which never
/// reach the adapter.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("broker rejected order: {0}")]
    OrderRejected(String),
    #[error("broker unreachable: {0}")]
    Transport(String),
}

/// The seam a live broker integration implements.
pub trait BrokerAdapter {
    fn submit(&mut self, order: &OrderRequest) -> Result<(), BridgeError>;
    fn close_all(&mut self, instrument: &str) -> Result<(), BridgeError>;
    fn modify(
        &mut self,
        instrument: &str,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Result<(), BridgeError>;
}

/// What one bridge step did.
#[derive(Debug, Default)]
pub struct BridgeStep {
    pub submitted: Vec<OrderRequest>,
    pub closed_trades: Vec<TradeRecord>,
    pub rejections: Vec<RejectedIntent>,
}

/// Routes strategy intents through the simulator's gates to a broker.
///
/// The bridge keeps a mirror `AccountState` that the gate mutates; the
/// broker account is the source of truth for fills, and callers reconcile
/// it back into the mirror out of band.
pub struct ExecutionBridge<A: BrokerAdapter> {
    adapter: A,
    policy: RiskPolicy,
    costs: CostModel,
    account: AccountState,
}

impl<A: BrokerAdapter> ExecutionBridge<A> {
    pub fn new(adapter: A, policy: RiskPolicy, costs: CostModel, account: AccountState) -> Self {
        Self {
            adapter,
            policy,
            costs,
            account,
        }
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    pub fn account_mut(&mut self) -> &mut AccountState {
        &mut self.account
    }

    /// Evaluate the strategy on a fresh market view and route its intents.
    ///
    /// `fill_bar` is the bar whose open prices the gate sizes against; live,
    /// that is the forming bar after the one the strategy just saw.
    pub fn step(
        &mut self,
        strategy: &Strategy,
        market: &MarketState<'_>,
        fill_bar: &Bar,
    ) -> Result<BridgeStep, BridgeError> {
        let intents = strategy.decide(market, &self.account);
        self.route(&intents, fill_bar)
    }

    /// Route pre-built intents through the gate and on to the broker.
    pub fn route(&mut self, intents: &[Intent], fill_bar: &Bar) -> Result<BridgeStep, BridgeError> {
        let mut step = BridgeStep::default();
        for intent in intents {
            match apply_intent(intent, &mut self.account, &self.policy, &self.costs, fill_bar) {
                FillOutcome::Opened { position_id } => {
                    // The gate just pushed the sized position; echo it to
                    // the broker.
                    let position = self
                        .account
                        .positions
                        .iter()
                        .find(|p| p.id == position_id)
                        .cloned();
                    if let Some(position) = position {
                        let order = OrderRequest {
                            instrument: position.instrument.clone(),
                            direction: position.direction,
                            size: position.size,
                            stop_loss: position.stop_loss,
                            take_profit: position.take_profit,
                            requested_at: fill_bar.timestamp,
                        };
                        self.adapter.submit(&order)?;
                        step.submitted.push(order);
                    }
                }
                FillOutcome::Closed { trades } => {
                    self.adapter.close_all(&intent.instrument)?;
                    step.closed_trades.extend(trades);
                }
                FillOutcome::Modified { .. } => {
                    if let crate::domain::IntentAction::Modify {
                        stop_loss,
                        take_profit,
                    } = intent.action
                    {
                        self.adapter
                            .modify(&intent.instrument, stop_loss, take_profit)?;
                    }
                }
                FillOutcome::Rejected(rejected) => step.rejections.push(rejected),
                FillOutcome::NoOp => {}
            }
        }
        Ok(step)
    }
}
