//! Intent application: the gate between strategy requests and the account.
//!
//! Intents fill at the open of the bar after the signal. Gates run in a
//! fixed order: session, then risk limits, then sizing and margin. The
//! first failing gate rejects the intent and records why; a rejection
//! never aborts the run.

use crate::domain::{
    AccountState, Bar, Direction, ExitReason, Intent, IntentAction, Position, RejectReason,
    RejectedIntent, RiskPolicy, TradeRecord,
};

use super::costs::CostModel;
use super::exits::close_all;
use super::sizing::{position_size, required_margin};

/// What applying one intent did to the account.
#[derive(Debug, PartialEq)]
pub enum FillOutcome {
    Opened { position_id: u64 },
    Closed { trades: Vec<TradeRecord> },
    Modified { positions: usize },
    Rejected(RejectedIntent),
    /// Close or modify with no matching open position.
    NoOp,
}

fn rejection(intent: &Intent, bar: &Bar, reason: RejectReason, context: String) -> FillOutcome {
    FillOutcome::Rejected(RejectedIntent {
        timestamp: bar.timestamp,
        instrument: intent.instrument.clone(),
        intent_kind: intent.kind().to_string(),
        reason,
        context,
    })
}

/// Apply one intent against the account, filling at `fill_bar`'s open.
pub fn apply_intent(
    intent: &Intent,
    account: &mut AccountState,
    policy: &RiskPolicy,
    costs: &CostModel,
    fill_bar: &Bar,
) -> FillOutcome {
    match &intent.action {
        IntentAction::Open {
            direction,
            stop_loss,
            take_profit,
            ..
        } => apply_open(
            intent, account, policy, costs, fill_bar, *direction, *stop_loss, *take_profit,
        ),
        IntentAction::Close => {
            if !policy.session_open(fill_bar.timestamp) {
                return rejection(
                    intent,
                    fill_bar,
                    RejectReason::SessionClosed,
                    format!("no session covers {}", fill_bar.timestamp),
                );
            }
            if !account.has_position(&intent.instrument) {
                return FillOutcome::NoOp;
            }
            let trades = close_all(
                account,
                costs,
                &intent.instrument,
                fill_bar.open,
                fill_bar.timestamp,
                ExitReason::Signal,
            );
            FillOutcome::Closed { trades }
        }
        // Stop and target adjustments are risk-reducing and bypass the
        // session and risk gates.
        IntentAction::Modify {
            stop_loss,
            take_profit,
        } => {
            let mut touched = 0;
            for position in &mut account.positions {
                if position.instrument != intent.instrument {
                    continue;
                }
                if let Some(stop) = stop_loss {
                    position.stop_loss = *stop;
                }
                if let Some(tp) = take_profit {
                    position.take_profit = Some(*tp);
                }
                touched += 1;
            }
            if touched == 0 {
                FillOutcome::NoOp
            } else {
                FillOutcome::Modified { positions: touched }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_open(
    intent: &Intent,
    account: &mut AccountState,
    policy: &RiskPolicy,
    costs: &CostModel,
    fill_bar: &Bar,
    direction: Direction,
    stop_loss: f64,
    take_profit: Option<f64>,
) -> FillOutcome {
    if !policy.session_open(fill_bar.timestamp) {
        return rejection(
            intent,
            fill_bar,
            RejectReason::SessionClosed,
            format!("no session covers {}", fill_bar.timestamp),
        );
    }

    let daily_loss_limit = policy.max_daily_loss * account.day_start_balance;
    if account.daily_pnl <= -daily_loss_limit {
        return rejection(
            intent,
            fill_bar,
            RejectReason::RiskLimitExceeded,
            format!(
                "daily loss {:.2} at limit {:.2}",
                -account.daily_pnl, daily_loss_limit
            ),
        );
    }
    if account.current_drawdown() >= policy.max_drawdown {
        return rejection(
            intent,
            fill_bar,
            RejectReason::RiskLimitExceeded,
            format!(
                "drawdown {:.4} at limit {:.4}",
                account.current_drawdown(),
                policy.max_drawdown
            ),
        );
    }
    if account.open_position_count() >= policy.max_open_positions {
        return rejection(
            intent,
            fill_bar,
            RejectReason::RiskLimitExceeded,
            format!("{} positions already open", account.open_position_count()),
        );
    }

    let entry_price = match direction {
        Direction::Long => costs.buy_price(fill_bar.open),
        Direction::Short => costs.sell_price(fill_bar.open),
    };
    // A stop on the wrong side of the fill has no positive distance and
    // cannot be sized.
    let stop_distance = direction.sign() * (entry_price - stop_loss);
    let Some(size) = position_size(account.balance, policy.risk_per_trade, stop_distance) else {
        return rejection(
            intent,
            fill_bar,
            RejectReason::RiskLimitExceeded,
            format!("unsizable stop distance {stop_distance:.6}"),
        );
    };

    let margin = required_margin(size, entry_price, policy.leverage);
    let free = account.free_margin(policy.leverage);
    if margin > free {
        return rejection(
            intent,
            fill_bar,
            RejectReason::InsufficientMargin,
            format!("requires {margin:.2}, free {free:.2}"),
        );
    }

    let position_id = account.next_position_id();
    account.positions.push(Position {
        id: position_id,
        instrument: intent.instrument.clone(),
        direction,
        size,
        entry_price,
        stop_loss,
        take_profit,
        opened_at: fill_bar.timestamp,
        best_price: entry_price,
    });
    FillOutcome::Opened { position_id }
}
