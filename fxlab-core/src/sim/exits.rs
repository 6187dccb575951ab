//! Per-bar position management: stop, target, and trailing logic.
//!
//! Exit checks run against the bar's full range before the trailing ratchet
//! moves, so a stop can never be tightened out of the way of a touch that
//! happened on the same bar. When a bar's range covers both the stop and the
//! target, the stop wins: the simulator assumes the worst-case path through
//! the bar.

use chrono::{DateTime, Utc};

use crate::domain::{
    AccountState, Bar, Direction, ExitReason, Position, RiskPolicy, TradeRecord, TrailingRule,
};

use super::costs::CostModel;

fn record(position: &Position, exit_time: DateTime<Utc>, exit_price: f64, reason: ExitReason) -> TradeRecord {
    let net_pnl = position.direction.sign() * (exit_price - position.entry_price) * position.size;
    TradeRecord {
        position_id: position.id,
        instrument: position.instrument.clone(),
        direction: position.direction,
        size: position.size,
        entry_time: position.opened_at,
        entry_price: position.entry_price,
        exit_time,
        exit_price,
        net_pnl,
        exit_reason: reason,
    }
}

/// Exit price side for a position being unwound.
fn exit_fill(costs: &CostModel, direction: Direction, reference: f64) -> f64 {
    match direction {
        Direction::Long => costs.sell_price(reference),
        Direction::Short => costs.buy_price(reference),
    }
}

/// Raw exit level touched by this bar, if any. Checked in worst-case order.
fn touched_exit(position: &Position, bar: &Bar) -> Option<(f64, ExitReason, bool)> {
    let stop = position.stop_loss;
    let tp = position.take_profit;
    match position.direction {
        Direction::Long => {
            // A gap through a level fills at the open, not at the level.
            if bar.open <= stop {
                return Some((bar.open, ExitReason::StopLoss, true));
            }
            if let Some(tp) = tp {
                if bar.open >= tp {
                    return Some((bar.open, ExitReason::TakeProfit, true));
                }
            }
            if bar.low <= stop {
                return Some((stop, ExitReason::StopLoss, false));
            }
            if let Some(tp) = tp {
                if bar.high >= tp {
                    return Some((tp, ExitReason::TakeProfit, false));
                }
            }
            None
        }
        Direction::Short => {
            if bar.open >= stop {
                return Some((bar.open, ExitReason::StopLoss, true));
            }
            if let Some(tp) = tp {
                if bar.open <= tp {
                    return Some((bar.open, ExitReason::TakeProfit, true));
                }
            }
            if bar.high >= stop {
                return Some((stop, ExitReason::StopLoss, false));
            }
            if let Some(tp) = tp {
                if bar.low <= tp {
                    return Some((tp, ExitReason::TakeProfit, false));
                }
            }
            None
        }
    }
}

/// Ratchet the trailing stop after the bar's exit checks. Stops only tighten.
fn ratchet(position: &mut Position, rule: &TrailingRule, bar: &Bar) {
    let TrailingRule::FixedDistance { distance } = *rule else {
        return;
    };
    match position.direction {
        Direction::Long => {
            position.best_price = position.best_price.max(bar.high);
            let candidate = position.best_price - distance;
            if candidate > position.stop_loss {
                position.stop_loss = candidate;
            }
        }
        Direction::Short => {
            position.best_price = position.best_price.min(bar.low);
            let candidate = position.best_price + distance;
            if candidate < position.stop_loss {
                position.stop_loss = candidate;
            }
        }
    }
}

/// Run one bar of exit management over all open positions.
///
/// Closed positions are removed from the account and their realized PnL
/// applied; surviving positions get their trailing stops ratcheted.
pub fn manage_bar(
    account: &mut AccountState,
    policy: &RiskPolicy,
    costs: &CostModel,
    bar: &Bar,
) -> Vec<TradeRecord> {
    let mut trades = Vec::new();
    let mut index = 0;
    while index < account.positions.len() {
        match touched_exit(&account.positions[index], bar) {
            Some((reference, reason, at_open)) => {
                let position = account.positions.remove(index);
                let exit_price = exit_fill(costs, position.direction, reference);
                let exit_time = if at_open {
                    bar.timestamp
                } else {
                    bar.close_time()
                };
                let trade = record(&position, exit_time, exit_price, reason);
                account.realize(trade.net_pnl);
                trades.push(trade);
            }
            None => {
                ratchet(&mut account.positions[index], &policy.trailing, bar);
                index += 1;
            }
        }
    }
    trades
}

/// Close every open position on `instrument` at a reference price.
///
/// Used for signal-driven closes (next bar open) and the end-of-data sweep
/// (last bar close).
pub fn close_all(
    account: &mut AccountState,
    costs: &CostModel,
    instrument: &str,
    reference: f64,
    exit_time: DateTime<Utc>,
    reason: ExitReason,
) -> Vec<TradeRecord> {
    let mut trades = Vec::new();
    let mut index = 0;
    while index < account.positions.len() {
        if account.positions[index].instrument == instrument {
            let position = account.positions.remove(index);
            let exit_price = exit_fill(costs, position.direction, reference);
            let trade = record(&position, exit_time, exit_price, reason);
            account.realize(trade.net_pnl);
            trades.push(trade);
        } else {
            index += 1;
        }
    }
    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;
    use chrono::{TimeZone, Utc};

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            timeframe: Timeframe::H1,
            open,
            high,
            low,
            close,
            volume: 100.0,
        }
    }

    fn long_position(entry: f64, stop: f64, tp: Option<f64>) -> Position {
        Position {
            id: 1,
            instrument: "EURUSD".to_string(),
            direction: Direction::Long,
            size: 10_000.0,
            entry_price: entry,
            stop_loss: stop,
            take_profit: tp,
            opened_at: Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
            best_price: entry,
        }
    }

    fn account_with(position: Position) -> AccountState {
        let mut account = AccountState::new(10_000.0);
        account.positions.push(position);
        account
    }

    #[test]
    fn stop_wins_when_bar_spans_both_levels() {
        let mut account = account_with(long_position(1.1000, 1.0950, Some(1.1050)));
        let wide = bar(1.1000, 1.1100, 1.0900, 1.1000);
        let trades = manage_bar(
            &mut account,
            &RiskPolicy::default(),
            &CostModel::frictionless(),
            &wide,
        );
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_reason, ExitReason::StopLoss);
        assert_eq!(trades[0].exit_price, 1.0950);
        assert!(account.positions.is_empty());
    }

    #[test]
    fn gap_through_stop_fills_at_open() {
        let mut account = account_with(long_position(1.1000, 1.0950, None));
        let gapped = bar(1.0900, 1.0910, 1.0890, 1.0900);
        let trades = manage_bar(
            &mut account,
            &RiskPolicy::default(),
            &CostModel::frictionless(),
            &gapped,
        );
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_price, 1.0900);
        assert_eq!(trades[0].exit_reason, ExitReason::StopLoss);
        // Loss exceeds the stop distance because of the gap.
        assert!(trades[0].net_pnl < -10_000.0 * 0.0050 + 1e-9);
    }

    #[test]
    fn take_profit_fills_at_level() {
        let mut account = account_with(long_position(1.1000, 1.0950, Some(1.1050)));
        let rising = bar(1.1010, 1.1060, 1.1005, 1.1040);
        let trades = manage_bar(
            &mut account,
            &RiskPolicy::default(),
            &CostModel::frictionless(),
            &rising,
        );
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_reason, ExitReason::TakeProfit);
        assert_eq!(trades[0].exit_price, 1.1050);
        assert!((account.balance - 10_050.0).abs() < 1e-6);
    }

    #[test]
    fn trailing_stop_only_tightens() {
        let policy = RiskPolicy {
            trailing: TrailingRule::FixedDistance { distance: 0.0030 },
            ..RiskPolicy::default()
        };
        let mut account = account_with(long_position(1.1000, 1.0950, None));

        let up = bar(1.1000, 1.1040, 1.0995, 1.1030);
        assert!(manage_bar(&mut account, &policy, &CostModel::frictionless(), &up).is_empty());
        assert!((account.positions[0].stop_loss - 1.1010).abs() < 1e-9);

        // A pullback bar must not loosen the stop.
        let down = bar(1.1030, 1.1032, 1.1015, 1.1020);
        assert!(manage_bar(&mut account, &policy, &CostModel::frictionless(), &down).is_empty());
        assert!((account.positions[0].stop_loss - 1.1010).abs() < 1e-9);
    }

    #[test]
    fn same_bar_touch_beats_later_ratchet() {
        // The bar both rallies far enough to ratchet and dips to the stop;
        // the exit must fire at the original stop.
        let policy = RiskPolicy {
            trailing: TrailingRule::FixedDistance { distance: 0.0020 },
            ..RiskPolicy::default()
        };
        let mut account = account_with(long_position(1.1000, 1.0950, None));
        let whipsaw = bar(1.1000, 1.1100, 1.0950, 1.1090);
        let trades = manage_bar(&mut account, &policy, &CostModel::frictionless(), &whipsaw);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_price, 1.0950);
    }

    #[test]
    fn short_stop_and_target_sides() {
        let mut account = AccountState::new(10_000.0);
        account.positions.push(Position {
            id: 1,
            instrument: "EURUSD".to_string(),
            direction: Direction::Short,
            size: 10_000.0,
            entry_price: 1.1000,
            stop_loss: 1.1050,
            take_profit: Some(1.0950),
            opened_at: Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
            best_price: 1.1000,
        });
        let falling = bar(1.0990, 1.0995, 1.0940, 1.0950);
        let trades = manage_bar(
            &mut account,
            &RiskPolicy::default(),
            &CostModel::frictionless(),
            &falling,
        );
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_reason, ExitReason::TakeProfit);
        assert!(trades[0].net_pnl > 0.0);
    }

    #[test]
    fn close_all_realizes_at_reference() {
        let mut account = account_with(long_position(1.1000, 1.0900, None));
        let when = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        let trades = close_all(
            &mut account,
            &CostModel::frictionless(),
            "EURUSD",
            1.1020,
            when,
            ExitReason::EndOfData,
        );
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_reason, ExitReason::EndOfData);
        assert!((account.balance - 10_020.0).abs() < 1e-6);
        assert!(account.positions.is_empty());
    }
}
