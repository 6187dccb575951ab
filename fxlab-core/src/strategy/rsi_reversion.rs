//! RSI mean reversion on H1.
//!
//! Buys oversold, sells overbought, and flattens once RSI recrosses the
//! midline. Stop and target still ride on ATR like the trend templates.

use crate::domain::{AccountState, Direction, Intent, Timeframe};
use crate::indicators::{atr, rsi};
use crate::store::MarketState;

use super::genome::{Genome, ParamKind, ParamSpec};

pub(crate) const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "rsi_period",
        kind: ParamKind::Int { min: 5, max: 30 },
    },
    ParamSpec {
        name: "oversold",
        kind: ParamKind::Float { min: 10.0, max: 40.0 },
    },
    ParamSpec {
        name: "overbought",
        kind: ParamKind::Float { min: 60.0, max: 90.0 },
    },
    ParamSpec {
        name: "atr_period",
        kind: ParamKind::Int { min: 5, max: 50 },
    },
    ParamSpec {
        name: "stop_atr",
        kind: ParamKind::Float { min: 0.5, max: 5.0 },
    },
    ParamSpec {
        name: "target_ratio",
        kind: ParamKind::Float { min: 0.5, max: 4.0 },
    },
];

#[derive(Debug, Clone)]
pub struct RsiReversion {
    rsi_period: usize,
    oversold: f64,
    overbought: f64,
    atr_period: usize,
    stop_atr: f64,
    target_ratio: f64,
}

impl RsiReversion {
    pub(super) fn from_genome(genome: &Genome) -> Self {
        Self {
            rsi_period: genome.int(0) as usize,
            oversold: genome.float(1),
            overbought: genome.float(2),
            atr_period: genome.int(3) as usize,
            stop_atr: genome.float(4),
            target_ratio: genome.float(5),
        }
    }

    pub(super) fn timeframes(&self) -> Vec<Timeframe> {
        vec![Timeframe::H1]
    }

    pub(super) fn warmup_bars(&self) -> usize {
        self.rsi_period.max(self.atr_period) + 2
    }

    pub(super) fn decide(&self, market: &MarketState<'_>, account: &AccountState) -> Vec<Intent> {
        let Some(bars) = market.bars(Timeframe::H1) else {
            return Vec::new();
        };
        if bars.len() < self.warmup_bars() {
            return Vec::new();
        }
        let Some(rsi_now) = rsi(bars, self.rsi_period) else {
            return Vec::new();
        };

        let instrument = market.instrument();
        let mut intents = Vec::new();

        // Reversion positions exit at the midline rather than waiting for
        // the opposite extreme.
        let long_open = account
            .positions_for(instrument)
            .any(|p| p.direction == Direction::Long);
        let short_open = account
            .positions_for(instrument)
            .any(|p| p.direction == Direction::Short);
        if (long_open && rsi_now >= 50.0) || (short_open && rsi_now <= 50.0) {
            intents.push(Intent::close(instrument));
            return intents;
        }

        let direction = if rsi_now < self.oversold {
            Direction::Long
        } else if rsi_now > self.overbought {
            Direction::Short
        } else {
            return intents;
        };
        if long_open || short_open {
            return intents;
        }

        let Some(atr_value) = atr(bars, self.atr_period) else {
            return intents;
        };
        let close = bars[bars.len() - 1].close;
        let stop_distance = self.stop_atr * atr_value;
        if stop_distance <= 0.0 {
            return intents;
        }
        let (stop, target) = match direction {
            Direction::Long => (
                close - stop_distance,
                close + self.target_ratio * stop_distance,
            ),
            Direction::Short => (
                close + stop_distance,
                close - self.target_ratio * stop_distance,
            ),
        };
        intents.push(Intent::open(instrument, direction, stop, Some(target)));
        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, IntentAction, Position, Timeframe};
    use crate::strategy::genome::{ParamValue, TemplateId};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn strategy() -> RsiReversion {
        RsiReversion::from_genome(&Genome {
            template: TemplateId::RsiReversion,
            params: vec![
                ParamValue::Int(5),
                ParamValue::Float(30.0),
                ParamValue::Float(70.0),
                ParamValue::Int(5),
                ParamValue::Float(2.0),
                ParamValue::Float(1.0),
            ],
        })
    }

    fn h1_bars(closes: &[f64]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::hours(i as i64),
                timeframe: Timeframe::H1,
                open: close,
                high: close + 0.0010,
                low: close - 0.0010,
                close,
                volume: 100.0,
            })
            .collect()
    }

    fn market<'a>(bars: &'a [Bar]) -> MarketState<'a> {
        let mut frames = BTreeMap::new();
        frames.insert(Timeframe::H1, bars);
        let instant = bars.last().unwrap().close_time();
        MarketState::new("USDJPY", instant, frames)
    }

    #[test]
    fn oversold_run_triggers_long_entry() {
        let strategy = strategy();
        // Monotonic decline keeps RSI pinned near zero.
        let closes: Vec<f64> = (0..12).map(|i| 150.0 - 0.2 * i as f64).collect();
        let bars = h1_bars(&closes);
        let market = market(&bars);
        let account = AccountState::new(10_000.0);

        let intents = strategy.decide(&market, &account);
        assert_eq!(intents.len(), 1);
        assert!(matches!(
            intents[0].action,
            IntentAction::Open {
                direction: Direction::Long,
                ..
            }
        ));
    }

    #[test]
    fn overbought_run_triggers_short_entry() {
        let strategy = strategy();
        let closes: Vec<f64> = (0..12).map(|i| 150.0 + 0.2 * i as f64).collect();
        let bars = h1_bars(&closes);
        let market = market(&bars);
        let account = AccountState::new(10_000.0);

        let intents = strategy.decide(&market, &account);
        assert_eq!(intents.len(), 1);
        assert!(matches!(
            intents[0].action,
            IntentAction::Open {
                direction: Direction::Short,
                ..
            }
        ));
    }

    #[test]
    fn midline_recross_closes_open_long() {
        let strategy = strategy();
        // Monotonic rise pins RSI at 100, above the midline.
        let closes: Vec<f64> = (0..12).map(|i| 150.0 + 0.2 * i as f64).collect();
        let bars = h1_bars(&closes);
        let market = market(&bars);
        let mut account = AccountState::new(10_000.0);
        account.positions.push(Position {
            id: 1,
            instrument: "USDJPY".to_string(),
            direction: Direction::Long,
            size: 1000.0,
            entry_price: 150.0,
            stop_loss: 149.0,
            take_profit: None,
            opened_at: bars[0].timestamp,
            best_price: 150.0,
        });

        let intents = strategy.decide(&market, &account);
        assert_eq!(intents.len(), 1);
        assert!(matches!(intents[0].action, IntentAction::Close));
    }
}
