//! Moving-average crossover on H1, with an optional H4 trend filter.

use crate::domain::{AccountState, Direction, Intent, Timeframe};
use crate::indicators::{atr, ema, sma};
use crate::store::MarketState;

use super::genome::{Genome, ParamKind, ParamSpec};

// Short and long windows deliberately do not overlap, so short < long holds
// for every genome the optimizer can produce.
pub(crate) const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "short_period",
        kind: ParamKind::Int { min: 2, max: 50 },
    },
    ParamSpec {
        name: "long_period",
        kind: ParamKind::Int { min: 51, max: 300 },
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
    ParamSpec {
        name: "trend_filter",
        kind: ParamKind::Bool,
    },
    ParamSpec {
        name: "trend_period",
        kind: ParamKind::Int { min: 10, max: 100 },
    },
];

#[derive(Debug, Clone)]
pub struct MaCrossover {
    short_period: usize,
    long_period: usize,
    atr_period: usize,
    stop_atr: f64,
    target_ratio: f64,
    trend_filter: bool,
    trend_period: usize,
}

impl MaCrossover {
    pub(super) fn from_genome(genome: &Genome) -> Self {
        Self {
            short_period: genome.int(0) as usize,
            long_period: genome.int(1) as usize,
            atr_period: genome.int(2) as usize,
            stop_atr: genome.float(3),
            target_ratio: genome.float(4),
            trend_filter: genome.flag(5),
            trend_period: genome.int(6) as usize,
        }
    }

    pub(super) fn timeframes(&self) -> Vec<Timeframe> {
        if self.trend_filter {
            vec![Timeframe::H1, Timeframe::H4]
        } else {
            vec![Timeframe::H1]
        }
    }

    pub(super) fn warmup_bars(&self) -> usize {
        // One extra bar so the previous-bar averages exist for cross detection.
        self.long_period.max(self.atr_period + 1) + 1
    }

    /// The H4 filter only admits entries aligned with the higher-timeframe
    /// trend; when H4 history is still warming up no entries are taken.
    fn trend_allows(&self, market: &MarketState<'_>, direction: Direction) -> Option<bool> {
        if !self.trend_filter {
            return Some(true);
        }
        let bars = market.bars(Timeframe::H4)?;
        let trend_ema = ema(bars, self.trend_period)?;
        let close = bars.last()?.close;
        Some(match direction {
            Direction::Long => close > trend_ema,
            Direction::Short => close < trend_ema,
        })
    }

    pub(super) fn decide(&self, market: &MarketState<'_>, account: &AccountState) -> Vec<Intent> {
        let Some(bars) = market.bars(Timeframe::H1) else {
            return Vec::new();
        };
        if bars.len() < self.warmup_bars() {
            return Vec::new();
        }
        let prev = &bars[..bars.len() - 1];
        let (Some(short_now), Some(long_now), Some(short_prev), Some(long_prev)) = (
            sma(bars, self.short_period),
            sma(bars, self.long_period),
            sma(prev, self.short_period),
            sma(prev, self.long_period),
        ) else {
            return Vec::new();
        };

        let direction = if short_prev <= long_prev && short_now > long_now {
            Direction::Long
        } else if short_prev >= long_prev && short_now < long_now {
            Direction::Short
        } else {
            return Vec::new();
        };

        let instrument = market.instrument();
        let mut intents = Vec::new();
        // A cross against an open position closes it even when the filter
        // blocks the new entry.
        if account
            .positions_for(instrument)
            .any(|p| p.direction != direction)
        {
            intents.push(Intent::close(instrument));
        }
        if account
            .positions_for(instrument)
            .any(|p| p.direction == direction)
        {
            return intents;
        }
        if self.trend_allows(market, direction) != Some(true) {
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
    use crate::domain::{Bar, Timeframe};
    use crate::strategy::genome::{ParamValue, TemplateId};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn genome(short: i64, long: i64, trend_filter: bool) -> Genome {
        Genome {
            template: TemplateId::MaCrossover,
            params: vec![
                ParamValue::Int(short),
                ParamValue::Int(long),
                ParamValue::Int(5),
                ParamValue::Float(2.0),
                ParamValue::Float(1.5),
                ParamValue::Bool(trend_filter),
                ParamValue::Int(10),
            ],
        }
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
        MarketState::new("EURUSD", instant, frames)
    }

    #[test]
    fn emits_long_entry_on_upward_cross() {
        let strategy = MaCrossover::from_genome(&genome(2, 51, false));
        // Long tail of flat closes, then a sharp rise so the short average
        // crosses above the long one on the final bar.
        let mut closes = vec![1.1000; 60];
        closes.extend_from_slice(&[1.1005, 1.1030, 1.1080]);
        let bars = h1_bars(&closes);
        let market = market(&bars);
        let account = AccountState::new(10_000.0);

        let intents = strategy.decide(&market, &account);
        assert_eq!(intents.len(), 1);
        match &intents[0].action {
            crate::domain::IntentAction::Open {
                direction,
                stop_loss,
                take_profit,
                ..
            } => {
                assert_eq!(*direction, Direction::Long);
                assert!(*stop_loss < 1.1080);
                assert!(take_profit.unwrap() > 1.1080);
            }
            other => panic!("expected open, got {other:?}"),
        }
    }

    #[test]
    fn no_intents_without_a_cross() {
        let strategy = MaCrossover::from_genome(&genome(2, 51, false));
        let closes = vec![1.1000; 70];
        let bars = h1_bars(&closes);
        let market = market(&bars);
        let account = AccountState::new(10_000.0);
        assert!(strategy.decide(&market, &account).is_empty());
    }

    #[test]
    fn no_intents_during_warmup() {
        let strategy = MaCrossover::from_genome(&genome(2, 51, false));
        let bars = h1_bars(&[1.10; 10]);
        let market = market(&bars);
        let account = AccountState::new(10_000.0);
        assert!(strategy.decide(&market, &account).is_empty());
    }

    #[test]
    fn trend_filter_blocks_entry_when_h4_missing() {
        let strategy = MaCrossover::from_genome(&genome(2, 51, true));
        let mut closes = vec![1.1000; 60];
        closes.extend_from_slice(&[1.1005, 1.1030, 1.1080]);
        let bars = h1_bars(&closes);
        // No H4 frame in the view.
        let market = market(&bars);
        let account = AccountState::new(10_000.0);
        assert!(strategy.decide(&market, &account).is_empty());
    }

    #[test]
    fn subscribes_h4_only_with_filter() {
        let with = MaCrossover::from_genome(&genome(2, 51, true));
        let without = MaCrossover::from_genome(&genome(2, 51, false));
        assert!(with.timeframes().contains(&Timeframe::H4));
        assert!(!without.timeframes().contains(&Timeframe::H4));
    }
}
