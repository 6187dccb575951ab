//! Donchian channel breakout on H1.

use crate::domain::{AccountState, Direction, Intent, Timeframe};
use crate::indicators::{atr, donchian};
use crate::store::MarketState;

use super::genome::{Genome, ParamKind, ParamSpec};

pub(crate) const PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "channel_period",
        kind: ParamKind::Int { min: 10, max: 100 },
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
pub struct ChannelBreakout {
    channel_period: usize,
    atr_period: usize,
    stop_atr: f64,
    target_ratio: f64,
}

impl ChannelBreakout {
    pub(super) fn from_genome(genome: &Genome) -> Self {
        Self {
            channel_period: genome.int(0) as usize,
            atr_period: genome.int(1) as usize,
            stop_atr: genome.float(2),
            target_ratio: genome.float(3),
        }
    }

    pub(super) fn timeframes(&self) -> Vec<Timeframe> {
        vec![Timeframe::H1]
    }

    pub(super) fn warmup_bars(&self) -> usize {
        // The channel is built over the bars preceding the breakout bar.
        self.channel_period.max(self.atr_period + 1) + 1
    }

    pub(super) fn decide(&self, market: &MarketState<'_>, account: &AccountState) -> Vec<Intent> {
        let Some(bars) = market.bars(Timeframe::H1) else {
            return Vec::new();
        };
        if bars.len() < self.warmup_bars() {
            return Vec::new();
        }
        // Channel over the window excluding the newest bar; the newest bar's
        // close breaking out of it is the signal.
        let channel_window = &bars[..bars.len() - 1];
        let Some((upper, lower)) = donchian(channel_window, self.channel_period) else {
            return Vec::new();
        };
        let close = bars[bars.len() - 1].close;

        let direction = if close > upper {
            Direction::Long
        } else if close < lower {
            Direction::Short
        } else {
            return Vec::new();
        };

        let instrument = market.instrument();
        let mut intents = Vec::new();
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

        let Some(atr_value) = atr(bars, self.atr_period) else {
            return intents;
        };
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
