//! MarketState — the read-only market view handed to strategies.

use crate::domain::{Bar, Timeframe};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A bounded, no-lookahead view of the market at one simulated instant.
///
/// Every slice contains only bars complete at `instant`, newest last, capped
/// to the history window the runner asked for. Strategies can read it and
/// nothing else.
#[derive(Debug)]
pub struct MarketState<'a> {
    instrument: &'a str,
    instant: DateTime<Utc>,
    frames: BTreeMap<Timeframe, &'a [Bar]>,
}

impl<'a> MarketState<'a> {
    pub(crate) fn new(
        instrument: &'a str,
        instant: DateTime<Utc>,
        frames: BTreeMap<Timeframe, &'a [Bar]>,
    ) -> Self {
        Self {
            instrument,
            instant,
            frames,
        }
    }

    pub fn instrument(&self) -> &str {
        self.instrument
    }

    /// The simulated instant: the close time of the newest finest-timeframe bar.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn timeframes(&self) -> impl Iterator<Item = Timeframe> + '_ {
        self.frames.keys().copied()
    }

    /// Visible history for a subscribed timeframe, oldest first.
    pub fn bars(&self, timeframe: Timeframe) -> Option<&'a [Bar]> {
        self.frames.get(&timeframe).copied()
    }

    /// The newest complete bar on a timeframe.
    pub fn current(&self, timeframe: Timeframe) -> Option<&'a Bar> {
        self.frames.get(&timeframe).and_then(|bars| bars.last())
    }

    /// Close of the newest complete bar on a timeframe.
    pub fn close(&self, timeframe: Timeframe) -> Option<f64> {
        self.current(timeframe).map(|bar| bar.close)
    }
}
