//! Bar store — immutable, time-ordered, multi-timeframe price series.
//!
//! A `BarStore` is built once, before a run starts, and shared read-only
//! across any number of concurrent backtests. Replay position lives in a
//! per-run `Cursor`, so the store itself never mutates during simulation.
//!
//! Data problems are fatal for the run and never silently patched:
//! - `DataError::OutOfOrder` — ingested bars violate monotonic time
//! - `DataError::Gap` — a subscribed timeframe has no bars covering the
//!   active window
//! - `DataError::Malformed` — OHLC sanity or timeframe mismatch

pub mod resample;
pub mod series;
pub mod view;

pub use resample::resample;
pub use series::BarSeries;
pub use view::MarketState;

use crate::domain::{Bar, Timeframe};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no {timeframe} bars cover the requested window")]
    Gap { timeframe: Timeframe },
    #[error("{timeframe} series violates monotonic time at {at}")]
    OutOfOrder {
        timeframe: Timeframe,
        at: DateTime<Utc>,
    },
    #[error("{timeframe} series is malformed: {detail}")]
    Malformed {
        timeframe: Timeframe,
        detail: String,
    },
}

/// Immutable multi-timeframe price history for one instrument.
#[derive(Debug, Clone)]
pub struct BarStore {
    instrument: String,
    base: Timeframe,
    series: BTreeMap<Timeframe, BarSeries>,
}

impl BarStore {
    /// Create a store from its finest series. Higher timeframes are added
    /// with [`BarStore::insert_series`] or derived via [`resample`].
    pub fn new(instrument: impl Into<String>, base_series: BarSeries) -> Self {
        let base = base_series.timeframe();
        let mut series = BTreeMap::new();
        series.insert(base, base_series);
        Self {
            instrument: instrument.into(),
            base,
            series,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// The finest subscribed timeframe; one simulation step = one bar close
    /// on this series.
    pub fn base_timeframe(&self) -> Timeframe {
        self.base
    }

    /// Add a coarser series. Rejected if it is not coarser than the base.
    pub fn insert_series(&mut self, series: BarSeries) -> Result<(), DataError> {
        if series.timeframe() <= self.base {
            return Err(DataError::Malformed {
                timeframe: series.timeframe(),
                detail: format!("series must be coarser than base {}", self.base),
            });
        }
        self.series.insert(series.timeframe(), series);
        Ok(())
    }

    /// Derive and register a coarser series by resampling the base series.
    pub fn derive(&mut self, target: Timeframe) -> Result<(), DataError> {
        let resampled = resample(self.base_series(), target)?;
        self.series.insert(target, resampled);
        Ok(())
    }

    pub fn series(&self, timeframe: Timeframe) -> Result<&BarSeries, DataError> {
        self.series
            .get(&timeframe)
            .ok_or(DataError::Gap { timeframe })
    }

    pub fn base_series(&self) -> &BarSeries {
        &self.series[&self.base]
    }

    pub fn timeframes(&self) -> impl Iterator<Item = Timeframe> + '_ {
        self.series.keys().copied()
    }

    /// Verify every subscribed timeframe overlaps the `[start, end]` window.
    ///
    /// A higher timeframe legitimately has no complete bar for the first few
    /// steps of a run (warmup); a series with no overlap at all is a data
    /// gap and fatal.
    pub fn check_coverage(
        &self,
        timeframes: &[Timeframe],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), DataError> {
        for &tf in timeframes {
            let series = self.series(tf)?;
            let overlaps = match (series.first_timestamp(), series.last_timestamp()) {
                (Some(first), Some(last)) => first <= end && last + tf.duration() >= start,
                _ => false,
            };
            if !overlaps {
                return Err(DataError::Gap { timeframe: tf });
            }
        }
        Ok(())
    }

    /// Build the no-lookahead market view as of base bar `index`.
    ///
    /// The simulated instant is that bar's close time; each requested
    /// timeframe contributes its complete bars, capped to the most recent
    /// `history` of them.
    pub fn market_state_at(
        &self,
        index: usize,
        timeframes: &[Timeframe],
        history: usize,
    ) -> Result<MarketState<'_>, DataError> {
        let base_bars = self.base_series().bars();
        let bar = base_bars.get(index).ok_or(DataError::Gap {
            timeframe: self.base,
        })?;
        let instant = bar.close_time();

        let mut frames: BTreeMap<Timeframe, &[Bar]> = BTreeMap::new();
        for &tf in timeframes {
            let visible = self.series(tf)?.visible_at(instant);
            let capped = &visible[visible.len().saturating_sub(history)..];
            frames.insert(tf, capped);
        }
        // The base frame is always present: a strategy's decision timeframe
        // is the store's finest series.
        if !frames.contains_key(&self.base) {
            let visible = self.base_series().visible_at(instant);
            let capped = &visible[visible.len().saturating_sub(history)..];
            frames.insert(self.base, capped);
        }

        Ok(MarketState::new(&self.instrument, instant, frames))
    }
}

/// Per-run replay position over a shared `BarStore`.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    store: &'a BarStore,
    index: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(store: &'a BarStore) -> Self {
        Self { store, index: 0 }
    }

    pub fn store(&self) -> &'a BarStore {
        self.store
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Move to the first base bar opening at or after `at`.
    pub fn advance_to(&mut self, at: DateTime<Utc>) -> Result<(), DataError> {
        let series = self.store.base_series();
        let idx = series.index_at_or_after(at);
        if idx >= series.len() {
            return Err(DataError::Gap {
                timeframe: self.store.base_timeframe(),
            });
        }
        self.index = idx;
        Ok(())
    }

    /// The bar the cursor currently points at.
    pub fn bar(&self) -> Option<&'a Bar> {
        self.store.base_series().bars().get(self.index)
    }

    /// Advance one step. Returns false once the series is exhausted.
    pub fn step(&mut self) -> bool {
        if self.index + 1 < self.store.base_series().len() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn market_state(
        &self,
        timeframes: &[Timeframe],
        history: usize,
    ) -> Result<MarketState<'a>, DataError> {
        self.store.market_state_at(self.index, timeframes, history)
    }
}
