//! A validated, immutable, time-ordered bar series for one timeframe.

use super::DataError;
use crate::domain::{Bar, Timeframe};
use chrono::{DateTime, Utc};

/// Time-ordered bars for a single timeframe.
///
/// Construction validates monotonic timestamps, timeframe consistency, and
/// OHLC sanity; a `BarSeries` that exists is safe to binary-search.
#[derive(Debug, Clone)]
pub struct BarSeries {
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(timeframe: Timeframe, bars: Vec<Bar>) -> Result<Self, DataError> {
        for (i, bar) in bars.iter().enumerate() {
            if bar.timeframe != timeframe {
                return Err(DataError::Malformed {
                    timeframe,
                    detail: format!(
                        "bar {} at {} carries timeframe {}",
                        i, bar.timestamp, bar.timeframe
                    ),
                });
            }
            if !bar.is_sane() {
                return Err(DataError::Malformed {
                    timeframe,
                    detail: format!("bar {} at {} fails OHLC sanity", i, bar.timestamp),
                });
            }
            if i > 0 && bars[i - 1].timestamp >= bar.timestamp {
                return Err(DataError::OutOfOrder {
                    timeframe,
                    at: bar.timestamp,
                });
            }
        }
        Ok(Self { timeframe, bars })
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }

    /// Bars that are complete at `instant`: every bar with
    /// `close_time() <= instant`. This is the only way simulation code reads
    /// a series, which is what makes lookahead impossible by construction.
    pub fn visible_at(&self, instant: DateTime<Utc>) -> &[Bar] {
        // close_time is monotonic because timestamps are and the duration is
        // constant, so partition_point is valid.
        let n = self
            .bars
            .partition_point(|bar| bar.close_time() <= instant);
        &self.bars[..n]
    }

    /// Index of the first bar opening at or after `at`.
    pub fn index_at_or_after(&self, at: DateTime<Utc>) -> usize {
        self.bars.partition_point(|bar| bar.timestamp < at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(hour: u32, minute: u32) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap(),
            timeframe: Timeframe::H1,
            open: 1.10,
            high: 1.11,
            low: 1.09,
            close: 1.105,
            volume: 1_000.0,
        }
    }

    #[test]
    fn accepts_monotonic_bars() {
        let series = BarSeries::new(Timeframe::H1, vec![bar(9, 0), bar(10, 0), bar(11, 0)]);
        assert_eq!(series.unwrap().len(), 3);
    }

    #[test]
    fn rejects_out_of_order() {
        let err = BarSeries::new(Timeframe::H1, vec![bar(10, 0), bar(9, 0)]).unwrap_err();
        assert!(matches!(err, DataError::OutOfOrder { .. }));
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let err = BarSeries::new(Timeframe::H1, vec![bar(10, 0), bar(10, 0)]).unwrap_err();
        assert!(matches!(err, DataError::OutOfOrder { .. }));
    }

    #[test]
    fn rejects_wrong_timeframe() {
        let mut b = bar(9, 0);
        b.timeframe = Timeframe::M5;
        let err = BarSeries::new(Timeframe::H1, vec![b]).unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }

    #[test]
    fn rejects_insane_bar() {
        let mut b = bar(9, 0);
        b.low = 2.0; // above high
        let err = BarSeries::new(Timeframe::H1, vec![b]).unwrap_err();
        assert!(matches!(err, DataError::Malformed { .. }));
    }

    #[test]
    fn visible_at_excludes_incomplete_bars() {
        let series =
            BarSeries::new(Timeframe::H1, vec![bar(9, 0), bar(10, 0), bar(11, 0)]).unwrap();

        // At 11:00 the 10:00 bar has just closed; the 11:00 bar is still forming.
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 11, 0, 0).unwrap();
        assert_eq!(series.visible_at(at).len(), 2);

        // At 12:00 all three are complete.
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(series.visible_at(at).len(), 3);

        // Before anything closed: nothing visible.
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
        assert!(series.visible_at(at).is_empty());
    }

    #[test]
    fn index_at_or_after_binary_search() {
        let series =
            BarSeries::new(Timeframe::H1, vec![bar(9, 0), bar(10, 0), bar(11, 0)]).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap();
        assert_eq!(series.index_at_or_after(at), 1);
        let late = Utc.with_ymd_and_hms(2024, 3, 4, 23, 0, 0).unwrap();
        assert_eq!(series.index_at_or_after(late), 3);
    }
}
