//! Resampling: build a higher-timeframe series from a finer one.
//!
//! Buckets are aligned to the target duration on the Unix epoch, so a
//! resampled H4 bar at 08:00 aggregates exactly the H1 bars 08:00-11:00.
//! Building higher timeframes this way guarantees the multi-timeframe
//! consistency invariant of the bar store: a higher-timeframe bar closes at
//! the same instant its last constituent closes.

use super::{BarSeries, DataError};
use crate::domain::{Bar, Timeframe};
use chrono::{DateTime, TimeZone, Utc};

/// Aggregate `source` into `target` timeframe bars.
///
/// Partial trailing buckets are kept: the last resampled bar may cover fewer
/// source bars, but it only becomes visible once its full bucket period has
/// elapsed, so the visibility check stays conservative.
pub fn resample(source: &BarSeries, target: Timeframe) -> Result<BarSeries, DataError> {
    if target <= source.timeframe() {
        return Err(DataError::Malformed {
            timeframe: target,
            detail: format!(
                "resample target {} is not coarser than source {}",
                target,
                source.timeframe()
            ),
        });
    }

    let mut out: Vec<Bar> = Vec::new();
    for bar in source.bars() {
        let bucket = bucket_start(bar.timestamp, target);
        match out.last_mut() {
            Some(last) if last.timestamp == bucket => {
                last.high = last.high.max(bar.high);
                last.low = last.low.min(bar.low);
                last.close = bar.close;
                last.volume += bar.volume;
            }
            _ => out.push(Bar {
                timestamp: bucket,
                timeframe: target,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            }),
        }
    }

    BarSeries::new(target, out)
}

/// Epoch-aligned bucket open time for a timestamp.
fn bucket_start(at: DateTime<Utc>, target: Timeframe) -> DateTime<Utc> {
    let secs = target.minutes() * 60;
    let bucket = at.timestamp().div_euclid(secs) * secs;
    Utc.timestamp_opt(bucket, 0).unwrap()
}
