//! Equity curve sampling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One equity-curve sample, taken after each base bar is fully processed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub balance: f64,
    pub equity: f64,
    /// Drawdown from the running peak, as a positive fraction.
    pub drawdown: f64,
}

/// First and last timestamps of an equity curve.
pub fn curve_span(curve: &[EquityPoint]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match (curve.first(), curve.last()) {
        (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(hour: u32) -> EquityPoint {
        EquityPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap(),
            balance: 10_000.0,
            equity: 10_000.0,
            drawdown: 0.0,
        }
    }

    #[test]
    fn span_covers_first_and_last_points() {
        let curve = [point(1), point(2), point(7)];
        let (start, end) = curve_span(&curve).unwrap();
        assert_eq!(start, curve[0].timestamp);
        assert_eq!(end, curve[2].timestamp);
        assert_eq!(curve_span(&[]), None);
    }

    #[test]
    fn serializes_roundtrip() {
        let point = EquityPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            balance: 10_000.0,
            equity: 10_050.0,
            drawdown: 0.0,
        };
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(serde_json::from_str::<EquityPoint>(&json).unwrap(), point);
    }
}
