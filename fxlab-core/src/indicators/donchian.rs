//! Donchian channel: highest high and lowest low over a lookback window.

use crate::domain::Bar;

/// Channel bounds over the last `period` bars, `(upper, lower)`.
pub fn donchian(bars: &[Bar], period: usize) -> Option<(f64, f64)> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let window = &bars[bars.len() - period..];
    let upper = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let lower = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    Some((upper, lower))
}
