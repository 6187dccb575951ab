//! Average True Range (ATR).
//!
//! True range: max(high-low, |high-prev_close|, |low-prev_close|).
//! Wilder smoothing (alpha = 1/period), seeded with the mean of the first
//! `period` true ranges. Needs `period + 1` bars.

use crate::domain::Bar;

pub fn atr(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }

    let tr = |i: usize| -> f64 {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        (h - l).max((h - pc).abs()).max((l - pc).abs())
    };

    // Seed over true ranges 1..=period (index 0 has no previous close).
    let mut value = (1..=period).map(tr).sum::<f64>() / period as f64;

    let alpha = 1.0 / period as f64;
    for i in (period + 1)..bars.len() {
        value = alpha * tr(i) + (1.0 - alpha) * value;
    }
    Some(value)
}
