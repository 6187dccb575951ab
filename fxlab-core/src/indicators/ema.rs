//! Exponential Moving Average (EMA).
//!
//! Seeded with the SMA of the first `period` closes, then smoothed with
//! alpha = 2 / (period + 1) over the rest of the slice.

use crate::domain::Bar;

pub fn ema(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let seed: f64 = bars[..period].iter().map(|b| b.close).sum::<f64>() / period as f64;
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut value = seed;
    for bar in &bars[period..] {
        value = alpha * bar.close + (1.0 - alpha) * value;
    }
    Some(value)
}
