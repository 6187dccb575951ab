//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and losses over the slice.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Edge cases: no losses → 100, no gains → 0. Needs `period + 1` bars.

use crate::domain::Bar;

pub fn rsi(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period + 1 {
        return None;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = bars[i].close - bars[i - 1].close;
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    // Wilder smoothing for the rest of the slice.
    let alpha = 1.0 / period as f64;
    for i in (period + 1)..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };
        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
    }

    if avg_loss < 1e-15 {
        return Some(if avg_gain > 0.0 { 100.0 } else { 50.0 });
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}
