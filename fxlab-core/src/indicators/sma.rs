//! Simple Moving Average (SMA).
//!
//! Mean of the last `period` closes. Needs `period` bars.

use crate::domain::Bar;

pub fn sma(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let window = &bars[bars.len() - period..];
    let sum: f64 = window.iter().map(|b| b.close).sum();
    Some(sum / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::testutil::bars_from_closes;

    #[test]
    fn sma_of_last_window() {
        let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(sma(&bars, 3), Some(4.0));
        assert_eq!(sma(&bars, 5), Some(3.0));
    }

    #[test]
    fn sma_insufficient_history() {
        let bars = bars_from_closes(&[1.0, 2.0]);
        assert_eq!(sma(&bars, 3), None);
        assert_eq!(sma(&bars, 0), None);
    }
}
