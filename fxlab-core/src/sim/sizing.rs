//! Risk-based position sizing.
//!
//! Trade size is derived from the account and the stop distance so that a
//! stop-out loses a fixed fraction of the balance. The strategy's size hint
//! is never consulted.

/// Units such that `size * stop_distance == balance * risk_fraction`.
///
/// Returns `None` when the stop distance is zero or negative, in which case
/// the intent cannot be sized and must be rejected upstream.
pub fn position_size(balance: f64, risk_fraction: f64, stop_distance: f64) -> Option<f64> {
    if stop_distance <= 0.0 || balance <= 0.0 || risk_fraction <= 0.0 {
        return None;
    }
    Some(balance * risk_fraction / stop_distance)
}

/// Margin a position of `size` units at `price` ties up under `leverage`.
pub fn required_margin(size: f64, price: f64, leverage: f64) -> f64 {
    size * price / leverage
}
