//! Technical indicators as pure functions over completed bars.
//!
//! Each function reads a visible-history slice (oldest first) and returns
//! the indicator value at the newest bar, or `None` when the window is too
//! short. Because the inputs come from `MarketState`, no function can see a
//! bar that has not closed yet.

pub mod atr;
pub mod donchian;
pub mod ema;
pub mod rsi;
pub mod sma;

pub use atr::atr;
pub use donchian::donchian;
pub use ema::ema;
pub use rsi::rsi;
pub use sma::sma;
