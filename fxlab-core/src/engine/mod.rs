//! Backtest engine: the deterministic replay loop and its outputs.

mod cancel;
mod equity;
mod runner;

pub use cancel::CancelToken;
pub use equity::{curve_span, EquityPoint};
pub use runner::{BacktestRunner, ConstraintFlags, RunError, RunReport};
