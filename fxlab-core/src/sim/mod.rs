//! Fill & risk simulator.
//!
//! Turns intents into fills under the risk policy and cost model, and runs
//! the per-bar exit checks for open positions. Everything here is
//! synchronous and deterministic; the engine owns the ordering.

mod costs;
mod exits;
mod simulator;
mod sizing;

pub use costs::{CostModel, SlippageModel};
pub use exits::{close_all, manage_bar};
pub use simulator::{apply_intent, FillOutcome};
pub use sizing::{position_size, required_margin};
