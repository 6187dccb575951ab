//! FxLab Core — deterministic multi-timeframe forex backtesting engine.
//!
//! This crate contains the engine proper:
//! - Domain types (bars, timeframes, accounts, positions, intents, trades)
//! - Multi-timeframe bar store with strict no-lookahead views
//! - Closed set of genome-parameterized strategy templates
//! - Fill & risk simulator (session/risk/sizing gates, costs, exits)
//! - Bar-by-bar backtest runner with cancellation
//! - Execution bridge sharing the simulator's gate with live adapters
//! - BLAKE3-derived deterministic RNG hierarchy

pub mod bridge;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod rng;
pub mod sim;
pub mod store;
pub mod strategy;
