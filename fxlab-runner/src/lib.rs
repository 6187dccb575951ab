//! FxLab Runner — orchestration around the engine.
//!
//! Everything here sits between the CLI and `fxlab-core`:
//! - `config`: TOML run configuration with a content-addressed hash
//! - `data_loader`: CSV bar import plus higher-timeframe derivation
//! - `metrics` / `fitness`: pure scoring of finished runs
//! - `runner`: one genome in, one `FitnessResult` out
//! - `optimizer`: the seeded genetic evolve loop
//! - `export`: JSON/CSV artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod fitness;
pub mod metrics;
pub mod optimizer;
pub mod runner;

pub use config::{ConfigError, OptimizerConfig, RunConfig};
pub use data_loader::{load_series, load_store, LoadError};
pub use export::{export_evolution, export_run, ExportError};
pub use fitness::{FitnessResult, WORST_FITNESS};
pub use metrics::PerformanceMetrics;
pub use optimizer::{EvolveOutcome, GenerationSummary, GeneticOptimizer, StopReason};
pub use runner::run_backtest;
