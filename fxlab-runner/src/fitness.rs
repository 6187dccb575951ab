//! Fitness scoring — turns a run report into the scalar the optimizer ranks.

use serde::{Deserialize, Serialize};

use fxlab_core::domain::{RejectedIntent, TradeRecord};
use fxlab_core::engine::{ConstraintFlags, EquityPoint};
use fxlab_core::strategy::Genome;

use crate::metrics::PerformanceMetrics;

/// Fitness assigned to genomes whose evaluation failed outright. Any
/// genome that actually ran scores above this.
pub const WORST_FITNESS: f64 = -1.0e12;

/// Profit factor is capped before it enters the score so a couple of
/// lucky trades with no losers cannot dominate the ranking.
const PROFIT_FACTOR_CAP: f64 = 5.0;

const DRAWDOWN_WEIGHT: f64 = 2.0;
const VIOLATION_PENALTY: f64 = 0.5;

/// Everything the optimizer keeps per evaluated genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessResult {
    pub genome: Genome,
    pub fitness: f64,
    pub metrics: Option<PerformanceMetrics>,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub rejections: Vec<RejectedIntent>,
    pub violations: ConstraintFlags,
    /// True when evaluation failed and `fitness` is `WORST_FITNESS`.
    pub failed: bool,
    pub config_hash: String,
}

impl FitnessResult {
    /// A placeholder for a genome whose run failed; the failure is
    /// recorded, the generation proceeds.
    pub fn failure(genome: Genome, config_hash: String) -> Self {
        Self {
            genome,
            fitness: WORST_FITNESS,
            metrics: None,
            equity_curve: Vec::new(),
            trades: Vec::new(),
            rejections: Vec::new(),
            violations: ConstraintFlags::default(),
            failed: true,
            config_hash,
        }
    }
}

/// Composite score: return plus capped profit factor, minus drawdown and
/// constraint-violation penalties. Violators are penalized, never excluded.
pub fn score(metrics: &PerformanceMetrics, violations: ConstraintFlags) -> f64 {
    let pf = if metrics.profit_factor.is_finite() {
        metrics.profit_factor.min(PROFIT_FACTOR_CAP)
    } else {
        PROFIT_FACTOR_CAP
    };
    let mut violation_count = 0.0;
    if violations.daily_loss_breached {
        violation_count += 1.0;
    }
    if violations.drawdown_breached {
        violation_count += 1.0;
    }
    metrics.total_return + 0.1 * pf
        - DRAWDOWN_WEIGHT * metrics.max_drawdown
        - VIOLATION_PENALTY * violation_count
}
