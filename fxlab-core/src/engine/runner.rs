//! The backtest runner: one strategy over one bar store, start to finish.
//!
//! Each step replays one finest-timeframe bar in a fixed order: fill the
//! intents queued on the previous bar at this bar's open, run exit checks
//! over the bar's range, mark to market at the close, then let the strategy
//! see the bar and queue intents for the next one. Signals on the final bar
//! are dropped; whatever is still open is closed at that bar's close.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    AccountState, ExitReason, Intent, PolicyError, RejectedIntent, RiskPolicy, TradeRecord,
};
use crate::sim::{apply_intent, close_all, manage_bar, CostModel, FillOutcome};
use crate::store::{BarStore, DataError};
use crate::strategy::{Genome, GenomeError, Strategy};

use super::cancel::CancelToken;
use super::equity::EquityPoint;

/// Risk ceilings that were hit at least once during the run. The run keeps
/// going; the flags feed the fitness penalty downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintFlags {
    pub daily_loss_breached: bool,
    pub drawdown_breached: bool,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub instrument: String,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub rejections: Vec<RejectedIntent>,
    pub violations: ConstraintFlags,
    pub bars_processed: usize,
}

/// Fatal run failures. Policy rejections are not here; they are recorded in
/// the report and the run continues.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Genome(#[from] GenomeError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error("run cancelled")]
    Cancelled,
}

/// Drives one backtest over a shared, immutable bar store.
///
/// The runner owns no market data; many runners can replay the same store
/// concurrently.
#[derive(Debug, Clone)]
pub struct BacktestRunner<'a> {
    store: &'a BarStore,
    policy: RiskPolicy,
    costs: CostModel,
    initial_balance: f64,
    history: usize,
    cancel: CancelToken,
}

impl<'a> BacktestRunner<'a> {
    pub fn new(
        store: &'a BarStore,
        policy: RiskPolicy,
        costs: CostModel,
        initial_balance: f64,
    ) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            store,
            policy,
            costs,
            initial_balance,
            history: 512,
            cancel: CancelToken::new(),
        })
    }

    /// Cap on visible bars per timeframe in the strategy's market view.
    /// Raised automatically if a strategy needs a longer warmup.
    pub fn with_history(mut self, history: usize) -> Self {
        self.history = history;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run_genome(&self, genome: &Genome) -> Result<RunReport, RunError> {
        let strategy = Strategy::from_genome(genome)?;
        self.run(&strategy)
    }

    pub fn run(&self, strategy: &Strategy) -> Result<RunReport, RunError> {
        let timeframes = strategy.timeframes();
        let base_bars = self.store.base_series().bars();
        if let (Some(first), Some(last)) = (base_bars.first(), base_bars.last()) {
            self.store
                .check_coverage(&timeframes, first.timestamp, last.close_time())?;
        }
        let history = self.history.max(strategy.warmup_bars() + 1);

        let mut account = AccountState::new(self.initial_balance);
        let mut equity_curve = Vec::with_capacity(base_bars.len());
        let mut trades = Vec::new();
        let mut rejections = Vec::new();
        let mut violations = ConstraintFlags::default();
        let mut pending: Vec<Intent> = Vec::new();

        for (index, bar) in base_bars.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            account.roll_day(bar.timestamp.date_naive());

            for intent in pending.drain(..) {
                match apply_intent(&intent, &mut account, &self.policy, &self.costs, bar) {
                    FillOutcome::Closed { trades: closed } => trades.extend(closed),
                    FillOutcome::Rejected(rejected) => rejections.push(rejected),
                    FillOutcome::Opened { .. } | FillOutcome::Modified { .. } | FillOutcome::NoOp => {}
                }
            }

            trades.extend(manage_bar(&mut account, &self.policy, &self.costs, bar));

            let last_bar = index + 1 == base_bars.len();
            if last_bar && !account.positions.is_empty() {
                trades.extend(close_all(
                    &mut account,
                    &self.costs,
                    self.store.instrument(),
                    bar.close,
                    bar.close_time(),
                    ExitReason::EndOfData,
                ));
            }

            account.mark_to_market(bar.close);
            self.note_violations(&account, &mut violations);
            equity_curve.push(EquityPoint {
                timestamp: bar.close_time(),
                balance: account.balance,
                equity: account.equity,
                drawdown: account.current_drawdown(),
            });

            if !last_bar {
                let market = self.store.market_state_at(index, &timeframes, history)?;
                pending = strategy.decide(&market, &account);
            }
        }

        Ok(RunReport {
            instrument: self.store.instrument().to_string(),
            initial_balance: self.initial_balance,
            final_balance: account.balance,
            equity_curve,
            trades,
            rejections,
            violations,
            bars_processed: base_bars.len(),
        })
    }

    fn note_violations(&self, account: &AccountState, violations: &mut ConstraintFlags) {
        if account.daily_pnl <= -(self.policy.max_daily_loss * account.day_start_balance) {
            violations.daily_loss_breached = true;
        }
        if account.current_drawdown() >= self.policy.max_drawdown {
            violations.drawdown_breached = true;
        }
    }
}
