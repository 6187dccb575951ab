//! Strategy evaluator.
//!
//! Strategies are a closed set of parameterized templates instantiated from
//! genomes. Evaluation is pure: one call per finest-timeframe bar, reading
//! only the market view and account snapshot it is handed, emitting intents
//! and holding no state between calls.

mod channel_breakout;
mod genome;
mod ma_crossover;
mod rsi_reversion;

pub use channel_breakout::ChannelBreakout;
pub use genome::{Genome, GenomeError, ParamKind, ParamSpec, ParamValue, TemplateId};
pub use ma_crossover::MaCrossover;
pub use rsi_reversion::RsiReversion;

use crate::domain::{AccountState, Intent, Timeframe};
use crate::store::MarketState;

/// A configured, evaluable strategy.
#[derive(Debug, Clone)]
pub enum Strategy {
    MaCrossover(MaCrossover),
    ChannelBreakout(ChannelBreakout),
    RsiReversion(RsiReversion),
}

impl Strategy {
    /// Validate a genome and instantiate the template it encodes.
    pub fn from_genome(genome: &Genome) -> Result<Strategy, GenomeError> {
        genome.validate()?;
        Ok(match genome.template {
            TemplateId::MaCrossover => Strategy::MaCrossover(MaCrossover::from_genome(genome)),
            TemplateId::ChannelBreakout => {
                Strategy::ChannelBreakout(ChannelBreakout::from_genome(genome))
            }
            TemplateId::RsiReversion => Strategy::RsiReversion(RsiReversion::from_genome(genome)),
        })
    }

    /// The timeframes this strategy needs in its market view.
    pub fn timeframes(&self) -> Vec<Timeframe> {
        match self {
            Strategy::MaCrossover(s) => s.timeframes(),
            Strategy::ChannelBreakout(s) => s.timeframes(),
            Strategy::RsiReversion(s) => s.timeframes(),
        }
    }

    /// Finest-timeframe bars required before the strategy can emit signals.
    pub fn warmup_bars(&self) -> usize {
        match self {
            Strategy::MaCrossover(s) => s.warmup_bars(),
            Strategy::ChannelBreakout(s) => s.warmup_bars(),
            Strategy::RsiReversion(s) => s.warmup_bars(),
        }
    }

    /// Evaluate one step. Never mutates anything; intents carry all output.
    pub fn decide(&self, market: &MarketState<'_>, account: &AccountState) -> Vec<Intent> {
        match self {
            Strategy::MaCrossover(s) => s.decide(market, account),
            Strategy::ChannelBreakout(s) => s.decide(market, account),
            Strategy::RsiReversion(s) => s.decide(market, account),
        }
    }
}
