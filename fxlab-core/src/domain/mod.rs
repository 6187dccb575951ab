//! Domain types: bars, accounts, positions, intents, policies, trade logs.

pub mod account;
pub mod bar;
pub mod intent;
pub mod policy;
pub mod trade;

pub use account::{AccountState, Direction, Position};
pub use bar::{Bar, Timeframe};
pub use intent::{Intent, IntentAction};
pub use policy::{PolicyError, RiskPolicy, SessionWindow, TrailingRule};
pub use trade::{ExitReason, RejectReason, RejectedIntent, TradeRecord};
