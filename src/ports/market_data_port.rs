//! Ports for the market-data and order-execution collaborators.

use chrono::{DateTime, Utc};

use crate::domain::error::LivefolioError;
use crate::domain::ledger::OrderFill;
use crate::domain::tick::PriceTick;

/// Source of price tick batches, one batch per price cycle.
pub trait MarketDataPort {
    /// Symbols this source can produce ticks for.
    fn symbols(&self) -> Vec<String>;

    /// Produce the next batch of ticks. `at` is the time of the price cycle;
    /// live sources stamp their ticks with it, replay sources keep theirs.
    fn next_batch(&mut self, at: DateTime<Utc>) -> Result<Vec<PriceTick>, LivefolioError>;

    /// True once the source will never produce another tick.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Source of order fills reported by the execution collaborator.
pub trait FillSource {
    /// Take every fill reported since the last call.
    fn drain_fills(&mut self) -> Vec<OrderFill>;
}

impl FillSource for Vec<OrderFill> {
    fn drain_fills(&mut self) -> Vec<OrderFill> {
        std::mem::take(self)
    }
}
