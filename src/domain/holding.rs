//! A single portfolio holding and its per-row valuation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub shares: i64,
    pub avg_cost: f64,
    pub current_price: f64,
}

impl Holding {
    pub fn market_value(&self) -> f64 {
        self.shares as f64 * self.current_price
    }

    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.avg_cost
    }

    /// (current_price - avg_cost) * shares
    pub fn gain_loss(&self) -> f64 {
        (self.current_price - self.avg_cost) * self.shares as f64
    }

    /// Gain/loss as a percentage of cost basis; 0 when there is no basis.
    pub fn gain_loss_percent(&self) -> f64 {
        let basis = self.cost_basis();
        if basis > 0.0 {
            self.gain_loss() / basis * 100.0
        } else {
            0.0
        }
    }
}
