//! Price ticks and per-symbol quotes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::LivefolioError;

/// One price observation for an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceTick {
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: DateTime<Utc>) -> Self {
        PriceTick {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }

    /// Rejects non-positive and non-finite prices.
    pub fn validate(&self) -> Result<(), LivefolioError> {
        if self.price.is_finite() && self.price > 0.0 {
            Ok(())
        } else {
            Err(LivefolioError::InvalidTick {
                symbol: self.symbol.clone(),
                price: self.price,
            })
        }
    }
}

/// Latest price for a symbol together with its move against the previous one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// First quote for a symbol: no previous price, so no move.
    pub fn opening(tick: &PriceTick) -> Self {
        Quote {
            symbol: tick.symbol.clone(),
            price: tick.price,
            change: 0.0,
            change_percent: 0.0,
            timestamp: tick.timestamp,
        }
    }

    /// Next quote after `tick`, measured against this one.
    pub fn advance(&self, tick: &PriceTick) -> Self {
        let change = tick.price - self.price;
        let change_percent = if self.price > 0.0 {
            change / self.price * 100.0
        } else {
            0.0
        };
        Quote {
            symbol: tick.symbol.clone(),
            price: tick.price,
            change,
            change_percent,
            timestamp: tick.timestamp,
        }
    }
}
