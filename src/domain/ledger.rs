//! Portfolio ledger: holdings ownership, average-cost accounting and the
//! trade log.
//!
//! Buys move the average cost; sells only reduce shares. A holding whose
//! shares reach zero is removed. Overselling is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::error::LivefolioError;
use super::holding::Holding;
use super::tick::PriceTick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = LivefolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(LivefolioError::invalid_order(format!(
                "unknown side '{}'",
                other
            ))),
        }
    }
}

/// An execution reported by the order-execution collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFill {
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub price: f64,
}

impl OrderFill {
    pub fn buy(symbol: impl Into<String>, quantity: i64, price: f64) -> Self {
        OrderFill {
            symbol: symbol.into(),
            side: Side::Buy,
            quantity,
            price,
        }
    }

    pub fn sell(symbol: impl Into<String>, quantity: i64, price: f64) -> Self {
        OrderFill {
            symbol: symbol.into(),
            side: Side::Sell,
            quantity,
            price,
        }
    }
}

/// An accepted fill as recorded in the trade log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillRecord {
    pub id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub price: f64,
    pub total: f64,
    pub timestamp: DateTime<Utc>,
}

/// Round to accounting precision (cents).
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Cents-rounded average cost. A sub-cent average that would round to zero
/// is kept as is so a held position never carries a zero cost.
fn average_cost(raw: f64) -> f64 {
    let rounded = round_cents(raw);
    if rounded > 0.0 { rounded } else { raw }
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioLedger {
    holdings: BTreeMap<String, Holding>,
    history: Vec<FillRecord>,
}

impl PortfolioLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    /// Holdings ordered by symbol.
    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn clear(&mut self) {
        self.holdings.clear();
    }

    /// Seed a position directly, replacing any existing one for the symbol.
    pub fn insert_holding(&mut self, holding: Holding) -> Result<(), LivefolioError> {
        if holding.symbol.trim().is_empty() {
            return Err(LivefolioError::invalid_order("symbol must not be empty"));
        }
        if holding.shares <= 0 {
            return Err(LivefolioError::invalid_order("shares must be positive"));
        }
        if !(holding.avg_cost.is_finite() && holding.avg_cost > 0.0) {
            return Err(LivefolioError::invalid_order("average cost must be positive"));
        }
        if !(holding.current_price.is_finite() && holding.current_price >= 0.0) {
            return Err(LivefolioError::invalid_order(
                "current price must be non-negative",
            ));
        }
        self.holdings.insert(holding.symbol.clone(), holding);
        Ok(())
    }

    /// Apply one fill. On error the ledger is left untouched.
    pub fn apply_fill(
        &mut self,
        fill: &OrderFill,
        at: DateTime<Utc>,
    ) -> Result<FillRecord, LivefolioError> {
        if fill.quantity <= 0 {
            return Err(LivefolioError::invalid_order(format!(
                "quantity must be positive, got {}",
                fill.quantity
            )));
        }
        if !(fill.price.is_finite() && fill.price > 0.0) {
            return Err(LivefolioError::invalid_order(format!(
                "price must be positive, got {}",
                fill.price
            )));
        }
        if fill.symbol.trim().is_empty() {
            return Err(LivefolioError::invalid_order("symbol must not be empty"));
        }
        let total = fill.quantity as f64 * fill.price;
        if !total.is_finite() {
            return Err(LivefolioError::invalid_order(format!(
                "notional {} x {} is out of range",
                fill.quantity, fill.price
            )));
        }

        match fill.side {
            Side::Buy => self.buy(fill)?,
            Side::Sell => self.sell(fill)?,
        }

        let record = FillRecord {
            id: format!("TRD_{:06}", self.history.len() + 1),
            symbol: fill.symbol.clone(),
            side: fill.side,
            quantity: fill.quantity,
            price: fill.price,
            total,
            timestamp: at,
        };
        self.history.push(record.clone());
        Ok(record)
    }

    fn buy(&mut self, fill: &OrderFill) -> Result<(), LivefolioError> {
        match self.holdings.get_mut(&fill.symbol) {
            Some(existing) => {
                let total_shares = existing.shares.checked_add(fill.quantity).ok_or_else(|| {
                    LivefolioError::invalid_order(format!(
                        "{} shares of {} would overflow the holding",
                        fill.quantity, fill.symbol
                    ))
                })?;
                let total_cost = existing.shares as f64 * existing.avg_cost
                    + fill.quantity as f64 * fill.price;
                if !total_cost.is_finite() {
                    return Err(LivefolioError::invalid_order(format!(
                        "cost basis of {} is out of range",
                        fill.symbol
                    )));
                }
                existing.avg_cost = average_cost(total_cost / total_shares as f64);
                existing.shares = total_shares;
            }
            None => {
                self.holdings.insert(
                    fill.symbol.clone(),
                    Holding {
                        symbol: fill.symbol.clone(),
                        shares: fill.quantity,
                        avg_cost: fill.price,
                        current_price: fill.price,
                    },
                );
            }
        }
        Ok(())
    }

    fn sell(&mut self, fill: &OrderFill) -> Result<(), LivefolioError> {
        let held = self.holdings.get(&fill.symbol).map_or(0, |h| h.shares);
        if fill.quantity > held {
            return Err(LivefolioError::InsufficientShares {
                symbol: fill.symbol.clone(),
                requested: fill.quantity,
                held,
            });
        }

        if fill.quantity == held {
            self.holdings.remove(&fill.symbol);
        } else if let Some(existing) = self.holdings.get_mut(&fill.symbol) {
            existing.shares -= fill.quantity;
        }
        Ok(())
    }

    /// Set current prices from a tick batch. The last tick per symbol wins;
    /// holdings absent from the batch keep their last known price.
    /// Returns the number of holdings repriced.
    pub fn revalue_prices(&mut self, ticks: &[PriceTick]) -> usize {
        let mut latest: HashMap<&str, f64> = HashMap::new();
        for tick in ticks.iter().filter(|t| t.validate().is_ok()) {
            latest.insert(tick.symbol.as_str(), tick.price);
        }

        let mut repriced = 0;
        for holding in self.holdings.values_mut() {
            if let Some(&price) = latest.get(holding.symbol.as_str()) {
                holding.current_price = price;
                repriced += 1;
            }
        }
        repriced
    }

    /// The most recent `limit` fills, oldest first.
    pub fn history(&self, limit: usize) -> &[FillRecord] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }
}
