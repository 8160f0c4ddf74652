//! Portfolio aggregation: totals, gain/loss and allocation derived from the
//! ledger, plus the market overview derived from quotes.

use serde::Serialize;

use super::holding::Holding;
use super::ledger::PortfolioLedger;
use super::tick::Quote;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingRow {
    pub symbol: String,
    pub shares: i64,
    pub avg_cost: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
}

impl From<&Holding> for HoldingRow {
    fn from(h: &Holding) -> Self {
        HoldingRow {
            symbol: h.symbol.clone(),
            shares: h.shares,
            avg_cost: h.avg_cost,
            current_price: h.current_price,
            market_value: h.market_value(),
            gain_loss: h.gain_loss(),
            gain_loss_percent: h.gain_loss_percent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationRow {
    pub symbol: String,
    pub value: f64,
    pub percent_of_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub holdings: Vec<HoldingRow>,
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    /// Empty when the portfolio has no market value.
    pub allocation: Vec<AllocationRow>,
}

impl PortfolioSnapshot {
    pub fn compute(ledger: &PortfolioLedger) -> Self {
        let holdings: Vec<HoldingRow> = ledger.holdings().map(HoldingRow::from).collect();

        let total_value: f64 = holdings.iter().map(|r| r.market_value).sum();
        let total_cost: f64 = ledger.holdings().map(Holding::cost_basis).sum();
        let total_gain_loss = total_value - total_cost;
        let total_gain_loss_percent = if total_cost > 0.0 {
            total_gain_loss / total_cost * 100.0
        } else {
            0.0
        };

        let allocation = if total_value > 0.0 {
            holdings
                .iter()
                .map(|r| AllocationRow {
                    symbol: r.symbol.clone(),
                    value: r.market_value,
                    percent_of_total: r.market_value / total_value * 100.0,
                })
                .collect()
        } else {
            Vec::new()
        };

        PortfolioSnapshot {
            holdings,
            total_value,
            total_cost,
            total_gain_loss,
            total_gain_loss_percent,
            allocation,
        }
    }

    pub fn empty() -> Self {
        Self::compute(&PortfolioLedger::new())
    }
}

/// Breadth and top movers across all quoted symbols.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOverview {
    pub advancing: usize,
    pub declining: usize,
    pub unchanged: usize,
    pub top_gainers: Vec<Quote>,
    pub top_losers: Vec<Quote>,
}

impl MarketOverview {
    pub fn from_quotes<'a, I>(quotes: I, top_n: usize) -> Self
    where
        I: IntoIterator<Item = &'a Quote>,
    {
        let quotes: Vec<&Quote> = quotes.into_iter().collect();

        let advancing = quotes.iter().filter(|q| q.change > 0.0).count();
        let declining = quotes.iter().filter(|q| q.change < 0.0).count();
        let unchanged = quotes.len() - advancing - declining;

        let mut gainers: Vec<Quote> = quotes
            .iter()
            .filter(|q| q.change > 0.0)
            .map(|q| (*q).clone())
            .collect();
        gainers.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
        gainers.truncate(top_n);

        let mut losers: Vec<Quote> = quotes
            .iter()
            .filter(|q| q.change < 0.0)
            .map(|q| (*q).clone())
            .collect();
        losers.sort_by(|a, b| a.change_percent.total_cmp(&b.change_percent));
        losers.truncate(top_n);

        MarketOverview {
            advancing,
            declining,
            unchanged,
            top_gainers: gainers,
            top_losers: losers,
        }
    }
}
