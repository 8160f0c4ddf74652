//! Plain-text rendering of published views.
//!
//! Provides functions to format:
//! - the portfolio table with totals and allocation
//! - one instrument's indicator readings
//! - market breadth and top movers
//!
//! `TextReport` is a [`SnapshotListener`] that writes every published view
//! to any `Write` sink.

use std::io::Write;

use crate::domain::aggregation::{MarketOverview, PortfolioSnapshot};
use crate::domain::engine::PublishedView;
use crate::domain::error::LivefolioError;
use crate::domain::indicator::{IndicatorSnapshot, IndicatorType, Reading};
use crate::domain::ledger::FillRecord;
use crate::domain::tick::Quote;
use crate::ports::snapshot_port::SnapshotListener;

const NA: &str = "n/a";

fn signed(value: f64) -> String {
    format!("{:+.2}", value)
}

fn reading(value: Reading<f64>) -> String {
    value.value().map_or_else(|| NA.to_string(), |v| format!("{:.2}", v))
}

fn indicator_cell(snapshot: &IndicatorSnapshot, indicator: IndicatorType) -> String {
    match indicator {
        IndicatorType::Sma(20) => reading(snapshot.sma20),
        IndicatorType::Sma(50) => reading(snapshot.sma50),
        IndicatorType::Sma(200) => reading(snapshot.sma200),
        IndicatorType::Ema(12) => reading(snapshot.ema12),
        IndicatorType::Ema(26) => reading(snapshot.ema26),
        IndicatorType::Rsi(_) => reading(snapshot.rsi14),
        IndicatorType::Macd { .. } => snapshot.macd.value().map_or_else(
            || NA.to_string(),
            |m| {
                format!(
                    "line {:.4}  signal {:.4}  hist {:+.4}",
                    m.line, m.signal, m.histogram
                )
            },
        ),
        IndicatorType::Bollinger { .. } => snapshot.bollinger.value().map_or_else(
            || NA.to_string(),
            |b| format!("{:.2} / {:.2} / {:.2}", b.upper, b.mid, b.lower),
        ),
        _ => NA.to_string(),
    }
}

pub fn format_portfolio(snapshot: &PortfolioSnapshot) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<8} {:>8} {:>10} {:>10} {:>12} {:>11} {:>8}\n",
        "Symbol", "Shares", "AvgCost", "Price", "Value", "Gain/Loss", "G/L%"
    ));

    if snapshot.holdings.is_empty() {
        output.push_str("(no holdings)\n");
    }
    for row in &snapshot.holdings {
        output.push_str(&format!(
            "{:<8} {:>8} {:>10.2} {:>10.2} {:>12.2} {:>11} {:>7.2}%\n",
            row.symbol,
            row.shares,
            row.avg_cost,
            row.current_price,
            row.market_value,
            signed(row.gain_loss),
            row.gain_loss_percent,
        ));
    }

    output.push_str(&format!(
        "Total value {:.2}  cost {:.2}  gain/loss {} ({:+.2}%)\n",
        snapshot.total_value,
        snapshot.total_cost,
        signed(snapshot.total_gain_loss),
        snapshot.total_gain_loss_percent,
    ));

    if !snapshot.allocation.is_empty() {
        let parts: Vec<String> = snapshot
            .allocation
            .iter()
            .map(|a| format!("{} {:.1}%", a.symbol, a.percent_of_total))
            .collect();
        output.push_str(&format!("Allocation: {}\n", parts.join(", ")));
    }
    output
}

pub fn format_indicators(snapshot: &IndicatorSnapshot) -> String {
    let mut output = format!("{} ({} samples", snapshot.symbol, snapshot.samples);
    if let Some(last) = snapshot.last {
        output.push_str(&format!(", last {:.2}", last));
    }
    output.push_str(")\n");

    for indicator in IndicatorType::snapshot_set() {
        output.push_str(&format!(
            "  {:<16} {}\n",
            indicator.to_string(),
            indicator_cell(snapshot, indicator)
        ));
    }
    output
}

fn mover(quote: &Quote) -> String {
    format!(
        "{} {:.2} ({:+.2}%)",
        quote.symbol, quote.price, quote.change_percent
    )
}

pub fn format_overview(overview: &MarketOverview) -> String {
    let mut output = format!(
        "Advancing {}  declining {}  unchanged {}\n",
        overview.advancing, overview.declining, overview.unchanged
    );
    if !overview.top_gainers.is_empty() {
        let list: Vec<String> = overview.top_gainers.iter().map(mover).collect();
        output.push_str(&format!("Top gainers: {}\n", list.join(", ")));
    }
    if !overview.top_losers.is_empty() {
        let list: Vec<String> = overview.top_losers.iter().map(mover).collect();
        output.push_str(&format!("Top losers: {}\n", list.join(", ")));
    }
    output
}

pub fn format_trades(trades: &[FillRecord]) -> String {
    if trades.is_empty() {
        return "(no trades)\n".to_string();
    }
    let mut output = String::new();
    for t in trades {
        output.push_str(&format!(
            "{} {} {:<4} {:<8} {:>6} @ {:>10.2} = {:>12.2}\n",
            t.id,
            t.timestamp.format("%Y-%m-%d %H:%M:%S"),
            t.side.to_string(),
            t.symbol,
            t.quantity,
            t.price,
            t.total,
        ));
    }
    output
}

pub fn format_view(view: &PublishedView) -> String {
    let mut output = format!("== version {}", view.version);
    if let Some(at) = view.published_at {
        output.push_str(&format!(" at {}", at.format("%Y-%m-%d %H:%M:%S")));
    }
    output.push_str(" ==\n");
    output.push_str(&format_overview(&view.overview));
    output.push_str(&format_portfolio(&view.portfolio));
    output
}

/// Writes each published view as text.
pub struct TextReport<W> {
    out: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        TextReport { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SnapshotListener for TextReport<W> {
    fn on_publish(&mut self, view: &PublishedView) -> Result<(), LivefolioError> {
        self.out.write_all(format_view(view).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
