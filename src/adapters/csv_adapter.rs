//! CSV replay adapters: recorded price ticks and recorded fills.
//!
//! Tick files carry `symbol,timestamp,price` rows with RFC 3339 timestamps.
//! Rows sharing a timestamp form one batch; batches replay in time order,
//! one per price cycle. Fill files carry `symbol,side,quantity,price` rows.

use crate::domain::error::LivefolioError;
use crate::domain::ledger::{OrderFill, Side};
use crate::domain::tick::PriceTick;
use crate::ports::market_data_port::MarketDataPort;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TickRow {
    symbol: String,
    timestamp: DateTime<Utc>,
    price: f64,
}

#[derive(Debug, Deserialize)]
struct FillRow {
    symbol: String,
    side: String,
    quantity: i64,
    price: f64,
}

fn read_file(path: &Path) -> Result<String, LivefolioError> {
    fs::read_to_string(path).map_err(|e| LivefolioError::MarketData {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn parse_error(path: &Path, e: csv::Error) -> LivefolioError {
    LivefolioError::MarketData {
        reason: format!("CSV parse error in {}: {}", path.display(), e),
    }
}

pub struct CsvTickFeed {
    symbols: Vec<String>,
    batches: VecDeque<Vec<PriceTick>>,
}

impl CsvTickFeed {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LivefolioError> {
        let path = path.as_ref();
        let content = read_file(path)?;
        Self::from_reader(content.as_bytes()).map_err(|e| parse_error(path, e))
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut ticks = Vec::new();
        for result in rdr.deserialize() {
            let row: TickRow = result?;
            ticks.push(PriceTick::new(row.symbol.to_uppercase(), row.price, row.timestamp));
        }
        Ok(Self::from_ticks(ticks))
    }

    /// Order is stable within a timestamp, so file order decides ties.
    pub fn from_ticks(mut ticks: Vec<PriceTick>) -> Self {
        ticks.sort_by_key(|t| t.timestamp);

        let mut symbols: Vec<String> = ticks.iter().map(|t| t.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();

        let mut batches: VecDeque<Vec<PriceTick>> = VecDeque::new();
        for tick in ticks {
            match batches.back_mut() {
                Some(batch) if batch[0].timestamp == tick.timestamp => batch.push(tick),
                _ => batches.push_back(vec![tick]),
            }
        }

        CsvTickFeed { symbols, batches }
    }

    pub fn remaining_batches(&self) -> usize {
        self.batches.len()
    }
}

impl MarketDataPort for CsvTickFeed {
    fn symbols(&self) -> Vec<String> {
        self.symbols.clone()
    }

    fn next_batch(&mut self, _at: DateTime<Utc>) -> Result<Vec<PriceTick>, LivefolioError> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }

    fn is_exhausted(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Load recorded fills in file order.
pub fn load_fills<P: AsRef<Path>>(path: P) -> Result<Vec<OrderFill>, LivefolioError> {
    let path = path.as_ref();
    let content = read_file(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut fills = Vec::new();
    for result in rdr.deserialize() {
        let row: FillRow = result.map_err(|e| parse_error(path, e))?;
        let side: Side = row.side.parse()?;
        fills.push(OrderFill {
            symbol: row.symbol.to_uppercase(),
            side,
            quantity: row.quantity,
            price: row.price,
        });
    }
    Ok(fills)
}
