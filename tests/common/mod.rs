#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use livefolio::domain::engine::{EngineConfig, MarketEngine, PublishedView};
use livefolio::domain::error::LivefolioError;
use livefolio::domain::holding::Holding;
use livefolio::domain::ledger::PortfolioLedger;
use livefolio::domain::tick::PriceTick;
use livefolio::ports::market_data_port::MarketDataPort;
use livefolio::ports::snapshot_port::SnapshotListener;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}

pub fn at_seconds(seconds: i64) -> DateTime<Utc> {
    base_time() + Duration::seconds(seconds)
}

pub fn tick(symbol: &str, price: f64) -> PriceTick {
    PriceTick::new(symbol, price, base_time())
}

pub fn holding(symbol: &str, shares: i64, avg_cost: f64, current_price: f64) -> Holding {
    Holding {
        symbol: symbol.to_string(),
        shares,
        avg_cost,
        current_price,
    }
}

pub fn engine() -> MarketEngine {
    MarketEngine::new(EngineConfig::default())
}

pub fn engine_with(holdings: &[Holding]) -> MarketEngine {
    let mut ledger = PortfolioLedger::new();
    for h in holdings {
        ledger.insert_holding(h.clone()).unwrap();
    }
    MarketEngine::with_ledger(EngineConfig::default(), ledger)
}

/// Feed that replays scripted batches, then reports exhaustion.
pub struct ScriptedFeed {
    pub batches: VecDeque<Vec<(String, f64)>>,
    pub fail_on_empty: bool,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self {
            batches: VecDeque::new(),
            fail_on_empty: false,
        }
    }

    pub fn with_batch(mut self, batch: &[(&str, f64)]) -> Self {
        self.batches.push_back(
            batch
                .iter()
                .map(|(s, p)| (s.to_string(), *p))
                .collect(),
        );
        self
    }

    /// One batch per price in `prices`, each with a single tick of `symbol`.
    pub fn with_prices(mut self, symbol: &str, prices: &[f64]) -> Self {
        for p in prices {
            self = self.with_batch(&[(symbol, *p)]);
        }
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_on_empty = true;
        self
    }
}

impl MarketDataPort for ScriptedFeed {
    fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .batches
            .iter()
            .flat_map(|b| b.iter().map(|(s, _)| s.clone()))
            .collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }

    fn next_batch(&mut self, at: DateTime<Utc>) -> Result<Vec<PriceTick>, LivefolioError> {
        match self.batches.pop_front() {
            Some(batch) => Ok(batch
                .into_iter()
                .map(|(s, p)| PriceTick::new(s, p, at))
                .collect()),
            None if self.fail_on_empty => Err(LivefolioError::MarketData {
                reason: "feed disconnected".into(),
            }),
            None => Ok(Vec::new()),
        }
    }

    fn is_exhausted(&self) -> bool {
        self.batches.is_empty() && !self.fail_on_empty
    }
}

/// Listener recording every published version into a shared log.
#[derive(Clone, Default)]
pub struct RecordingListener {
    pub views: Arc<Mutex<Vec<Arc<PublishedView>>>>,
}

impl RecordingListener {
    pub fn versions(&self) -> Vec<u64> {
        self.views.lock().unwrap().iter().map(|v| v.version).collect()
    }
}

impl SnapshotListener for RecordingListener {
    fn on_publish(&mut self, view: &PublishedView) -> Result<(), LivefolioError> {
        self.views.lock().unwrap().push(Arc::new(view.clone()));
        Ok(())
    }
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
