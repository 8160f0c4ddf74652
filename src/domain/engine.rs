//! The market engine: one owned instance holding every instrument series, the
//! portfolio ledger and the latest published view.
//!
//! All mutation goes through `&mut MarketEngine`. Each cycle applies its fills
//! and ticks, recomputes derived state, then publishes a new
//! [`PublishedView`] by swapping an `Arc` on the snapshot board. Readers never
//! see a partially applied cycle and a view is never mutated once published.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use super::aggregation::{MarketOverview, PortfolioSnapshot};
use super::error::LivefolioError;
use super::indicator::IndicatorSnapshot;
use super::ledger::{FillRecord, OrderFill, PortfolioLedger};
use super::series::{InstrumentSeries, DEFAULT_CAPACITY};
use super::tick::{PriceTick, Quote};
use crate::ports::snapshot_port::SnapshotListener;

pub const DEFAULT_TOP_MOVERS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub series_capacity: usize,
    pub top_movers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            series_capacity: DEFAULT_CAPACITY,
            top_movers: DEFAULT_TOP_MOVERS,
        }
    }
}

/// A complete, internally consistent view of the engine at one version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedView {
    pub version: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub portfolio: PortfolioSnapshot,
    pub indicators: BTreeMap<String, IndicatorSnapshot>,
    pub quotes: BTreeMap<String, Quote>,
    pub overview: MarketOverview,
}

/// Cloneable read handle onto the latest published view.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    board: Arc<RwLock<Arc<PublishedView>>>,
}

impl SnapshotReader {
    pub fn latest(&self) -> Arc<PublishedView> {
        Arc::clone(&*self.board.read())
    }

    pub fn version(&self) -> u64 {
        self.board.read().version
    }

    /// The latest view if it is newer than `version`.
    pub fn changed_since(&self, version: u64) -> Option<Arc<PublishedView>> {
        let current = self.latest();
        (current.version > version).then_some(current)
    }
}

#[derive(Debug)]
pub struct TickRejection {
    pub tick: PriceTick,
    pub error: LivefolioError,
}

#[derive(Debug)]
pub struct FillRejection {
    pub fill: OrderFill,
    pub error: LivefolioError,
}

/// Outcome of one applied cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Version published by this cycle; unchanged when nothing was applied.
    pub version: u64,
    pub accepted_ticks: usize,
    pub rejected_ticks: Vec<TickRejection>,
    pub fills: Vec<FillRecord>,
    pub rejected_fills: Vec<FillRejection>,
    /// Symbols whose series received at least one tick, sorted.
    pub touched: Vec<String>,
}

impl CycleReport {
    pub fn published(&self) -> bool {
        self.accepted_ticks > 0 || !self.fills.is_empty()
    }
}

pub struct MarketEngine {
    config: EngineConfig,
    series: HashMap<String, InstrumentSeries>,
    indicators: BTreeMap<String, IndicatorSnapshot>,
    quotes: BTreeMap<String, Quote>,
    ledger: PortfolioLedger,
    portfolio: PortfolioSnapshot,
    version: u64,
    board: Arc<RwLock<Arc<PublishedView>>>,
    listeners: Vec<Box<dyn SnapshotListener + Send>>,
}

impl MarketEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_ledger(config, PortfolioLedger::new())
    }

    /// Start from an existing ledger. Version 0 reflects its holdings.
    pub fn with_ledger(config: EngineConfig, ledger: PortfolioLedger) -> Self {
        let portfolio = PortfolioSnapshot::compute(&ledger);
        let initial = PublishedView {
            version: 0,
            published_at: None,
            portfolio: portfolio.clone(),
            indicators: BTreeMap::new(),
            quotes: BTreeMap::new(),
            overview: MarketOverview::from_quotes(std::iter::empty(), config.top_movers),
        };
        MarketEngine {
            config,
            series: HashMap::new(),
            indicators: BTreeMap::new(),
            quotes: BTreeMap::new(),
            ledger,
            portfolio,
            version: 0,
            board: Arc::new(RwLock::new(Arc::new(initial))),
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            board: Arc::clone(&self.board),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn SnapshotListener + Send>) {
        self.listeners.push(listener);
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn ledger(&self) -> &PortfolioLedger {
        &self.ledger
    }

    pub fn series(&self, symbol: &str) -> Option<&InstrumentSeries> {
        self.series.get(symbol)
    }

    pub fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    /// Latest indicator readings for `symbol`; `None` if it has never ticked.
    pub fn indicator_snapshot(&self, symbol: &str) -> Option<IndicatorSnapshot> {
        self.indicators.get(symbol).cloned()
    }

    pub fn portfolio_snapshot(&self) -> PortfolioSnapshot {
        self.portfolio.clone()
    }

    /// Apply a tick batch and publish. Invalid ticks are reported, valid ones applied.
    pub fn ingest_batch(&mut self, ticks: &[PriceTick], at: DateTime<Utc>) -> CycleReport {
        self.apply_cycle(&[], ticks, at)
    }

    /// Apply a single fill and publish the revalued portfolio.
    pub fn apply_fill(
        &mut self,
        fill: &OrderFill,
        at: DateTime<Utc>,
    ) -> Result<FillRecord, LivefolioError> {
        let record = self.ledger.apply_fill(fill, at)?;
        self.portfolio = PortfolioSnapshot::compute(&self.ledger);
        self.publish(at);
        Ok(record)
    }

    /// Apply fills, then ticks, as one atomic step followed by a single publish.
    pub fn apply_cycle(
        &mut self,
        fills: &[OrderFill],
        ticks: &[PriceTick],
        at: DateTime<Utc>,
    ) -> CycleReport {
        let mut report = CycleReport {
            version: self.version,
            ..CycleReport::default()
        };

        for fill in fills {
            match self.ledger.apply_fill(fill, at) {
                Ok(record) => report.fills.push(record),
                Err(error) => {
                    warn!(symbol = %fill.symbol, side = %fill.side, quantity = fill.quantity, %error, "fill rejected");
                    report.rejected_fills.push(FillRejection {
                        fill: fill.clone(),
                        error,
                    });
                }
            }
        }

        let mut accepted: Vec<PriceTick> = Vec::with_capacity(ticks.len());
        for tick in ticks {
            match tick.validate() {
                Ok(()) => accepted.push(tick.clone()),
                Err(error) => {
                    warn!(symbol = %tick.symbol, price = tick.price, "tick rejected");
                    report.rejected_ticks.push(TickRejection {
                        tick: tick.clone(),
                        error,
                    });
                }
            }
        }

        let mut touched: BTreeSet<String> = BTreeSet::new();
        for tick in &accepted {
            let capacity = self.config.series_capacity;
            let series = self
                .series
                .entry(tick.symbol.clone())
                .or_insert_with(|| InstrumentSeries::new(tick.symbol.clone(), capacity));
            if let Err(error) = series.append(tick) {
                report.rejected_ticks.push(TickRejection {
                    tick: tick.clone(),
                    error,
                });
                continue;
            }
            report.accepted_ticks += 1;
            touched.insert(tick.symbol.clone());

            let quote = match self.quotes.get(&tick.symbol) {
                Some(prev) => prev.advance(tick),
                None => Quote::opening(tick),
            };
            self.quotes.insert(tick.symbol.clone(), quote);
        }

        for symbol in &touched {
            if let Some(series) = self.series.get(symbol) {
                self.indicators
                    .insert(symbol.clone(), IndicatorSnapshot::from_series(series));
            }
        }
        self.ledger.revalue_prices(&accepted);

        report.touched = touched.into_iter().collect();
        if report.published() {
            self.portfolio = PortfolioSnapshot::compute(&self.ledger);
            self.publish(at);
            report.version = self.version;
        }
        report
    }

    fn publish(&mut self, at: DateTime<Utc>) {
        self.version += 1;
        let view = Arc::new(PublishedView {
            version: self.version,
            published_at: Some(at),
            portfolio: self.portfolio.clone(),
            indicators: self.indicators.clone(),
            quotes: self.quotes.clone(),
            overview: MarketOverview::from_quotes(self.quotes.values(), self.config.top_movers),
        });
        *self.board.write() = Arc::clone(&view);
        debug!(
            version = self.version,
            holdings = view.portfolio.holdings.len(),
            total_value = view.portfolio.total_value,
            "view published"
        );

        for listener in &mut self.listeners {
            if let Err(error) = listener.on_publish(&view) {
                warn!(%error, version = view.version, "snapshot listener failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::Reading;
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn tick(symbol: &str, price: f64, secs: i64) -> PriceTick {
        PriceTick::new(symbol, price, at(secs))
    }

    struct Recorder(Arc<Mutex<Vec<u64>>>);

    impl SnapshotListener for Recorder {
        fn on_publish(&mut self, view: &PublishedView) -> Result<(), LivefolioError> {
            self.0.lock().unwrap().push(view.version);
            Ok(())
        }
    }

    #[test]
    fn new_engine_publishes_version_zero() {
        let engine = MarketEngine::new(EngineConfig::default());
        let view = engine.reader().latest();
        assert_eq!(view.version, 0);
        assert!(view.published_at.is_none());
        assert!(view.portfolio.holdings.is_empty());
    }

    #[test]
    fn batch_with_invalid_tick_applies_the_rest() {
        let mut engine = MarketEngine::new(EngineConfig::default());
        let report = engine.ingest_batch(
            &[tick("A", 10.0, 0), tick("B", -1.0, 0), tick("C", 5.0, 0)],
            at(0),
        );

        assert_eq!(report.accepted_ticks, 2);
        assert_eq!(report.rejected_ticks.len(), 1);
        assert_eq!(report.rejected_ticks[0].tick.symbol, "B");
        assert!(matches!(
            report.rejected_ticks[0].error,
            LivefolioError::InvalidTick { .. }
        ));
        assert_eq!(report.touched, vec!["A".to_string(), "C".to_string()]);
        assert_eq!(report.version, 1);
        assert!(engine.series("B").is_none());
        assert!(engine.indicator_snapshot("B").is_none());
    }

    #[test]
    fn version_increments_once_per_batch() {
        let mut engine = MarketEngine::new(EngineConfig::default());
        let reader = engine.reader();
        engine.ingest_batch(&[tick("A", 10.0, 0), tick("B", 20.0, 0)], at(0));
        engine.ingest_batch(&[tick("A", 11.0, 2)], at(2));
        assert_eq!(reader.version(), 2);
        assert_eq!(engine.version(), 2);
    }

    #[test]
    fn empty_batch_does_not_publish() {
        let mut engine = MarketEngine::new(EngineConfig::default());
        let report = engine.ingest_batch(&[], at(0));
        assert!(!report.published());
        assert_eq!(engine.reader().version(), 0);
    }

    #[test]
    fn batch_revalues_holdings_and_indicators_together() {
        let mut engine = MarketEngine::new(EngineConfig::default());
        engine.apply_fill(&OrderFill::buy("A", 10, 10.0), at(0)).unwrap();
        engine.ingest_batch(&[tick("A", 12.0, 1)], at(1));

        let view = engine.reader().latest();
        assert_eq!(view.portfolio.holdings[0].current_price, 12.0);
        assert!((view.portfolio.total_value - 120.0).abs() < 1e-9);
        let snap = &view.indicators["A"];
        assert_eq!(snap.last, Some(12.0));
        assert_eq!(snap.sma20, Reading::Unavailable);
    }

    #[test]
    fn old_views_stay_intact_after_publish() {
        let mut engine = MarketEngine::new(EngineConfig::default());
        let reader = engine.reader();
        engine.ingest_batch(&[tick("A", 10.0, 0)], at(0));
        let first = reader.latest();

        engine.ingest_batch(&[tick("A", 11.0, 1)], at(1));
        let second = reader.latest();

        assert_eq!(first.version, 1);
        assert_eq!(first.quotes["A"].price, 10.0);
        assert_eq!(second.quotes["A"].price, 11.0);
        assert!((second.quotes["A"].change - 1.0).abs() < 1e-9);
    }

    #[test]
    fn changed_since_reports_newer_views_only() {
        let mut engine = MarketEngine::new(EngineConfig::default());
        let reader = engine.reader();
        assert!(reader.changed_since(0).is_none());
        engine.ingest_batch(&[tick("A", 10.0, 0)], at(0));
        assert_eq!(reader.changed_since(0).map(|v| v.version), Some(1));
        assert!(reader.changed_since(1).is_none());
    }

    #[test]
    fn rejected_fill_leaves_portfolio_and_version() {
        let mut engine = MarketEngine::new(EngineConfig::default());
        let err = engine
            .apply_fill(&OrderFill::sell("A", 1, 10.0), at(0))
            .unwrap_err();
        assert!(matches!(err, LivefolioError::InsufficientShares { .. }));
        assert_eq!(engine.version(), 0);
    }

    #[test]
    fn cycle_applies_fills_before_ticks() {
        let mut engine = MarketEngine::new(EngineConfig::default());
        let report = engine.apply_cycle(
            &[OrderFill::buy("A", 5, 10.0), OrderFill::sell("B", 1, 1.0)],
            &[tick("A", 20.0, 1)],
            at(1),
        );
        assert_eq!(report.fills.len(), 1);
        assert_eq!(report.rejected_fills.len(), 1);
        assert_eq!(report.version, 1);
        assert_eq!(engine.portfolio_snapshot().holdings[0].current_price, 20.0);
    }

    #[test]
    fn listeners_receive_each_publish() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut engine = MarketEngine::new(EngineConfig::default());
        engine.subscribe(Box::new(Recorder(Arc::clone(&seen))));

        engine.ingest_batch(&[tick("A", 10.0, 0)], at(0));
        engine.apply_fill(&OrderFill::buy("A", 1, 10.0), at(1)).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn engines_are_independent() {
        let mut a = MarketEngine::new(EngineConfig::default());
        let b = MarketEngine::new(EngineConfig::default());
        a.ingest_batch(&[tick("A", 10.0, 0)], at(0));
        assert_eq!(a.version(), 1);
        assert_eq!(b.version(), 0);
        assert!(b.series("A").is_none());
    }

    #[test]
    fn with_ledger_seeds_initial_view() {
        let mut ledger = PortfolioLedger::new();
        ledger.apply_fill(&OrderFill::buy("A", 4, 25.0), at(0)).unwrap();
        let engine = MarketEngine::with_ledger(EngineConfig::default(), ledger);
        let view = engine.reader().latest();
        assert_eq!(view.version, 0);
        assert!((view.portfolio.total_value - 100.0).abs() < 1e-9);
        assert_eq!(view.portfolio.allocation[0].percent_of_total, 100.0);
    }
}
