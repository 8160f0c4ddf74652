//! Driver and scheduler for the two recurring cycles.
//!
//! The price cycle pulls a batch from the market-data port into a pending
//! buffer. The revaluation cycle hands every pending tick and every reported
//! fill to the engine as one atomic step, which then publishes.
//!
//! Time is a logical millisecond clock advanced explicitly through
//! [`Driver::advance`] or [`Driver::step`]; nothing here reads the wall clock.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::engine::{CycleReport, MarketEngine, SnapshotReader};
use super::error::LivefolioError;
use super::tick::PriceTick;
use crate::ports::market_data_port::{FillSource, MarketDataPort};

pub const DEFAULT_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    PriceGeneration,
    Revaluation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleConfig {
    pub price_interval_ms: u64,
    pub revalue_interval_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            price_interval_ms: DEFAULT_INTERVAL_MS,
            revalue_interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

/// Logical clock deciding which cycle is due next.
#[derive(Debug, Clone)]
pub struct Scheduler {
    price_interval_ms: u64,
    revalue_interval_ms: u64,
    now_ms: u64,
    next_price_ms: u64,
    next_revalue_ms: u64,
}

impl Scheduler {
    pub fn new(config: &ScheduleConfig) -> Self {
        let price_interval_ms = config.price_interval_ms.max(1);
        let revalue_interval_ms = config.revalue_interval_ms.max(1);
        Scheduler {
            price_interval_ms,
            revalue_interval_ms,
            now_ms: 0,
            next_price_ms: price_interval_ms,
            next_revalue_ms: revalue_interval_ms,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn next_revaluation_ms(&self) -> u64 {
        self.next_revalue_ms
    }

    /// Move the clock forward and return every cycle that fell due, in time
    /// order. A price cycle runs before a revaluation due at the same instant.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<(u64, Cycle)> {
        let target = self.now_ms.saturating_add(elapsed_ms);
        let mut due = Vec::new();

        loop {
            let next = self.next_price_ms.min(self.next_revalue_ms);
            if next > target {
                break;
            }
            if self.next_price_ms <= self.next_revalue_ms {
                due.push((self.next_price_ms, Cycle::PriceGeneration));
                self.next_price_ms += self.price_interval_ms;
            } else {
                due.push((self.next_revalue_ms, Cycle::Revaluation));
                self.next_revalue_ms += self.revalue_interval_ms;
            }
        }

        self.now_ms = target;
        due
    }
}

/// Cooperative cancellation flag shared with the host.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriverStats {
    pub price_cycles: u64,
    pub revaluations: u64,
    pub ticks_ingested: u64,
    pub ticks_rejected: u64,
    pub fills_applied: u64,
    pub fills_rejected: u64,
}

pub struct Driver<F> {
    engine: MarketEngine,
    feed: F,
    fills: Option<Box<dyn FillSource + Send>>,
    scheduler: Scheduler,
    pending: Vec<PriceTick>,
    origin: DateTime<Utc>,
    stats: DriverStats,
}

impl<F: MarketDataPort> Driver<F> {
    /// `origin` is the wall-clock instant that logical time 0 maps to.
    pub fn new(
        engine: MarketEngine,
        feed: F,
        schedule: &ScheduleConfig,
        origin: DateTime<Utc>,
    ) -> Self {
        Driver {
            engine,
            feed,
            fills: None,
            scheduler: Scheduler::new(schedule),
            pending: Vec::new(),
            origin,
            stats: DriverStats::default(),
        }
    }

    pub fn with_fill_source(mut self, source: Box<dyn FillSource + Send>) -> Self {
        self.fills = Some(source);
        self
    }

    pub fn engine(&self) -> &MarketEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MarketEngine {
        &mut self.engine
    }

    pub fn reader(&self) -> SnapshotReader {
        self.engine.reader()
    }

    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    pub fn pending_ticks(&self) -> usize {
        self.pending.len()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock(self.scheduler.now_ms())
    }

    pub fn into_engine(self) -> MarketEngine {
        self.engine
    }

    fn clock(&self, ms: u64) -> DateTime<Utc> {
        self.origin + Duration::milliseconds(ms as i64)
    }

    /// Pull one batch from the feed into the pending buffer.
    pub fn run_price_cycle(&mut self, at: DateTime<Utc>) -> Result<usize, LivefolioError> {
        let batch = self.feed.next_batch(at)?;
        let count = batch.len();
        self.pending.extend(batch);
        self.stats.price_cycles += 1;
        debug!(ticks = count, pending = self.pending.len(), "price cycle");
        Ok(count)
    }

    /// Apply every pending tick and reported fill as one step.
    pub fn run_revaluation(&mut self, at: DateTime<Utc>) -> CycleReport {
        let ticks = std::mem::take(&mut self.pending);
        let fills = self
            .fills
            .as_mut()
            .map(|source| source.drain_fills())
            .unwrap_or_default();

        let report = self.engine.apply_cycle(&fills, &ticks, at);

        self.stats.revaluations += 1;
        self.stats.ticks_ingested += report.accepted_ticks as u64;
        self.stats.ticks_rejected += report.rejected_ticks.len() as u64;
        self.stats.fills_applied += report.fills.len() as u64;
        self.stats.fills_rejected += report.rejected_fills.len() as u64;
        debug!(
            version = report.version,
            ticks = report.accepted_ticks,
            fills = report.fills.len(),
            "revaluation cycle"
        );
        report
    }

    /// Advance logical time, running every cycle that falls due.
    /// Returns the reports of the revaluations that ran.
    pub fn advance(&mut self, elapsed_ms: u64) -> Result<Vec<CycleReport>, LivefolioError> {
        let mut reports = Vec::new();
        for (due_ms, cycle) in self.scheduler.advance(elapsed_ms) {
            let at = self.clock(due_ms);
            match cycle {
                Cycle::PriceGeneration => {
                    self.run_price_cycle(at)?;
                }
                Cycle::Revaluation => reports.push(self.run_revaluation(at)),
            }
        }
        Ok(reports)
    }

    /// Advance to the next revaluation and return its report.
    pub fn step(&mut self) -> Result<CycleReport, LivefolioError> {
        let elapsed = self.scheduler.next_revaluation_ms() - self.scheduler.now_ms();
        let mut reports = self.advance(elapsed)?;
        Ok(reports.pop().unwrap_or_default())
    }

    /// Step until `revaluations` have run, the feed is drained, or `cancel` fires.
    pub fn run_cycles(
        &mut self,
        revaluations: u64,
        cancel: &CancelToken,
    ) -> Result<DriverStats, LivefolioError> {
        info!(revaluations, "driver started");
        let mut done = 0;
        while done < revaluations {
            if cancel.is_cancelled() {
                info!(done, "driver cancelled");
                break;
            }
            if self.feed.is_exhausted() && self.pending.is_empty() {
                info!(done, "feed exhausted");
                break;
            }
            self.step()?;
            done += 1;
        }
        info!(
            ticks = self.stats.ticks_ingested,
            version = self.engine.version(),
            "driver stopped"
        );
        Ok(self.stats.clone())
    }
}
