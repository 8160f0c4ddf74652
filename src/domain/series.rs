//! Bounded rolling history of closing prices for one instrument.
//!
//! Capacity is never below [`MIN_CAPACITY`] so the longest indicator window
//! (SMA 200) always fits, and never above [`MAX_CAPACITY`]. Storage grows
//! with the history rather than up front. Oldest closes are evicted first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::error::LivefolioError;
use super::tick::PriceTick;

pub const MIN_CAPACITY: usize = 200;
pub const DEFAULT_CAPACITY: usize = 250;
pub const MAX_CAPACITY: usize = 100_000;

#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    symbol: String,
    closes: VecDeque<f64>,
    capacity: usize,
    last_timestamp: Option<DateTime<Utc>>,
}

impl InstrumentSeries {
    pub fn new(symbol: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.clamp(MIN_CAPACITY, MAX_CAPACITY);
        InstrumentSeries {
            symbol: symbol.into(),
            closes: VecDeque::new(),
            capacity,
            last_timestamp: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.closes.back().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
    }

    /// Append a tick's price, evicting the oldest close when full.
    pub fn append(&mut self, tick: &PriceTick) -> Result<(), LivefolioError> {
        tick.validate()?;
        if tick.symbol != self.symbol {
            return Err(LivefolioError::InvalidTick {
                symbol: tick.symbol.clone(),
                price: tick.price,
            });
        }
        if self.closes.len() == self.capacity {
            self.closes.pop_front();
        }
        self.closes.push_back(tick.price);
        self.last_timestamp = Some(tick.timestamp);
        Ok(())
    }

    /// The most recent `n` closes, oldest first. `None` when fewer than `n` exist.
    pub fn window(&self, n: usize) -> Option<Vec<f64>> {
        if n > self.closes.len() {
            return None;
        }
        Some(self.closes.iter().skip(self.closes.len() - n).copied().collect())
    }

    /// Entire retained history, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.closes.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tick(symbol: &str, price: f64, secs: i64) -> PriceTick {
        PriceTick::new(symbol, price, Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[test]
    fn capacity_is_clamped_to_minimum() {
        let series = InstrumentSeries::new("AAPL", 10);
        assert_eq!(series.capacity(), MIN_CAPACITY);
    }

    #[test]
    fn huge_capacity_is_clamped_and_not_preallocated() {
        let mut series = InstrumentSeries::new("AAPL", usize::MAX);
        assert_eq!(series.capacity(), MAX_CAPACITY);
        series.append(&tick("AAPL", 1.0, 0)).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn append_and_window_in_order() {
        let mut series = InstrumentSeries::new("AAPL", DEFAULT_CAPACITY);
        for (i, p) in [10.0, 11.0, 12.0, 13.0].iter().enumerate() {
            series.append(&tick("AAPL", *p, i as i64)).unwrap();
        }
        assert_eq!(series.window(2), Some(vec![12.0, 13.0]));
        assert_eq!(series.window(4), Some(vec![10.0, 11.0, 12.0, 13.0]));
        assert_eq!(series.window(5), None);
        assert_eq!(series.window(0), Some(vec![]));
        assert_eq!(series.last(), Some(13.0));
        assert_eq!(series.last_timestamp(), Some(Utc.timestamp_opt(3, 0).unwrap()));
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut series = InstrumentSeries::new("AAPL", MIN_CAPACITY);
        for i in 0..(MIN_CAPACITY + 5) {
            series.append(&tick("AAPL", 1.0 + i as f64, i as i64)).unwrap();
        }
        assert_eq!(series.len(), MIN_CAPACITY);
        let closes = series.closes();
        assert_eq!(closes[0], 6.0);
        assert_eq!(*closes.last().unwrap(), (MIN_CAPACITY + 5) as f64);
    }

    #[test]
    fn invalid_tick_leaves_series_unchanged() {
        let mut series = InstrumentSeries::new("AAPL", DEFAULT_CAPACITY);
        series.append(&tick("AAPL", 5.0, 0)).unwrap();

        let err = series.append(&tick("AAPL", 0.0, 1)).unwrap_err();
        assert!(matches!(err, LivefolioError::InvalidTick { .. }));
        let err = series.append(&tick("AAPL", -3.0, 1)).unwrap_err();
        assert!(matches!(err, LivefolioError::InvalidTick { .. }));

        assert_eq!(series.closes(), vec![5.0]);
        assert_eq!(series.last_timestamp(), Some(Utc.timestamp_opt(0, 0).unwrap()));
    }

    #[test]
    fn rejects_tick_for_other_symbol() {
        let mut series = InstrumentSeries::new("AAPL", DEFAULT_CAPACITY);
        assert!(series.append(&tick("MSFT", 5.0, 0)).is_err());
        assert!(series.is_empty());
    }
}
