//! Technical indicator implementations.
//!
//! Every indicator is a pure function over a slice of closes, oldest first.
//! This module provides the shared types:
//! - `Reading`: a value or an explicit `Unavailable` marker (insufficient history)
//! - `IndicatorType`: indicator identity + parameters, with display labels
//! - `IndicatorSnapshot`: the full set of readings for one instrument

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use bollinger::{bollinger, bollinger_series, BollingerBands};
pub use ema::{ema, ema_series, ema_values};
pub use macd::{macd, macd_lines, macd_series, MacdValue};
pub use rsi::{rsi, rsi_series};
pub use sma::{sma, sma_series};
pub use stddev::population_stddev;

use serde::Serialize;
use std::fmt;

use super::series::InstrumentSeries;

pub const RSI_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULT_X100: u32 = 200;

/// An indicator output that may be missing for lack of history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reading<T> {
    Value(T),
    Unavailable,
}

impl<T> Reading<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    pub fn value(self) -> Option<T> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Unavailable => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reading<U> {
        match self {
            Reading::Value(v) => Reading::Value(f(v)),
            Reading::Unavailable => Reading::Unavailable,
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reading::Value(v),
            None => Reading::Unavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorType {
    /// Indicators carried in every [`IndicatorSnapshot`], in display order.
    pub fn snapshot_set() -> [IndicatorType; 8] {
        [
            IndicatorType::Sma(20),
            IndicatorType::Sma(50),
            IndicatorType::Sma(200),
            IndicatorType::Ema(macd::DEFAULT_FAST),
            IndicatorType::Ema(macd::DEFAULT_SLOW),
            IndicatorType::Macd {
                fast: macd::DEFAULT_FAST,
                slow: macd::DEFAULT_SLOW,
                signal: macd::DEFAULT_SIGNAL,
            },
            IndicatorType::Rsi(RSI_PERIOD),
            IndicatorType::Bollinger {
                period: BOLLINGER_PERIOD,
                stddev_mult_x100: BOLLINGER_MULT_X100,
            },
        ]
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// All indicator readings for one instrument, recomputed from its window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub samples: usize,
    pub last: Option<f64>,
    pub sma20: Reading<f64>,
    pub sma50: Reading<f64>,
    pub sma200: Reading<f64>,
    pub ema12: Reading<f64>,
    pub ema26: Reading<f64>,
    pub macd: Reading<MacdValue>,
    pub rsi14: Reading<f64>,
    pub bollinger: Reading<BollingerBands>,
}

impl IndicatorSnapshot {
    pub fn compute(symbol: &str, closes: &[f64]) -> Self {
        let bollinger_mult = BOLLINGER_MULT_X100 as f64 / 100.0;
        IndicatorSnapshot {
            symbol: symbol.to_string(),
            samples: closes.len(),
            last: closes.last().copied(),
            sma20: sma(closes, 20),
            sma50: sma(closes, 50),
            sma200: sma(closes, 200),
            ema12: ema(closes, macd::DEFAULT_FAST),
            ema26: ema(closes, macd::DEFAULT_SLOW),
            macd: macd(
                closes,
                macd::DEFAULT_FAST,
                macd::DEFAULT_SLOW,
                macd::DEFAULT_SIGNAL,
            ),
            rsi14: rsi(closes, RSI_PERIOD),
            bollinger: bollinger(closes, BOLLINGER_PERIOD, bollinger_mult),
        }
    }

    pub fn from_series(series: &InstrumentSeries) -> Self {
        Self::compute(series.symbol(), &series.closes())
    }
}
