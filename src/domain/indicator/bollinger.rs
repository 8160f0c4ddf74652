//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) closes are unavailable.

use serde::Serialize;

use super::sma::mean;
use super::stddev::population_stddev;
use super::Reading;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerBands {
    pub mid: f64,
    pub upper: f64,
    pub lower: f64,
}

pub fn bollinger(closes: &[f64], period: usize, stddev_mult: f64) -> Reading<BollingerBands> {
    if period == 0 || closes.len() < period {
        return Reading::Unavailable;
    }

    let window = &closes[closes.len() - period..];
    let mid = mean(window);
    let Some(sd) = population_stddev(window) else {
        return Reading::Unavailable;
    };

    Reading::Value(BollingerBands {
        mid,
        upper: mid + stddev_mult * sd,
        lower: mid - stddev_mult * sd,
    })
}

pub fn bollinger_series(
    closes: &[f64],
    period: usize,
    stddev_mult: f64,
) -> Vec<Reading<BollingerBands>> {
    (0..closes.len())
        .map(|i| bollinger(&closes[..=i], period, stddev_mult))
        .collect()
}
