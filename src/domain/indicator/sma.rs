//! Simple Moving Average.
//!
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n
//! Warmup: first (n-1) closes are unavailable.

use super::Reading;

pub(crate) fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

pub fn sma(closes: &[f64], period: usize) -> Reading<f64> {
    if period == 0 || closes.len() < period {
        return Reading::Unavailable;
    }
    Reading::Value(mean(&closes[closes.len() - period..]))
}

pub fn sma_series(closes: &[f64], period: usize) -> Vec<Reading<f64>> {
    (0..closes.len())
        .map(|i| sma(&closes[..=i], period))
        .collect()
}
