//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! The recursion runs from the first retained close; the reading is reported
//! once at least n closes exist.

use super::Reading;

/// Raw EMA recursion over `values`, one output per input. Empty for period 0.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(ema);

    for &value in &values[1..] {
        ema = value * k + ema * (1.0 - k);
        out.push(ema);
    }

    out
}

pub fn ema(closes: &[f64], period: usize) -> Reading<f64> {
    if period == 0 || closes.len() < period {
        return Reading::Unavailable;
    }
    ema_values(closes, period).last().copied().into()
}

pub fn ema_series(closes: &[f64], period: usize) -> Vec<Reading<f64>> {
    let warmup = period.saturating_sub(1);
    ema_values(closes, period)
        .into_iter()
        .enumerate()
        .map(|(i, v)| if i >= warmup { Reading::Value(v) } else { Reading::Unavailable })
        .collect()
}
