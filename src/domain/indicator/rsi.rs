//! RSI (Relative Strength Index) indicator.
//!
//! Average gain/loss are simple means over the trailing n price changes,
//! recomputed from the raw window each time (no Wilder smoothing).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: n+1 closes are needed for n price changes.

use super::Reading;

pub fn rsi(closes: &[f64], period: usize) -> Reading<f64> {
    if period == 0 || closes.len() < period + 1 {
        return Reading::Unavailable;
    }

    let window = &closes[closes.len() - (period + 1)..];
    let mut gains = 0.0;
    let mut losses = 0.0;

    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains += change;
        } else if change < 0.0 {
            losses += -change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    let value = if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    };
    Reading::Value(value)
}

pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Reading<f64>> {
    (0..closes.len())
        .map(|i| rsi(&closes[..=i], period))
        .collect()
}
