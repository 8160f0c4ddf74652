//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Both EMAs are seeded from the first close, so the three lines are aligned
//! index-for-index from the first close onward. The signal EMA is seeded from
//! the first MACD point.
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Reported once max(fast, slow) closes exist.

use serde::Serialize;

use super::ema::ema_values;
use super::Reading;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Aligned MACD/signal/histogram for every close. Empty when any period is 0.
pub fn macd_lines(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<MacdValue> {
    if closes.is_empty() || fast == 0 || slow == 0 || signal == 0 {
        return Vec::new();
    }

    let ema_fast = ema_values(closes, fast);
    let ema_slow = ema_values(closes, slow);

    let line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_values(&line, signal);

    line.iter()
        .zip(signal_line.iter())
        .map(|(&l, &s)| MacdValue {
            line: l,
            signal: s,
            histogram: l - s,
        })
        .collect()
}

pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Reading<MacdValue> {
    if fast == 0 || slow == 0 || signal == 0 || closes.len() < fast.max(slow) {
        return Reading::Unavailable;
    }
    macd_lines(closes, fast, slow, signal)
        .last()
        .copied()
        .into()
}

pub fn macd_series(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Vec<Reading<MacdValue>> {
    let warmup = fast.max(slow).saturating_sub(1);
    macd_lines(closes, fast, slow, signal)
        .into_iter()
        .enumerate()
        .map(|(i, v)| if i >= warmup { Reading::Value(v) } else { Reading::Unavailable })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn macd_default_constants() {
        assert_eq!(DEFAULT_FAST, 12);
        assert_eq!(DEFAULT_SLOW, 26);
        assert_eq!(DEFAULT_SIGNAL, 9);
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let closes = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];
        let lines = macd_lines(&closes, 3, 5, 2);
        let fast = ema_values(&closes, 3);
        let slow = ema_values(&closes, 5);

        assert_eq!(lines.len(), closes.len());
        for (i, v) in lines.iter().enumerate() {
            assert!(
                (v.line - (fast[i] - slow[i])).abs() < f64::EPSILON,
                "MACD line mismatch at index {}",
                i
            );
        }
    }

    #[test]
    fn macd_first_point_is_zero() {
        let lines = macd_lines(&rising(5), 3, 5, 2);
        assert_eq!(lines[0].line, 0.0);
        assert_eq!(lines[0].signal, 0.0);
        assert_eq!(lines[0].histogram, 0.0);
    }

    #[test]
    fn macd_signal_is_ema_of_line() {
        let closes = rising(40);
        let lines = macd_lines(&closes, 12, 26, 9);
        let line: Vec<f64> = lines.iter().map(|v| v.line).collect();
        let signal = ema_values(&line, 9);
        for (i, v) in lines.iter().enumerate() {
            assert!((v.signal - signal[i]).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        for v in macd_lines(&rising(40), 12, 26, 9) {
            assert!((v.histogram - (v.line - v.signal)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn macd_rising_series_is_positive() {
        let v = macd(&rising(40), 12, 26, 9).value().unwrap();
        assert!(v.line > 0.0);
    }

    #[test]
    fn macd_warmup() {
        assert_eq!(macd(&rising(25), 12, 26, 9), Reading::Unavailable);
        assert!(macd(&rising(26), 12, 26, 9).is_available());

        let series = macd_series(&rising(30), 12, 26, 9);
        assert!(!series[24].is_available());
        assert!(series[25].is_available());
    }

    #[test]
    fn macd_zero_period() {
        let closes = rising(30);
        assert!(macd_lines(&closes, 0, 26, 9).is_empty());
        assert!(macd_lines(&closes, 12, 0, 9).is_empty());
        assert!(macd_lines(&closes, 12, 26, 0).is_empty());
        assert_eq!(macd(&closes, 12, 26, 0), Reading::Unavailable);
    }

    #[test]
    fn macd_empty_closes() {
        assert!(macd_lines(&[], 12, 26, 9).is_empty());
    }
}
