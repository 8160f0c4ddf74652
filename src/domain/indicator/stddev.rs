//! Population standard deviation, the spread term of Bollinger Bands.
//!
//! STDDEV(n) = sqrt(sum((C[i-j] - SMA(n))^2 for j in 0..n) / n)

use super::sma::mean;

/// Population standard deviation of a non-empty window, divided by N.
pub fn population_stddev(window: &[f64]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let avg = mean(window);
    let variance = window
        .iter()
        .map(|c| {
            let diff = c - avg;
            diff * diff
        })
        .sum::<f64>()
        / window.len() as f64;
    Some(variance.sqrt())
}
