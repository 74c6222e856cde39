// =============================================================================
// Price-derived transforms: percent change, log return, lag
// =============================================================================
//
// pct_change(p)[t] = x[t] / x[t-p] - 1        (fraction, not percent)
// log_return[t]    = ln(x[t] / x[t-1])
// lag(n)[t]        = x[t-n]

use super::{finite, ratio};

/// Fractional change versus `periods` rows earlier.
///
/// A zero prior value yields `None` rather than an infinity.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if periods == 0 {
        return out;
    }
    for t in periods..values.len() {
        out[t] = ratio(values[t], values[t - periods]).map(|r| r - 1.0);
    }
    out
}

/// One-period natural-log return. Non-positive ratios yield `None`.
pub fn log_return(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for t in 1..values.len() {
        out[t] = ratio(values[t], values[t - 1])
            .filter(|r| *r > 0.0)
            .and_then(|r| finite(r.ln()));
    }
    out
}

/// The series shifted forward by `periods` rows.
pub fn lag(values: &[f64], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| t.checked_sub(periods).map(|src| values[src]))
        .collect()
}

pub fn lookback(periods: usize) -> usize {
    periods
}
