// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (window + 1)
//   EMA_t      = x_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The recursion is seeded with the first available value. Outputs for the
// first `window - 1` observations are withheld (reported as missing) because
// the seed still dominates them.
// =============================================================================

/// EMA over a dense series. See [`ema_sparse`] for the recursion rules.
pub fn ema(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let dense: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    ema_sparse(&dense, window)
}

/// EMA over a series that may contain missing values.
///
/// Leading missing values are skipped; the first present value seeds the
/// average. A missing value after the seed produces a missing output and does
/// not advance the recursion.
///
/// # Edge cases
/// - `window == 0` => every output missing
/// - fewer than `window` present values => every output missing
pub fn ema_sparse(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    let multiplier = 2.0 / (window as f64 + 1.0);
    let mut prev: Option<f64> = None;
    let mut observed = 0usize;

    for (t, value) in values.iter().enumerate() {
        let Some(x) = *value else { continue };
        let next = match prev {
            None => x,
            Some(p) => x * multiplier + p * (1.0 - multiplier),
        };
        prev = Some(next);
        observed += 1;
        if observed >= window {
            out[t] = super::finite(next);
        }
    }

    out
}

pub fn lookback(window: usize) -> usize {
    window.saturating_sub(1)
}
