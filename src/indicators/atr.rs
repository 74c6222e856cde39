// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing Method
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar after the first:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
// Row 0 has no previous close, so it has no TR.
//
// ATR is then the smoothed average of TR using Wilder's method:
//   ATR_window = SMA of TR over rows 1..=window
//   ATR_t      = (ATR_{t-1} * (window - 1) + TR_t) / window
//
// Default window: 14
// =============================================================================

/// True range per row; row 0 is missing.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<Option<f64>> {
    let n = high.len().min(low.len()).min(close.len());
    let mut out = vec![None; n];
    for i in 1..n {
        let prev_close = close[i - 1];
        // f64::max ignores NaN, so screen the inputs instead of the result.
        if !(high[i].is_finite() && low[i].is_finite() && prev_close.is_finite()) {
            continue;
        }
        let hl = high[i] - low[i];
        let hc = (high[i] - prev_close).abs();
        let lc = (low[i] - prev_close).abs();
        out[i] = super::finite(hl.max(hc).max(lc));
    }
    out
}

/// Compute the ATR series from parallel high/low/close slices (oldest first).
///
/// The first defined value sits at row `window`; everything earlier is
/// missing. A non-finite true range stops the series: later rows stay missing.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], window: usize) -> Vec<Option<f64>> {
    let tr = true_range(high, low, close);
    let mut out = vec![None; tr.len()];
    if window == 0 || tr.len() < window + 1 {
        return out;
    }

    // --- Seed ATR with SMA of the first `window` TR values --------------------
    let mut seed_sum = 0.0;
    for value in &tr[1..=window] {
        match value {
            Some(v) => seed_sum += v,
            None => return out,
        }
    }
    let window_f = window as f64;
    let mut current = seed_sum / window_f;
    out[window] = super::finite(current);

    // --- Wilder's smoothing for remaining TR values ---------------------------
    for t in (window + 1)..tr.len() {
        let Some(range) = tr[t] else { break };
        current = (current * (window_f - 1.0) + range) / window_f;
        out[t] = super::finite(current);
    }

    out
}

pub fn lookback(window: usize) -> usize {
    window
}
