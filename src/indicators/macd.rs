// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   line   = EMA_fast(close) - EMA_slow(close)
//   signal = EMA_signal(line)
//   diff   = line - signal            (the "histogram", the only output kept)
//
// The signal EMA only starts once the line exists, so the first defined diff
// sits at row (slow - 1) + (signal - 1): 33 for the classic 12/26/9.
// =============================================================================

use super::ema::{ema, ema_sparse};

/// MACD line: fast EMA minus slow EMA.
pub fn macd_line(closes: &[f64], fast: usize, slow: usize) -> Vec<Option<f64>> {
    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);
    ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect()
}

/// MACD diff (line minus signal) for `closes`, aligned with the input.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Option<f64>> {
    let line = macd_line(closes, fast, slow);
    let signal_line = ema_sparse(&line, signal);
    line.iter()
        .zip(&signal_line)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect()
}

/// Leading rows without a defined diff.
pub fn lookback(fast: usize, slow: usize, signal: usize) -> usize {
    super::ema::lookback(fast.max(slow)).saturating_add(super::ema::lookback(signal))
}
