// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   SMA_t = (x_{t-window+1} + ... + x_t) / window
//
// Each window is summed directly rather than with a running total so that the
// value at row t never carries rounding residue from rows outside the window.
// =============================================================================

/// Trailing arithmetic mean over `window` values, inclusive of the current row.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    let n = window as f64;
    for t in (window - 1)..values.len() {
        let sum: f64 = values[t + 1 - window..=t].iter().sum();
        out[t] = super::finite(sum / n);
    }
    out
}

pub fn lookback(window: usize) -> usize {
    window.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_util::leading_missing;

    #[test]
    fn sma_window_one_is_identity() {
        let closes = [100.0, 101.0, 99.0, 102.0, 98.5];
        let out = sma(&closes, 1);
        let expected: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn sma_known_values() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn sma_warm_up_length() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        assert_eq!(leading_missing(&sma(&closes, 10)), lookback(10));
    }

    #[test]
    fn sma_short_input_all_missing() {
        assert_eq!(sma(&[1.0, 2.0], 5), vec![None, None]);
        assert_eq!(sma(&[1.0, 2.0], 0), vec![None, None]);
        assert!(sma(&[], 3).is_empty());
    }
}
