// =============================================================================
// Rate of Change (ROC) — Momentum Indicator
// =============================================================================
//
// ROC measures the percentage change in price over a look-back window:
//   ROC = (close / close_n - 1) * 100
//
// Unlike `daily_return` and `volume_change`, which are fractions, ROC is
// scaled to percent (ROC 5.0 == +5 %).

/// Percentage change versus `window` rows earlier, aligned with `closes`.
///
/// Rows whose prior close is zero are missing.
pub fn roc(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if window == 0 {
        return out;
    }
    for t in window..closes.len() {
        out[t] = super::ratio(closes[t], closes[t - window]).map(|r| (r - 1.0) * 100.0);
    }
    out
}

pub fn lookback(window: usize) -> usize {
    window
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roc_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let out = roc(&closes, 14);
        assert!(out[..14].iter().all(|v| v.is_none()));
        // From 1 to 15: ROC = (15/1 - 1) * 100 = 1400%
        assert!((out[14].unwrap() - 1400.0).abs() < 1e-10);
    }

    #[test]
    fn roc_is_percent() {
        let out = roc(&[100.0, 0.0, 0.0, 0.0, 0.0, 105.0], 5);
        assert!((out[5].unwrap() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn roc_zero_base_is_missing() {
        let out = roc(&[0.0, 1.0, 2.0], 1);
        assert_eq!(out[1], None);
        assert!((out[2].unwrap() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn roc_insufficient_data() {
        let closes = vec![1.0, 2.0, 3.0];
        assert!(roc(&closes, 14).iter().all(|v| v.is_none()));
    }
}
