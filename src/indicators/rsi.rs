// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes. Row 0 has
//          no delta.
// Step 2 — Seed average gain / average loss with the SMA of the first `window`
//          gains / losses (rows 1..=window).
// Step 3 — Apply Wilder's exponential smoothing (alpha = 1 / window):
//            avg_gain = (prev_avg_gain * (window - 1) + current_gain) / window
//            avg_loss = (prev_avg_loss * (window - 1) + current_loss) / window
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// A window without any loss reports 100, including a perfectly flat one.
// =============================================================================

/// Compute the RSI series for `closes`, aligned with the input.
///
/// The first defined value sits at row `window`.
///
/// # Edge cases
/// - `window == 0` => every output missing
/// - `closes.len() < window + 1` => every output missing
pub fn rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if window == 0 || closes.len() < window + 1 {
        return out;
    }

    // deltas[k] is the change into row k + 1.
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let (sum_gain, sum_loss) = deltas[..window]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| (g + gain(d), l + loss(d)));

    let window_f = window as f64;
    let mut avg_gain = sum_gain / window_f;
    let mut avg_loss = sum_loss / window_f;
    out[window] = rsi_from_averages(avg_gain, avg_loss);

    for (k, &delta) in deltas.iter().enumerate().skip(window) {
        avg_gain = (avg_gain * (window_f - 1.0) + gain(delta)) / window_f;
        avg_loss = (avg_loss * (window_f - 1.0) + loss(delta)) / window_f;
        out[k + 1] = rsi_from_averages(avg_gain, avg_loss);
    }

    out
}

pub fn lookback(window: usize) -> usize {
    window
}

// =============================================================================
// Internal helpers
// =============================================================================

fn gain(delta: f64) -> f64 {
    if delta > 0.0 {
        delta
    } else {
        0.0
    }
}

fn loss(delta: f64) -> f64 {
    if delta < 0.0 {
        -delta
    } else {
        0.0
    }
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    super::finite(100.0 - 100.0 / (1.0 + rs))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_util::leading_missing;

    #[test]
    fn rsi_empty_input() {
        assert!(rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_period_zero() {
        assert_eq!(rsi(&[1.0, 2.0, 3.0], 0), vec![None, None, None]);
    }

    #[test]
    fn rsi_insufficient_data() {
        // Need window+1 closes (window deltas). 14 closes => 13 deltas < 14.
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert!(rsi(&closes, 14).iter().all(|v| v.is_none()));
    }

    #[test]
    fn rsi_warm_up_length() {
        let closes: Vec<f64> = (0..40).map(|x| (x as f64).cos() + 10.0).collect();
        let out = rsi(&closes, 14);
        assert_eq!(leading_missing(&out), 14);
        assert!(out[14..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn rsi_all_gains() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        for v in rsi(&closes, 14).iter().flatten() {
            assert_eq!(*v, 100.0);
        }
    }

    #[test]
    fn rsi_non_decreasing_with_flats_is_100() {
        let closes = vec![
            10.0, 10.0, 11.0, 11.0, 11.0, 12.0, 12.5, 12.5, 13.0, 13.0, 13.0, 14.0, 14.0, 15.0,
            15.0, 15.0, 16.0, 16.0, 16.5, 17.0,
        ];
        let out = rsi(&closes, 14);
        assert!(out[14..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn rsi_flat_market_is_100() {
        let closes = vec![100.0; 30];
        assert!(rsi(&closes, 14)[14..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn rsi_all_losses() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        for v in rsi(&closes, 14).iter().flatten() {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_known_wilder_values() {
        // Classic 14-period example; first RSI is 70.46 (rounded).
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let out = rsi(&closes, 14);
        let first = out[14].unwrap();
        assert!((first - 70.46).abs() < 0.05, "got {first}");
        for v in out.iter().flatten() {
            assert!((0.0..=100.0).contains(v), "RSI {v} out of range");
        }
    }
}
