// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// of the same trailing window.

use super::sma::sma;

/// Result of a Bollinger Band calculation, each band aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub mid: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// - `mid`   = SMA(`window`)
/// - `upper` = mid + `num_std` * σ
/// - `lower` = mid - `num_std` * σ
///
/// Rows before `window - 1` are missing in all three bands.
pub fn bollinger(closes: &[f64], window: usize, num_std: f64) -> BollingerSeries {
    let mid = sma(closes, window);
    let mut upper = vec![None; closes.len()];
    let mut lower = vec![None; closes.len()];

    for (t, m) in mid.iter().enumerate() {
        let Some(middle) = *m else { continue };
        let slice = &closes[t + 1 - window..=t];
        let variance = slice.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / window as f64;
        let std_dev = variance.sqrt();
        upper[t] = super::finite(middle + num_std * std_dev);
        lower[t] = super::finite(middle - num_std * std_dev);
    }

    BollingerSeries { mid, upper, lower }
}

pub fn lookback(window: usize) -> usize {
    super::sma::lookback(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = bollinger(&closes, 20, 2.0);
        let t = 19;
        let (u, m, l) = (bb.upper[t].unwrap(), bb.mid[t].unwrap(), bb.lower[t].unwrap());
        assert!((m - 10.5).abs() < 1e-10);
        assert!(u > m && l < m);
        // Population σ of 1..=20 is sqrt((20^2 - 1) / 12).
        let sigma = ((400.0_f64 - 1.0) / 12.0).sqrt();
        assert!((u - (10.5 + 2.0 * sigma)).abs() < 1e-10);
        assert!(((u - m) - (m - l)).abs() < 1e-10);
    }

    #[test]
    fn bollinger_insufficient_data() {
        let bb = bollinger(&[1.0, 2.0, 3.0], 20, 2.0);
        assert!(bb.mid.iter().chain(&bb.upper).chain(&bb.lower).all(|v| v.is_none()));
    }

    #[test]
    fn bollinger_flat_bands_collapse() {
        let bb = bollinger(&vec![100.0; 20], 20, 2.0);
        assert_eq!(bb.upper[19], Some(100.0));
        assert_eq!(bb.lower[19], Some(100.0));
    }

    #[test]
    fn bollinger_warm_up_matches_sma() {
        let closes: Vec<f64> = (0..25).map(|x| x as f64).collect();
        let bb = bollinger(&closes, 20, 2.0);
        assert!(bb.upper[..19].iter().all(|v| v.is_none()));
        assert!(bb.upper[19..].iter().all(|v| v.is_some()));
        assert_eq!(lookback(20), 19);
    }
}
