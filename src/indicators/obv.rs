// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
//   OBV_0 = 0
//   OBV_t = OBV_{t-1} + volume_t   if close_t > close_{t-1}
//         = OBV_{t-1} - volume_t   if close_t < close_{t-1}
//         = OBV_{t-1}              otherwise

/// Running on-balance volume, aligned with `closes`.
///
/// Defined from row 0 onward; a non-finite running total stops the series.
pub fn obv(closes: &[f64], volumes: &[f64]) -> Vec<Option<f64>> {
    let n = closes.len().min(volumes.len());
    let mut out = vec![None; n];
    if n == 0 {
        return out;
    }

    let mut running = 0.0_f64;
    out[0] = Some(running);
    for t in 1..n {
        if closes[t] > closes[t - 1] {
            running += volumes[t];
        } else if closes[t] < closes[t - 1] {
            running -= volumes[t];
        }
        if !running.is_finite() {
            break;
        }
        out[t] = Some(running);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obv_seeded_at_zero() {
        assert_eq!(obv(&[10.0], &[500.0]), vec![Some(0.0)]);
        assert!(obv(&[], &[]).is_empty());
    }

    #[test]
    fn obv_steps_follow_close_direction() {
        let closes = [10.0, 11.0, 10.5, 10.5, 12.0, 11.0];
        let volumes = [100.0, 200.0, 300.0, 400.0, 500.0, 600.0];
        let out = obv(&closes, &volumes);
        assert_eq!(
            out,
            vec![Some(0.0), Some(200.0), Some(-100.0), Some(-100.0), Some(400.0), Some(-200.0)]
        );

        for t in 1..closes.len() {
            let step = out[t].unwrap() - out[t - 1].unwrap();
            let expected = if closes[t] > closes[t - 1] {
                volumes[t]
            } else if closes[t] < closes[t - 1] {
                -volumes[t]
            } else {
                0.0
            };
            assert_eq!(step, expected, "row {t}");
        }
    }
}
