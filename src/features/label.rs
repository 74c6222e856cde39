// =============================================================================
// Label Generator — forward return and direction target
// =============================================================================
//
//   future_return_t = close_{t+h} / close_t - 1
//   target_t        = 1 if future_return_t > 0 else 0
//
// The last `h` rows have no future close, so both columns are missing there
// and finalization drops those rows. A return of exactly zero labels as 0.
// These are the only columns allowed to look forward.
// =============================================================================

use super::columns;
use super::frame::FeatureFrame;
use crate::indicators;
use crate::runtime_config::LabelParams;

/// Forward return over `horizon` rows, aligned with `closes`.
pub fn future_returns(closes: &[Option<f64>], horizon: usize) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|t| {
            let now = closes[t]?;
            let later = (*closes.get(t.checked_add(horizon)?)?)?;
            indicators::ratio(later, now).map(|r| r - 1.0)
        })
        .collect()
}

/// Binarize forward returns: strictly positive => 1, otherwise 0.
pub fn direction_targets(future: &[Option<f64>]) -> Vec<Option<f64>> {
    future
        .iter()
        .map(|r| r.map(|r| if r > 0.0 { 1.0 } else { 0.0 }))
        .collect()
}

/// Append `future_return` and `target`, computed from the frame's `Close`.
///
/// A frame without a `Close` column gets all-missing labels.
pub fn apply_labels(frame: &mut FeatureFrame, params: &LabelParams) {
    let closes = frame
        .column(columns::CLOSE)
        .map(<[Option<f64>]>::to_vec)
        .unwrap_or_else(|| vec![None; frame.len()]);

    let future = future_returns(&closes, params.horizon);
    let target = direction_targets(&future);
    frame.push(columns::FUTURE_RETURN, future);
    frame.push_flag(columns::TARGET, target);
}
