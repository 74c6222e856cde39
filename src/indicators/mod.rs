// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the windowed statistics used by
// the feature composer.  Every indicator takes its parameters explicitly and
// returns a series aligned 1:1 with its input, where `None` marks a row the
// indicator cannot define yet (warm-up) or at all (division by zero).
//
// Each module also exposes `lookback(..)`: the number of leading rows that
// stay `None` for a long enough input.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod price;
pub mod roc;
pub mod rsi;
pub mod sma;

pub use atr::atr;
pub use bollinger::bollinger;
pub use ema::ema;
pub use macd::macd;
pub use obv::obv;
pub use price::{lag, log_return, pct_change};
pub use roc::roc;
pub use rsi::rsi;
pub use sma::sma;

/// Keep finite values only; NaN and infinities become missing.
pub(crate) fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// `numerator / denominator`, missing when the denominator is zero or the
/// result is not finite.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    finite(numerator / denominator)
}
