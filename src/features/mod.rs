// =============================================================================
// Feature engineering: composer, label generator, frame/table types
// =============================================================================

pub mod composer;
pub mod frame;
pub mod label;

pub use composer::compose;
pub use frame::{ColumnKind, FeatureTable};
pub use label::apply_labels;

/// Output column names shared by the composer, label generator and tests.
pub mod columns {
    pub const DATE: &str = "Date";
    pub const OPEN: &str = "Open";
    pub const HIGH: &str = "High";
    pub const LOW: &str = "Low";
    pub const CLOSE: &str = "Close";
    pub const ADJ_CLOSE: &str = "Adj Close";
    pub const VOLUME: &str = "Volume";

    pub const DAILY_RETURN: &str = "daily_return";
    pub const LOG_RETURN: &str = "log_return";
    pub const MACD: &str = "macd";
    pub const BB_MAVG: &str = "bb_mavg";
    pub const BB_HIGH: &str = "bb_high";
    pub const BB_LOW: &str = "bb_low";
    pub const ATR: &str = "atr";
    pub const OBV: &str = "obv";
    pub const VOLUME_CHANGE: &str = "volume_change";

    pub const FUTURE_RETURN: &str = "future_return";
    pub const TARGET: &str = "target";

    pub fn close_lag(lag: usize) -> String {
        format!("close_lag_{lag}")
    }

    pub fn sma(window: usize) -> String {
        format!("sma_{window}")
    }

    pub fn ema(window: usize) -> String {
        format!("ema_{window}")
    }

    pub fn rsi(window: usize) -> String {
        format!("rsi_{window}")
    }

    pub fn roc(window: usize) -> String {
        format!("roc_{window}")
    }
}
