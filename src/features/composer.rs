// =============================================================================
// Feature Composer
// =============================================================================
//
// Applies the indicator library to one price series in a fixed order:
//
//   1. price      — daily_return, log_return, close_lag_{n}
//   2. trend      — sma_{w}, ema_{w}, macd (diff)
//   3. momentum   — rsi_{w}, roc_{w}
//   4. volatility — bb_mavg, bb_high, bb_low, atr
//   5. volume     — obv, volume_change
//
// The raw OHLCV columns come first. Output is a `FeatureFrame` that still has
// warm-up gaps; labels and finalization happen afterwards.
// =============================================================================

use tracing::trace;

use super::columns;
use super::frame::FeatureFrame;
use crate::indicators;
use crate::market_data::PriceSeries;
use crate::runtime_config::FeatureParams;

/// Price columns extracted once and shared by every step.
struct Inputs {
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
}

/// Build the feature frame for `series`. The series is not modified.
pub fn compose(series: &PriceSeries, params: &FeatureParams) -> FeatureFrame {
    let mut frame = FeatureFrame::new(series.asset.clone(), series.dates());
    let inputs = Inputs {
        high: series.highs(),
        low: series.lows(),
        close: series.closes(),
        volume: series.volumes(),
    };

    add_base_columns(&mut frame, series);
    add_price_features(&mut frame, &inputs, params);
    add_trend_features(&mut frame, &inputs, params);
    add_momentum_features(&mut frame, &inputs, params);
    add_volatility_features(&mut frame, &inputs, params);
    add_volume_features(&mut frame, &inputs);

    trace!(asset = %series.asset, rows = frame.len(), columns = frame.columns.len(), "features composed");
    frame
}

fn dense(values: Vec<f64>) -> Vec<Option<f64>> {
    values.into_iter().map(Some).collect()
}

fn add_base_columns(frame: &mut FeatureFrame, series: &PriceSeries) {
    frame.push(columns::OPEN, dense(series.opens()));
    frame.push(columns::HIGH, dense(series.highs()));
    frame.push(columns::LOW, dense(series.lows()));
    frame.push(columns::CLOSE, dense(series.closes()));
    if series.has_adj_close {
        frame.push(columns::ADJ_CLOSE, series.adj_closes());
    }
    frame.push(columns::VOLUME, dense(series.volumes()));
}

fn add_price_features(frame: &mut FeatureFrame, inputs: &Inputs, params: &FeatureParams) {
    frame.push(columns::DAILY_RETURN, indicators::pct_change(&inputs.close, 1));
    frame.push(columns::LOG_RETURN, indicators::log_return(&inputs.close));
    for &lag in &params.lags {
        frame.push(columns::close_lag(lag), indicators::lag(&inputs.close, lag));
    }
}

fn add_trend_features(frame: &mut FeatureFrame, inputs: &Inputs, params: &FeatureParams) {
    frame.push(
        columns::sma(params.sma_window),
        indicators::sma(&inputs.close, params.sma_window),
    );
    frame.push(
        columns::ema(params.ema_window),
        indicators::ema(&inputs.close, params.ema_window),
    );
    frame.push(
        columns::MACD,
        indicators::macd(&inputs.close, params.macd_fast, params.macd_slow, params.macd_signal),
    );
}

fn add_momentum_features(frame: &mut FeatureFrame, inputs: &Inputs, params: &FeatureParams) {
    frame.push(
        columns::rsi(params.rsi_window),
        indicators::rsi(&inputs.close, params.rsi_window),
    );
    frame.push(
        columns::roc(params.roc_window),
        indicators::roc(&inputs.close, params.roc_window),
    );
}

fn add_volatility_features(frame: &mut FeatureFrame, inputs: &Inputs, params: &FeatureParams) {
    let bb = indicators::bollinger(&inputs.close, params.bb_window, params.bb_dev);
    frame.push(columns::BB_MAVG, bb.mid);
    frame.push(columns::BB_HIGH, bb.upper);
    frame.push(columns::BB_LOW, bb.lower);
    frame.push(
        columns::ATR,
        indicators::atr(&inputs.high, &inputs.low, &inputs.close, params.atr_window),
    );
}

fn add_volume_features(frame: &mut FeatureFrame, inputs: &Inputs) {
    frame.push(columns::OBV, indicators::obv(&inputs.close, &inputs.volume));
    frame.push(columns::VOLUME_CHANGE, indicators::pct_change(&inputs.volume, 1));
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Datelike, Duration, NaiveDate, Weekday};

    use super::*;
    use crate::indicators::test_util::leading_missing;
    use crate::market_data::bar::PriceBar;
    use crate::types::AssetId;

    /// Deterministic synthetic series of `n` weekday bars.
    pub(crate) fn synthetic_series(asset: &str, n: usize, seed: f64) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        let mut date = start;
        let bars = (0..n)
            .map(|i| {
                let x = i as f64;
                let close = 100.0 + seed + (x * 0.37 + seed).sin() * 4.0 + x * 0.05;
                let bar = PriceBar {
                    date,
                    open: close - 0.5,
                    high: close + 1.0 + (x * 0.11).cos().abs(),
                    low: close - 1.0 - (x * 0.07).sin().abs(),
                    close,
                    adj_close: None,
                    volume: 1_000.0 + ((x * 1.3 + seed).cos() * 300.0).round(),
                };
                date = date + Duration::days(if date.weekday() == Weekday::Fri { 3 } else { 1 });
                bar
            })
            .collect();
        PriceSeries::new(AssetId::new(asset), bars)
    }

    /// Series with the given closes; other prices derived from close.
    pub(crate) fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                adj_close: None,
                volume: 500.0 + i as f64,
            })
            .collect();
        PriceSeries::new(AssetId::new("FIXTURE"), bars)
    }

    #[test]
    fn column_order_is_fixed() {
        let frame = compose(&synthetic_series("A", 50, 0.0), &FeatureParams::default());
        assert_eq!(
            frame.column_names(),
            vec![
                "Open", "High", "Low", "Close", "Volume", "daily_return", "log_return",
                "close_lag_1", "close_lag_3", "close_lag_7", "sma_10", "ema_10", "macd", "rsi_14",
                "roc_5", "bb_mavg", "bb_high", "bb_low", "atr", "obv", "volume_change",
            ]
        );
    }

    #[test]
    fn adj_close_column_only_when_present() {
        let mut series = synthetic_series("A", 10, 0.0);
        for bar in &mut series.bars {
            bar.adj_close = Some(bar.close * 0.98);
        }
        let series = PriceSeries::new(series.asset.clone(), series.bars);
        let frame = compose(&series, &FeatureParams::default());
        assert_eq!(frame.column_names()[4], "Adj Close");
        assert_eq!(frame.column_names()[5], "Volume");
    }

    #[test]
    fn every_column_is_aligned() {
        let series = synthetic_series("A", 64, 1.0);
        let frame = compose(&series, &FeatureParams::default());
        assert_eq!(frame.len(), 64);
        for column in &frame.columns {
            assert_eq!(column.values.len(), 64, "column {}", column.name);
        }
    }

    #[test]
    fn warm_up_matches_indicator_lookbacks() {
        let params = FeatureParams::default();
        let frame = compose(&synthetic_series("A", 80, 2.0), &params);
        let expect = [
            ("daily_return", 1),
            ("close_lag_7", 7),
            ("sma_10", 9),
            ("ema_10", 9),
            ("macd", 33),
            ("rsi_14", 14),
            ("roc_5", 5),
            ("bb_mavg", 19),
            ("atr", 14),
            ("obv", 0),
            ("volume_change", 1),
        ];
        for (name, missing) in expect {
            assert_eq!(leading_missing(frame.column(name).unwrap()), missing, "column {name}");
        }
        let longest = frame
            .columns
            .iter()
            .map(|c| leading_missing(&c.values))
            .max()
            .unwrap();
        assert_eq!(longest, params.warm_up());
    }

    #[test]
    fn sma_and_bollinger_mid_match_manual_mean() {
        let closes: Vec<f64> = [
            100.0, 101.0, 99.0, 102.0, 103.0, 101.5, 104.0, 102.5, 105.0, 106.0, 104.5, 107.0,
            108.0, 106.5, 109.0, 110.0, 108.5, 111.0, 112.0, 110.5, 113.0, 114.0, 112.5, 115.0,
            116.0, 114.5, 117.0, 118.0, 116.5, 119.0,
        ]
        .to_vec();
        let params = FeatureParams {
            bb_window: 10,
            ..FeatureParams::default()
        };
        let frame = compose(&series_from_closes(&closes), &params);
        let manual = closes[..10].iter().sum::<f64>() / 10.0;
        let sma = frame.column("sma_10").unwrap()[9].unwrap();
        let mid = frame.column("bb_mavg").unwrap()[9].unwrap();
        assert!((sma - manual).abs() < 1e-10);
        assert!((mid - manual).abs() < 1e-10);
        assert_eq!(frame.column("sma_10").unwrap()[8], None);
    }

    #[test]
    fn compose_is_deterministic_and_pure() {
        let series = synthetic_series("A", 120, 3.0);
        let snapshot = series.clone();
        let params = FeatureParams::default();
        let first = compose(&series, &params);
        let second = compose(&series, &params);
        assert_eq!(series, snapshot);
        assert_eq!(first.column_names(), second.column_names());
        for (a, b) in first.columns.iter().zip(&second.columns) {
            let bits_a: Vec<Option<u64>> = a.values.iter().map(|v| v.map(f64::to_bits)).collect();
            let bits_b: Vec<Option<u64>> = b.values.iter().map(|v| v.map(f64::to_bits)).collect();
            assert_eq!(bits_a, bits_b, "column {}", a.name);
        }
    }

    #[test]
    fn custom_windows_rename_columns() {
        let params = FeatureParams {
            lags: vec![2],
            sma_window: 5,
            ema_window: 8,
            rsi_window: 7,
            roc_window: 3,
            ..FeatureParams::default()
        };
        let frame = compose(&synthetic_series("A", 40, 0.0), &params);
        for name in ["close_lag_2", "sma_5", "ema_8", "rsi_7", "roc_3"] {
            assert!(frame.column(name).is_some(), "missing {name}");
        }
        assert!(frame.column("close_lag_1").is_none());
    }
}
