use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::AssetId;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One validated daily OHLCV bar. All numeric fields are finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Present only when the source file carries an `Adj Close` column.
    pub adj_close: Option<f64>,
    pub volume: f64,
}

/// Chronologically ordered, duplicate-free bars for a single instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub asset: AssetId,
    pub bars: Vec<PriceBar>,
    /// Whether every bar carries an adjusted close.
    pub has_adj_close: bool,
}

impl PriceSeries {
    pub fn new(asset: AssetId, bars: Vec<PriceBar>) -> Self {
        let has_adj_close = !bars.is_empty() && bars.iter().all(|b| b.adj_close.is_some());
        Self {
            asset,
            bars,
            has_adj_close,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// Adjusted closes, `None` for bars without one.
    pub fn adj_closes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.adj_close).collect()
    }
}
