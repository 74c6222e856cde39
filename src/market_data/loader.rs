// =============================================================================
// Series Loader — raw per-instrument CSV => validated PriceSeries
// =============================================================================
//
// Cleaning rules, applied row by row:
//   1. Date must parse to a calendar date, otherwise the row is dropped.
//   2. Open/High/Low/Close/Volume (and Adj Close when the header has it) must
//      be finite numbers, otherwise the row is dropped.
//   3. Surviving rows are stably sorted by date; on duplicate dates the first
//      row in file order is kept.
//
// A file with zero surviving rows is an EmptyInput error. Column order is free;
// headers are matched case-insensitively.
// =============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::debug;

use crate::error::{LoadError, RowError};
use crate::market_data::bar::{PriceBar, PriceSeries};
use crate::types::AssetId;

/// Row accounting for the per-instrument status line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Data rows read from the file (header excluded).
    pub rows_read: usize,
    /// Rows dropped for an unparseable date or non-numeric field.
    pub malformed: usize,
    /// Rows dropped because an earlier row carried the same date.
    pub duplicates: usize,
}

impl LoadReport {
    pub fn kept(&self) -> usize {
        self.rows_read - self.malformed - self.duplicates
    }
}

/// Positions of the recognised columns within a header record.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: Option<usize>,
    volume: usize,
}

impl ColumnIndex {
    fn from_header(header: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &'static str| find(name).ok_or(LoadError::MissingColumn { column: name });

        Ok(Self {
            date: require("Date")?,
            open: require("Open")?,
            high: require("High")?,
            low: require("Low")?,
            close: require("Close")?,
            adj_close: find("Adj Close"),
            volume: require("Volume")?,
        })
    }
}

/// Load and clean the CSV at `path`. The asset identifier is the file stem.
pub fn load_series(path: &Path) -> Result<(PriceSeries, LoadReport), LoadError> {
    let asset = AssetId::from_path(path).ok_or_else(|| LoadError::EmptyInput {
        path: path.to_path_buf(),
    })?;
    let file = File::open(path)?;
    read_series(asset, file, path)
}

/// Load and clean CSV data from any reader. `source` is only used in errors.
pub fn read_series<R: Read>(
    asset: AssetId,
    reader: R,
    source: &Path,
) -> Result<(PriceSeries, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    // Fields are decoded per row so that one badly encoded row is dropped
    // like any other malformed row instead of failing the file.
    let header = StringRecord::from_byte_record_lossy(rdr.byte_headers()?.clone());
    let columns = ColumnIndex::from_header(&header)?;

    let mut report = LoadReport::default();
    let mut bars = Vec::new();

    for result in rdr.byte_records() {
        let record = result?;
        report.rows_read += 1;
        match parse_row(&record, &columns) {
            Ok(bar) => bars.push(bar),
            Err(e) => {
                report.malformed += 1;
                debug!(asset = %asset, line = report.rows_read + 1, reason = %e, "row dropped");
            }
        }
    }

    // Stable: equal dates keep file order, so dedup keeps the first occurrence.
    bars.sort_by_key(|b| b.date);
    let before = bars.len();
    bars.dedup_by_key(|b| b.date);
    report.duplicates = before - bars.len();

    let series = PriceSeries::new(asset, bars);
    if series.is_empty() {
        return Err(LoadError::EmptyInput {
            path: source.to_path_buf(),
        });
    }

    Ok((series, report))
}

fn parse_row(record: &ByteRecord, columns: &ColumnIndex) -> Result<PriceBar, RowError> {
    let raw_date = field(record, columns.date, "Date")?;
    let date = std::str::from_utf8(raw_date)
        .ok()
        .and_then(parse_date)
        .ok_or_else(|| RowError::BadDate {
            value: String::from_utf8_lossy(raw_date).into_owned(),
        })?;

    let adj_close = match columns.adj_close {
        Some(idx) => Some(number(record, idx, "Adj Close")?),
        None => None,
    };

    Ok(PriceBar {
        date,
        open: number(record, columns.open, "Open")?,
        high: number(record, columns.high, "High")?,
        low: number(record, columns.low, "Low")?,
        close: number(record, columns.close, "Close")?,
        adj_close,
        volume: number(record, columns.volume, "Volume")?,
    })
}

fn field<'r>(record: &'r ByteRecord, idx: usize, column: &'static str) -> Result<&'r [u8], RowError> {
    record.get(idx).ok_or(RowError::MissingField { column })
}

fn number(record: &ByteRecord, idx: usize, column: &'static str) -> Result<f64, RowError> {
    let raw = field(record, idx, column)?;
    match std::str::from_utf8(raw).ok().and_then(|s| s.parse::<f64>().ok()) {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(RowError::BadNumber {
            column,
            value: String::from_utf8_lossy(raw).into_owned(),
        }),
    }
}

/// Parse a calendar date, accepting plain dates and timestamps.
///
/// For timestamps carrying an offset the local date part is kept, so
/// `2021-01-04 00:00:00-05:00` is 2021-01-04.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.date_naive());
        }
    }

    let fmts = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in &fmts {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Result<(PriceSeries, LoadReport), LoadError> {
        read_series(AssetId::new("TEST"), csv.as_bytes(), Path::new("TEST.csv"))
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn loads_clean_file() {
        let csv = "\
Date,Open,High,Low,Close,Volume
2024-01-02,10,12,9,11,1000
2024-01-03,11,13,10,12,1500
";
        let (series, report) = load(csv).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(report.rows_read, 2);
        assert_eq!(report.kept(), 2);
        assert!(!series.has_adj_close);
        let bar = &series.bars[1];
        assert_eq!(bar.date, date("2024-01-03"));
        assert_eq!(bar.close, 12.0);
        assert_eq!(bar.volume, 1500.0);
    }

    #[test]
    fn sorts_unsorted_input() {
        let csv = "\
Date,Open,High,Low,Close,Volume
2024-01-04,3,3,3,3,1
2024-01-02,1,1,1,1,1
2024-01-03,2,2,2,2,1
";
        let (series, _) = load(csv).unwrap();
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert!(series.dates().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn duplicate_dates_keep_first_row() {
        let csv = "\
Date,Open,High,Low,Close,Volume
2024-01-03,2,2,2,2,1
2024-01-02,1,1,1,1,1
2024-01-03,9,9,9,9,9
";
        let (series, report) = load(csv).unwrap();
        assert_eq!(series.closes(), vec![1.0, 2.0]);
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn malformed_rows_are_dropped_not_fatal() {
        let csv = "\
Date,Open,High,Low,Close,Volume
Ticker,AAPL,AAPL,AAPL,AAPL,AAPL
2024-01-02,1,1,1,1,100
not-a-date,1,1,1,1,100
2024-01-03,2,2,2,abc,100
2024-01-04,3,3,3,3,
2024-01-05,4,4,4,NaN,100
2024-01-08,5,5,5,5,100
";
        let (series, report) = load(csv).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(report.rows_read, 7);
        assert_eq!(report.malformed, 5);
        assert_eq!(series.dates(), vec![date("2024-01-02"), date("2024-01-08")]);
    }

    #[test]
    fn badly_encoded_row_is_dropped_not_fatal() {
        let mut csv = b"Date,Open,High,Low,Close,Volume\n2024-01-02,1,1,1,1,100\n".to_vec();
        csv.extend_from_slice(b"2024-01-03,1,1,1,\xff,100\n");
        csv.extend_from_slice(b"\xfe2024-01-04,1,1,1,1,100\n");
        csv.extend_from_slice(b"2024-01-05,2,2,2,2,100\n");
        let (series, report) =
            read_series(AssetId::new("TEST"), csv.as_slice(), Path::new("TEST.csv")).unwrap();
        assert_eq!(series.dates(), vec![date("2024-01-02"), date("2024-01-05")]);
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.malformed, 2);
    }

    #[test]
    fn badly_encoded_row_reason_names_the_column() {
        let mut record = ByteRecord::new();
        for field in ["2024-01-03", "1", "1", "1"] {
            record.push_field(field.as_bytes());
        }
        record.push_field(b"\xff");
        record.push_field(b"1");
        let header = StringRecord::from(vec!["Date", "Open", "High", "Low", "Close", "Volume"]);
        let columns = ColumnIndex::from_header(&header).unwrap();
        match parse_row(&record, &columns) {
            Err(RowError::BadNumber { column, .. }) => assert_eq!(column, "Close"),
            other => panic!("expected BadNumber, got {other:?}"),
        }
    }

    #[test]
    fn short_rows_are_dropped() {
        let csv = "\
Date,Open,High,Low,Close,Volume
2024-01-02,1,1,1
2024-01-03,2,2,2,2,10
";
        let (series, report) = load(csv).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(report.malformed, 1);
    }

    #[test]
    fn empty_after_cleaning_is_error() {
        let csv = "\
Date,Open,High,Low,Close,Volume
garbage,1,1,1,1,1
";
        assert!(matches!(load(csv), Err(LoadError::EmptyInput { .. })));
        assert!(matches!(
            load("Date,Open,High,Low,Close,Volume\n"),
            Err(LoadError::EmptyInput { .. })
        ));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let csv = "Date,Open,High,Low,Volume\n2024-01-02,1,1,1,1\n";
        match load(csv) {
            Err(LoadError::MissingColumn { column }) => assert_eq!(column, "Close"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn adj_close_is_carried_when_present() {
        let csv = "\
volume,close,Adj Close,low,high,open,date
100,11,10.5,9,12,10,2024-01-02
";
        let (series, _) = load(csv).unwrap();
        assert!(series.has_adj_close);
        assert_eq!(series.bars[0].adj_close, Some(10.5));
        assert_eq!(series.bars[0].open, 10.0);
        assert_eq!(series.bars[0].volume, 100.0);
    }

    #[test]
    fn input_text_is_not_mutated() {
        let csv = String::from("Date,Open,High,Low,Close,Volume\n2024-01-02,1,1,1,1,1\n");
        let copy = csv.clone();
        let _ = load(&csv).unwrap();
        assert_eq!(csv, copy);
    }

    #[test]
    fn parse_date_formats() {
        let expected = date("2021-01-04");
        assert_eq!(parse_date("2021-01-04"), Some(expected));
        assert_eq!(parse_date("2021/01/04"), Some(expected));
        assert_eq!(parse_date("2021.01.04"), Some(expected));
        assert_eq!(parse_date("2021-01-04 00:00:00"), Some(expected));
        assert_eq!(parse_date("2021-01-04 00:00:00-05:00"), Some(expected));
        assert_eq!(parse_date("2021-01-04T00:00:00Z"), Some(expected));
        assert_eq!(parse_date(" 2021-01-04 "), Some(expected));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2021-13-40"), None);
        assert_eq!(parse_date("Ticker"), None);
    }
}
