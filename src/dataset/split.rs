// =============================================================================
// Split — merged dataset => train / test files by calendar cutoff
// =============================================================================
//
// Rows are stably sorted by (asset, Date). Rows dated strictly before the
// cutoff go to the train file, the rest to the test file. Both files keep the
// merged header and are written even when empty. Rows whose date does not
// parse are dropped and counted.
// =============================================================================

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::dataset::merge::ASSET_COLUMN;
use crate::error::DatasetError;
use crate::features::columns;
use crate::market_data::loader::parse_date;
use crate::pipeline::writer::write_csv_atomic;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub train_rows: usize,
    pub test_rows: usize,
    /// Rows dropped for an unparseable date.
    pub dropped: usize,
}

struct DatedRow {
    asset: String,
    date: NaiveDate,
    record: StringRecord,
}

/// Split the merged CSV at `input` into `train` and `test` at `cutoff`.
pub fn split_by_date(
    input: &Path,
    cutoff: NaiveDate,
    train: &Path,
    test: &Path,
) -> Result<SplitReport, DatasetError> {
    let csv_err = |source| DatasetError::Csv {
        path: input.to_path_buf(),
        source,
    };
    let mut rdr = ReaderBuilder::new().from_path(input).map_err(csv_err)?;
    let header = rdr.headers().map_err(csv_err)?.clone();

    let find = |name: &'static str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| DatasetError::MissingColumn {
                column: name,
                path: input.to_path_buf(),
            })
    };
    let date_idx = find(columns::DATE)?;
    let asset_idx = find(ASSET_COLUMN)?;

    let mut report = SplitReport::default();
    let mut rows = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let date = record.get(date_idx).and_then(parse_date);
        let Some(date) = date else {
            report.dropped += 1;
            debug!(line = line + 2, "row dropped, unparseable date");
            continue;
        };
        let asset = record.get(asset_idx).unwrap_or_default().to_string();
        rows.push(DatedRow { asset, date, record });
    }

    rows.sort_by(|a, b| a.asset.cmp(&b.asset).then(a.date.cmp(&b.date)));
    let (train_rows, test_rows): (Vec<DatedRow>, Vec<DatedRow>) =
        rows.into_iter().partition(|r| r.date < cutoff);

    write_rows(train, &header, &train_rows)?;
    write_rows(test, &header, &test_rows)?;

    report.train_rows = train_rows.len();
    report.test_rows = test_rows.len();
    info!(
        cutoff = %cutoff,
        train = report.train_rows,
        test = report.test_rows,
        dropped = report.dropped,
        "dataset split written"
    );
    Ok(report)
}

fn write_rows(path: &Path, header: &StringRecord, rows: &[DatedRow]) -> Result<(), DatasetError> {
    write_csv_atomic(path, |w| {
        w.write_record(header)?;
        for row in rows {
            w.write_record(&row.record)?;
        }
        w.flush()?;
        Ok(())
    })
    .map_err(|source| DatasetError::Io {
        path: PathBuf::from(path),
        source,
    })
}
