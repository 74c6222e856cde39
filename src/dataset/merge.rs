// =============================================================================
// Merge — STRUCTURED/<asset>.csv files => one long-format CSV
// =============================================================================
//
// Files are read in file-name order. Every row gets a trailing `asset` column
// holding the file stem. Rows with any empty or NaN cell are dropped. The
// first readable file fixes the header; later files with a different header
// are skipped with a warning, as are files that cannot be read.
// =============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};

use crate::error::DatasetError;
use crate::pipeline::writer::write_csv_atomic;
use crate::types::{is_csv_path, AssetId};

/// Name of the column appended by the merge.
pub const ASSET_COLUMN: &str = "asset";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub files_merged: usize,
    pub files_skipped: usize,
    pub rows_written: usize,
    pub rows_dropped: usize,
    /// `None` when there was nothing to merge.
    pub output: Option<PathBuf>,
}

/// Merge every structured CSV in `dir` into `output`.
pub fn merge_structured(dir: &Path, output: &Path) -> Result<MergeReport, DatasetError> {
    let files = list_inputs(dir, output)?;
    let mut report = MergeReport::default();

    let mut header: Option<StringRecord> = None;
    let mut rows: Vec<StringRecord> = Vec::new();

    for path in &files {
        let Some(asset) = AssetId::from_path(path) else {
            continue;
        };
        let (file_header, records) = match read_all(path) {
            Ok(read) => read,
            Err(e) => {
                warn!(asset = %asset, error = %e, "file unreadable, skipped from merge");
                report.files_skipped += 1;
                continue;
            }
        };

        match &header {
            Some(expected) if *expected != file_header => {
                warn!(asset = %asset, path = %path.display(), "header differs, skipped from merge");
                report.files_skipped += 1;
                continue;
            }
            Some(_) => {}
            None => header = Some(file_header),
        }

        let before = rows.len();
        for mut record in records {
            if record.iter().any(is_missing) {
                report.rows_dropped += 1;
                continue;
            }
            record.push_field(asset.as_str());
            rows.push(record);
        }
        debug!(asset = %asset, rows = rows.len() - before, "file merged");
        report.files_merged += 1;
    }

    let Some(mut header) = header else {
        warn!(dir = %dir.display(), "no structured csv files to merge");
        return Ok(report);
    };
    header.push_field(ASSET_COLUMN);

    write_csv_atomic(output, |w| {
        w.write_record(&header)?;
        for row in &rows {
            w.write_record(row)?;
        }
        w.flush()?;
        Ok(())
    })
    .map_err(|source| DatasetError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    report.rows_written = rows.len();
    report.output = Some(output.to_path_buf());
    info!(
        files = report.files_merged,
        skipped = report.files_skipped,
        rows = report.rows_written,
        dropped = report.rows_dropped,
        path = %output.display(),
        "merged dataset written"
    );
    Ok(report)
}

fn list_inputs(dir: &Path, output: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let output = fs::canonicalize(output).ok();

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() || !is_csv_path(&path) {
            continue;
        }
        if output.is_some() && fs::canonicalize(&path).ok() == output {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn read_all(path: &Path) -> Result<(StringRecord, Vec<StringRecord>), csv::Error> {
    let mut rdr = ReaderBuilder::new().from_path(path)?;
    let header = rdr.headers()?.clone();
    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
    Ok((header, records))
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("nan")
}
