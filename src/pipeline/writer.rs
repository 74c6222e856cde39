// =============================================================================
// Atomic CSV output
// =============================================================================
//
// Every file the pipeline produces is written to a uniquely named hidden
// sibling first, flushed and fsynced, then renamed over the destination. A
// crash leaves either the previous file or the new one, never a partial one.
// The uuid suffix keeps concurrent writers in the same directory apart.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use uuid::Uuid;

use crate::features::columns;
use crate::features::{ColumnKind, FeatureTable};

/// Write a CSV file atomically. `fill` receives a writer positioned at the
/// start of the temporary file.
pub fn write_csv_atomic<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut Writer<File>) -> Result<(), csv::Error>,
{
    let tmp_path = temp_sibling(path);
    let result = write_then_rename(path, &tmp_path, fill);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_then_rename<F>(path: &Path, tmp_path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut Writer<File>) -> Result<(), csv::Error>,
{
    let file = File::create(tmp_path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    fill(&mut writer)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    fs::rename(tmp_path, path)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}

/// Write `table` to `dir/<asset>.csv` and return the final path.
pub fn write_table(table: &FeatureTable, dir: &Path) -> io::Result<PathBuf> {
    let path = dir.join(table.asset.output_file_name());
    write_csv_atomic(&path, |w| {
        let header = std::iter::once(columns::DATE).chain(table.columns.iter().map(|c| c.name.as_str()));
        w.write_record(header)?;

        let mut record: Vec<String> = Vec::with_capacity(table.columns.len() + 1);
        for row in &table.rows {
            record.clear();
            record.push(row.date.format("%Y-%m-%d").to_string());
            for (spec, value) in table.columns.iter().zip(&row.values) {
                record.push(format_value(spec.kind, *value));
            }
            w.write_record(&record)?;
        }
        w.flush()?;
        Ok(())
    })?;
    Ok(path)
}

/// Shortest round-trip representation for values, integers for flags.
fn format_value(kind: ColumnKind, value: f64) -> String {
    match kind {
        ColumnKind::Value => value.to_string(),
        ColumnKind::Flag => {
            if value > 0.0 {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
    }
}
