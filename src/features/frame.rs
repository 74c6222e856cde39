// =============================================================================
// Feature frame (candidate table with gaps) and finalized feature table
// =============================================================================
//
// The composer and label generator build a `FeatureFrame`: a date column plus
// named columns of `Option<f64>`, where `None` means "not defined for this
// row".  `finalize` keeps only the rows where every column is defined and
// finite, yielding a dense `FeatureTable` ready to be written.

use chrono::NaiveDate;

use crate::types::AssetId;

/// How a column's values are rendered on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Arbitrary real value.
    Value,
    /// 0/1 indicator, written as an integer.
    Flag,
}

/// One named column of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Option<f64>>,
}

/// Feature columns under construction for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    pub asset: AssetId,
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Column>,
}

impl FeatureFrame {
    pub fn new(asset: AssetId, dates: Vec<NaiveDate>) -> Self {
        Self {
            asset,
            dates,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Append a value column. `values` must be aligned with the dates.
    pub fn push(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.push_column(name.into(), ColumnKind::Value, values);
    }

    /// Append a 0/1 flag column. `values` must be aligned with the dates.
    pub fn push_flag(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.push_column(name.into(), ColumnKind::Flag, values);
    }

    fn push_column(&mut self, name: String, kind: ColumnKind, values: Vec<Option<f64>>) {
        assert_eq!(values.len(), self.dates.len(), "column '{name}' is misaligned");
        assert!(self.column(&name).is_none(), "column '{name}' added twice");
        self.columns.push(Column { name, kind, values });
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    #[cfg(test)]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether every column holds a finite value at `row`.
    fn row_complete(&self, row: usize) -> bool {
        self.columns
            .iter()
            .all(|c| matches!(c.values.get(row), Some(Some(v)) if v.is_finite()))
    }

    /// Drop every row with a missing or non-finite value in any column.
    ///
    /// Row order is preserved; the result may be empty.
    pub fn finalize(self) -> FeatureTable {
        let rows = (0..self.len())
            .filter(|&row| self.row_complete(row))
            .map(|row| FeatureRow {
                date: self.dates[row],
                values: self
                    .columns
                    .iter()
                    .map(|c| c.values[row].unwrap_or_default())
                    .collect(),
            })
            .collect();

        FeatureTable {
            asset: self.asset,
            columns: self
                .columns
                .into_iter()
                .map(|c| ColumnSpec {
                    name: c.name,
                    kind: c.kind,
                })
                .collect(),
            rows,
        }
    }
}

/// Name and rendering of one finalized column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// One complete output row; `values` follows the table's column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

/// Dense feature table for one instrument: no missing values anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub asset: AssetId,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
impl FeatureTable {
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// All values of column `name`, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }
}
