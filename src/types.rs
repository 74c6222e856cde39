// =============================================================================
// Shared types used across the feature pipeline
// =============================================================================

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Canonical instrument identifier: the source filename without extension.
///
/// The same stem names the structured output file and fills the `asset`
/// column when structured files are merged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identifier from a file path (`data/BTC-USD.csv` => `BTC-USD`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() {
            return None;
        }
        Some(Self::new(stem))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name used for this instrument's structured output.
    pub fn output_file_name(&self) -> String {
        format!("{}.csv", self.0)
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `path` names a CSV file (extension compared case-insensitively).
pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}
