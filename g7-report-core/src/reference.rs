//! Reference patch set
//!
//! The reference table is loaded once at startup and handed by reference into
//! every comparison. Loading validates the whole table up front, so a
//! `ReferenceSet` always has finite numeric `L`, `a` and `b` columns.

use crate::delimited;
use crate::table::Table;
use crate::types::{ReportError, Result, REQUIRED_COLUMNS};
use std::path::Path;

/// Immutable reference data for a comparison
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSet {
    table: Table,
}

impl ReferenceSet {
    /// Load the reference set from a delimited file
    ///
    /// # Arguments
    /// * `path` - Path to the reference CSV
    ///
    /// # Returns
    /// * `Result<ReferenceSet>` - `ReferenceLoad` error if the file is unreadable,
    ///   malformed, or lacks numeric `L`/`a`/`b` columns
    ///
    /// # Example
    /// ```no_run
    /// use g7_report_core::ReferenceSet;
    /// use std::path::Path;
    ///
    /// let reference = ReferenceSet::load(Path::new("data/g7_reference_lab.csv")).unwrap();
    /// println!("{} reference patches", reference.len());
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading reference data: {:?}", path);

        let text = std::fs::read_to_string(path)
            .map_err(|e| ReportError::ReferenceLoad(format!("failed to read {:?}: {}", path, e)))?;

        let reference = Self::from_csv(&text)?;
        log::info!("Loaded {} reference patches from {:?}", reference.len(), path);
        Ok(reference)
    }

    /// Build a reference set from delimited text
    pub fn from_csv(text: &str) -> Result<Self> {
        let table = delimited::read_table(text)
            .map_err(|e| ReportError::ReferenceLoad(e.to_string()))?;
        Self::from_table(table)
    }

    /// Validate an already-parsed table as reference data
    pub fn from_table(table: Table) -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !table.has_column(c))
            .collect();
        if !missing.is_empty() {
            return Err(ReportError::ReferenceLoad(format!(
                "missing required columns {:?} (found {:?})",
                missing,
                table.column_names()
            )));
        }

        for name in REQUIRED_COLUMNS {
            let values = table
                .numeric(name)
                .map_err(|e| ReportError::ReferenceLoad(e.to_string()))?;
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(ReportError::ReferenceLoad(format!(
                    "column '{}' has no numeric value at row {}",
                    name, row
                )));
            }
        }

        if table.is_empty() {
            return Err(ReportError::ReferenceLoad("reference has no patches".to_string()));
        }

        Ok(Self { table })
    }

    /// The underlying table (for diagnostics and display)
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.table.column_names()
    }

    /// Number of reference patches
    pub fn len(&self) -> usize {
        self.table.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
