//! Core types for the G7 report library
//!
//! This module defines the error type shared by every stage of a report cycle
//! (reference load, upload parse, ΔE computation, log persistence) and the
//! fixed constants of the comparison.

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Maximum ΔE (inclusive) for a report to pass
pub const PASS_THRESHOLD: f64 = 5.0;

/// Columns that must be present on both sides of a comparison
pub const REQUIRED_COLUMNS: [&str; 3] = ["L", "a", "b"];

/// Patch identifier column
pub const PATCH_COLUMN: &str = "Patch";

/// Column appended to the measurement table by the engine
pub const DELTA_E_COLUMN: &str = "DeltaE";

/// Columns appended to a measurement table when it is logged
pub const PRINTER_COLUMN: &str = "Printer";
pub const WEEK_COLUMN: &str = "Week";

/// Errors that can occur during a report cycle
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to load reference data: {0}")]
    ReferenceLoad(String),

    #[error("Could not read uploaded file: {0}")]
    Parse(String),

    #[error("Both uploaded file and reference must contain 'L', 'a', and 'b' columns (missing from {table}: {missing:?})")]
    MissingColumns {
        /// Which side of the comparison is incomplete ("uploaded" / "reference")
        table: String,
        /// The required columns that were not found
        missing: Vec<String>,
    },

    #[error("Column '{column}' is not numeric (row {row}: {value:?})")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Uploaded file has {measured} patches but the reference has {reference}")]
    RowCountMismatch { measured: usize, reference: usize },

    #[error("Uploaded file contains no patches")]
    EmptyMeasurement,

    #[error("Error calculating ΔE: {0}")]
    Computation(String),

    #[error("Invalid log key: {0:?}")]
    InvalidLogKey(String),

    #[error("No log found for key: {0}")]
    LogNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_names_requirement() {
        let err = ReportError::MissingColumns {
            table: "uploaded".to_string(),
            missing: vec!["a".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'L', 'a', and 'b'"));
        assert!(msg.contains("uploaded"));
    }

    #[test]
    fn test_row_count_mismatch_message() {
        let err = ReportError::RowCountMismatch { measured: 3, reference: 4 };
        assert_eq!(
            err.to_string(),
            "Uploaded file has 3 patches but the reference has 4"
        );
    }
}
