//! Report persistence
//!
//! A logged report is the uploaded table with its `DeltaE` column plus
//! `Printer` and `Week` columns, stored under a key derived from the printer
//! name and week label. Writing the same key again replaces the old record.

use crate::delimited;
use crate::engine::ComparisonResult;
use crate::table::Table;
use crate::types::{ReportError, Result, PRINTER_COLUMN, WEEK_COLUMN};
use std::fs;
use std::path::{Path, PathBuf};

/// Default directory for logged reports
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Storage addressed by log key
pub trait LogSink {
    /// Store a record, replacing any existing record under the same key
    fn write(&self, key: &str, contents: &[u8]) -> Result<()>;

    /// Fetch a previously stored record
    fn read(&self, key: &str) -> Result<Vec<u8>>;
}

/// Log sink storing each record as `<dir>/<key>.csv`
#[derive(Debug, Clone)]
pub struct FsLogSink {
    dir: PathBuf,
}

impl FsLogSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a key is stored under
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", key))
    }
}

impl Default for FsLogSink {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_DIR)
    }
}

impl LogSink for FsLogSink {
    fn write(&self, key: &str, contents: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        fs::write(&path, contents)?;
        log::info!("Wrote report log: {:?}", path);
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ReportError::LogNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Build the storage key for a printer and week label
///
/// Spaces in the printer name become underscores. The week label is used as
/// given, but keys that could escape the log namespace are rejected.
pub fn log_key(printer: &str, week: &str) -> Result<String> {
    let key = format!("{}_{}", printer.replace(' ', "_"), week);

    let escapes = key.contains(['/', '\\']) || key.contains("..");
    if printer.trim().is_empty() || escapes {
        return Err(ReportError::InvalidLogKey(key));
    }
    Ok(key)
}

/// Writes and reads logged reports through a sink
pub struct ReportLogger<S: LogSink> {
    sink: S,
}

impl<S: LogSink> ReportLogger<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Persist a report for a printer and week
    ///
    /// # Returns
    /// * `Result<String>` - the key the record was stored under
    pub fn log_report(&self, result: &ComparisonResult, printer: &str, week: &str) -> Result<String> {
        let key = log_key(printer, week)?;
        let record = log_record(result, printer, week);

        log::debug!("Logging {} rows under key {}", record.num_rows(), key);
        self.sink.write(&key, delimited::write_table(&record).as_bytes())?;
        Ok(key)
    }

    /// Read back the record logged for a printer and week
    pub fn load_log(&self, printer: &str, week: &str) -> Result<Table> {
        let key = log_key(printer, week)?;
        let bytes = self.sink.read(&key)?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| ReportError::Parse(format!("log {} is not valid UTF-8: {}", key, e)))?;
        delimited::read_table_with_text(text, &[PRINTER_COLUMN, WEEK_COLUMN])
    }
}

/// The row-level report data augmented with printer and week columns
pub fn log_record(result: &ComparisonResult, printer: &str, week: &str) -> Table {
    let mut table = result.table().clone();
    table.set_constant_column(PRINTER_COLUMN, printer);
    table.set_constant_column(WEEK_COLUMN, week);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute_report;
    use crate::reference::ReferenceSet;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory sink for exercising the logger without a filesystem
    #[derive(Default)]
    struct MemorySink {
        records: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl LogSink for MemorySink {
        fn write(&self, key: &str, contents: &[u8]) -> Result<()> {
            self.records.borrow_mut().insert(key.to_string(), contents.to_vec());
            Ok(())
        }

        fn read(&self, key: &str) -> Result<Vec<u8>> {
            self.records
                .borrow()
                .get(key)
                .cloned()
                .ok_or_else(|| ReportError::LogNotFound(key.to_string()))
        }
    }

    fn result() -> ComparisonResult {
        let reference = ReferenceSet::from_csv("Patch,L,a,b\nP1,50,0,0\n").unwrap();
        let upload = crate::parser::parse_measurements(b"Patch,L,a,b\nP1,53,4,0\n").unwrap();
        compute_report(upload, &reference).unwrap()
    }

    #[test]
    fn test_log_key() {
        assert_eq!(log_key("Mutoh 924 #1", "Week1").unwrap(), "Mutoh_924_#1_Week1");
        assert_eq!(log_key("PrinterX", "").unwrap(), "PrinterX_");
        assert!(matches!(
            log_key("Mutoh 924 #1", "01/01/2025"),
            Err(ReportError::InvalidLogKey(_))
        ));
        assert!(log_key("P", "..\\x").is_err());
        assert!(log_key(" ", "Week1").is_err());
    }

    #[test]
    fn test_log_record_columns() {
        let record = log_record(&result(), "PrinterX", "Week1");
        assert_eq!(
            record.column_names(),
            vec!["Patch", "L", "a", "b", "DeltaE", "Printer", "Week"]
        );
        assert_eq!(
            delimited::write_table(&record),
            "Patch,L,a,b,DeltaE,Printer,Week\nP1,53,4,0,5,PrinterX,Week1\n"
        );
    }

    #[test]
    fn test_log_and_reload_through_memory_sink() {
        let logger = ReportLogger::new(MemorySink::default());
        let key = logger.log_report(&result(), "PrinterX", "Week1").unwrap();
        assert_eq!(key, "PrinterX_Week1");

        let table = logger.load_log("PrinterX", "Week1").unwrap();
        assert_eq!(table.numeric("DeltaE").unwrap(), &[5.0]);
        assert_eq!(table.cell_text(0, 5), "PrinterX");

        assert!(matches!(
            logger.load_log("PrinterX", "Week2"),
            Err(ReportError::LogNotFound(_))
        ));
    }

    #[test]
    fn test_numeric_looking_labels_survive_reload() {
        let logger = ReportLogger::new(MemorySink::default());
        for week in ["2025.10", "01"] {
            logger.log_report(&result(), "924", week).unwrap();
            let table = logger.load_log("924", week).unwrap();
            assert_eq!(
                table.column(WEEK_COLUMN).unwrap().values,
                crate::table::ColumnValues::Text(vec![week.to_string()])
            );
            assert_eq!(table.cell_text(0, 5), "924");
        }
    }

    #[test]
    fn test_fs_sink_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsLogSink::new(dir.path().join("nested").join("logs"));
        sink.write("k", b"x\n").unwrap();
        assert_eq!(sink.read("k").unwrap(), b"x\n");
        assert!(sink.path_for("k").exists());
        assert!(matches!(sink.read("missing"), Err(ReportError::LogNotFound(_))));
    }
}
