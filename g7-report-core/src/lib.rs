//! G7 Color Report Library
//!
//! A stateless library for comparing spectrophotometer patch measurements
//! against a fixed L*a*b* reference set.
//!
//! # Architecture
//!
//! One report cycle is a straight pipeline:
//! - Load the reference set once at startup (`ReferenceSet::load`)
//! - Parse an upload into a typed table (`parse_measurements`)
//! - Compute per-patch ΔE, max, mean and the pass verdict (`compute_report`)
//! - Optionally persist the result for a printer and week (`ReportLogger`)
//!
//! The library does NOT:
//! - Render charts or tables
//! - Hold session state (selected printer, week, current report)
//! - Read configuration files
//!
//! All of that lives in the application layer (g7-report-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use g7_report_core::{parse_measurement_file, FsLogSink, ReferenceSet, ReportEngine, ReportLogger};
//! use std::path::Path;
//!
//! let reference = ReferenceSet::load(Path::new("data/g7_reference_lab.csv")).unwrap();
//! let engine = ReportEngine::new(&reference);
//!
//! let upload = parse_measurement_file(Path::new("spectro.csv")).unwrap();
//! let result = engine.compute(upload).unwrap();
//! println!("Max ΔE {:.2} ({})", result.max_delta_e(), if result.pass() { "pass" } else { "fail" });
//!
//! let logger = ReportLogger::new(FsLogSink::default());
//! logger.log_report(&result, "Mutoh 924 #1", "Week1").unwrap();
//! ```

// Public modules
pub mod delimited;
pub mod engine;
pub mod logger;
pub mod parser;
pub mod reference;
pub mod table;
pub mod types;

// Re-export main types for convenience
pub use engine::{compute_report, delta_e, ComparisonResult, PatchDeviation, ReportEngine, ReportSummary};
pub use logger::{log_key, FsLogSink, LogSink, ReportLogger, DEFAULT_LOG_DIR};
pub use parser::{parse_measurement_file, parse_measurements};
pub use reference::ReferenceSet;
pub use table::{Column, ColumnValues, Table};
pub use types::{ReportError, Result, PASS_THRESHOLD};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
