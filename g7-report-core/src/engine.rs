//! ΔE comparison engine
//!
//! Pairs measured and reference patches by row position and computes the
//! Euclidean distance between them in L*a*b* space. The engine is stateless:
//! the reference set is passed in explicitly and nothing is cached between
//! reports.

use crate::reference::ReferenceSet;
use crate::table::{Column, Table};
use crate::types::{
    ReportError, Result, DELTA_E_COLUMN, PASS_THRESHOLD, PATCH_COLUMN, REQUIRED_COLUMNS,
};
use serde::Serialize;

/// ΔE of a single patch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchDeviation {
    /// Patch label (from the upload, or the 0-based row index)
    pub patch: String,
    /// Euclidean distance to the reference patch
    pub delta_e: f64,
}

/// Aggregate figures of a report, suitable for machine-readable output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub patches: usize,
    pub max_delta_e: f64,
    pub mean_delta_e: f64,
    pub pass: bool,
    pub threshold: f64,
}

/// Outcome of one report cycle
///
/// Only ever constructed whole: either every patch has a finite ΔE and the
/// aggregates are set, or no result exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    table: Table,
    deviations: Vec<PatchDeviation>,
    max_delta_e: f64,
    mean_delta_e: f64,
    pass: bool,
}

impl ComparisonResult {
    /// The uploaded table with `DeltaE` (and a synthesized `Patch`, if absent) appended
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Per-patch deviation series, in row order
    pub fn deviations(&self) -> &[PatchDeviation] {
        &self.deviations
    }

    pub fn max_delta_e(&self) -> f64 {
        self.max_delta_e
    }

    pub fn mean_delta_e(&self) -> f64 {
        self.mean_delta_e
    }

    /// True iff the largest ΔE is within `PASS_THRESHOLD`
    pub fn pass(&self) -> bool {
        self.pass
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            patches: self.deviations.len(),
            max_delta_e: self.max_delta_e,
            mean_delta_e: self.mean_delta_e,
            pass: self.pass,
            threshold: PASS_THRESHOLD,
        }
    }
}

/// Report engine bound to one reference set
pub struct ReportEngine<'a> {
    reference: &'a ReferenceSet,
}

impl<'a> ReportEngine<'a> {
    pub fn new(reference: &'a ReferenceSet) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> &ReferenceSet {
        self.reference
    }

    /// Compare an uploaded measurement table against the reference
    pub fn compute(&self, measurement: Table) -> Result<ComparisonResult> {
        compute_report(measurement, self.reference)
    }
}

/// Euclidean distance between two L*a*b* coordinates
pub fn delta_e(measured: [f64; 3], reference: [f64; 3]) -> f64 {
    let [dl, da, db] = [
        measured[0] - reference[0],
        measured[1] - reference[1],
        measured[2] - reference[2],
    ];
    // hypot avoids overflow in the intermediate squares
    dl.hypot(da).hypot(db)
}

/// Compare a measurement table against the reference set
///
/// Rows are paired by position and both tables must have the same number of
/// rows. Fails without producing any result when a required column is
/// missing, a coordinate is not numeric, or a ΔE cannot be computed.
pub fn compute_report(measurement: Table, reference: &ReferenceSet) -> Result<ComparisonResult> {
    check_required_columns(&measurement, "uploaded")?;
    check_required_columns(reference.table(), "reference")?;

    if measurement.is_empty() {
        return Err(ReportError::EmptyMeasurement);
    }
    if measurement.num_rows() != reference.len() {
        return Err(ReportError::RowCountMismatch {
            measured: measurement.num_rows(),
            reference: reference.len(),
        });
    }

    let measured = coordinates(&measurement)?;
    let expected = coordinates(reference.table())?;

    let mut delta = Vec::with_capacity(measurement.num_rows());
    for row in 0..measurement.num_rows() {
        let m = [measured[0][row], measured[1][row], measured[2][row]];
        let r = [expected[0][row], expected[1][row], expected[2][row]];

        if let Some(axis) = m.iter().position(|v| !v.is_finite()) {
            return Err(ReportError::Computation(format!(
                "row {}: uploaded '{}' is not a number",
                row, REQUIRED_COLUMNS[axis]
            )));
        }

        let value = delta_e(m, r);
        if !value.is_finite() {
            return Err(ReportError::Computation(format!(
                "row {}: ΔE is not finite",
                row
            )));
        }
        delta.push(value);
    }

    warn_on_patch_mismatch(&measurement, reference.table());

    let max_delta_e = delta.iter().copied().fold(f64::MIN, f64::max);
    let mean_delta_e = delta.iter().sum::<f64>() / delta.len() as f64;
    let pass = max_delta_e <= PASS_THRESHOLD;

    let mut table = measurement;
    table.push_column(Column::numeric(DELTA_E_COLUMN, delta.clone()))?;
    if !table.has_column(PATCH_COLUMN) {
        let index = (0..table.num_rows()).map(|i| i as f64).collect();
        table.push_column(Column::numeric(PATCH_COLUMN, index))?;
    }

    let patch_col = table
        .columns()
        .iter()
        .position(|c| c.name == PATCH_COLUMN)
        .unwrap_or_default();
    let deviations = delta
        .iter()
        .enumerate()
        .map(|(row, &delta_e)| PatchDeviation {
            patch: table.cell_text(row, patch_col),
            delta_e,
        })
        .collect();

    log::info!(
        "Computed ΔE for {} patches: max {:.2}, mean {:.2}, {}",
        table.num_rows(),
        max_delta_e,
        mean_delta_e,
        if pass { "pass" } else { "fail" }
    );

    Ok(ComparisonResult {
        table,
        deviations,
        max_delta_e,
        mean_delta_e,
        pass,
    })
}

fn check_required_columns(table: &Table, side: &str) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::MissingColumns {
            table: side.to_string(),
            missing,
        })
    }
}

fn coordinates(table: &Table) -> Result<[&[f64]; 3]> {
    Ok([
        table.numeric(REQUIRED_COLUMNS[0])?,
        table.numeric(REQUIRED_COLUMNS[1])?,
        table.numeric(REQUIRED_COLUMNS[2])?,
    ])
}

fn warn_on_patch_mismatch(measurement: &Table, reference: &Table) {
    let (Some(m), Some(r)) = (measurement.column(PATCH_COLUMN), reference.column(PATCH_COLUMN))
    else {
        return;
    };

    let mismatched = (0..measurement.num_rows())
        .filter(|&row| m.values.cell_text(row) != r.values.cell_text(row))
        .count();
    if mismatched > 0 {
        log::warn!(
            "{} patch labels differ from the reference; rows are compared by position",
            mismatched
        );
    }
}
