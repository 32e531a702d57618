//! Measurement upload parser
//!
//! Turns the raw bytes of an uploaded spectrophotometer export into a typed
//! measurement table. Exports that wrap each whole row in quotes come through
//! as a single column with embedded commas; those are re-split into the
//! canonical `Patch, L, a, b` layout.

use crate::delimited;
use crate::table::{Column, Table};
use crate::types::{ReportError, Result, PATCH_COLUMN};
use std::path::Path;

/// Header imposed on uploads recovered by the single-column fallback
pub const CANONICAL_HEADER: [&str; 4] = [PATCH_COLUMN, "L", "a", "b"];

/// Parse an uploaded measurement file from raw bytes
///
/// # Returns
/// * `Result<Table>` - the measurement table, or a `Parse` error describing
///   why the upload could not be read
pub fn parse_measurements(bytes: &[u8]) -> Result<Table> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ReportError::Parse(format!("file is not valid UTF-8: {}", e)))?;

    let table = delimited::read_table(text)?;

    if needs_resplit(&table) {
        log::warn!(
            "Upload parsed as a single column '{}', re-splitting on commas",
            table.column_names()[0]
        );
        return resplit_single_column(&table);
    }

    log::info!(
        "Parsed upload: {} rows, columns {:?}",
        table.num_rows(),
        table.column_names()
    );
    Ok(table)
}

/// Read and parse a measurement file from disk
pub fn parse_measurement_file(path: &Path) -> Result<Table> {
    log::info!("Reading measurement file: {:?}", path);
    let bytes = std::fs::read(path)
        .map_err(|e| ReportError::Parse(format!("failed to read {:?}: {}", path, e)))?;
    parse_measurements(&bytes)
}

/// The delimiter was not recognised when the only column carries commas
fn needs_resplit(table: &Table) -> bool {
    let [column] = table.columns() else {
        return false;
    };

    column.name.contains(',')
        || (0..table.num_rows()).any(|row| table.cell_text(row, 0).contains(','))
}

fn resplit_single_column(table: &Table) -> Result<Table> {
    let rows = table.num_rows();
    let mut patches = Vec::with_capacity(rows);
    let mut coords: [Vec<f64>; 3] = [
        Vec::with_capacity(rows),
        Vec::with_capacity(rows),
        Vec::with_capacity(rows),
    ];

    for row in 0..rows {
        let cell = table.cell_text(row, 0);
        let parts: Vec<&str> = cell.split(',').map(str::trim).collect();

        if parts.len() != CANONICAL_HEADER.len() {
            return Err(ReportError::Parse(format!(
                "row {} has {} fields after splitting, expected {}",
                row + 1,
                parts.len(),
                CANONICAL_HEADER.len()
            )));
        }

        patches.push(parts[0].to_string());

        for (axis, (value, name)) in parts[1..].iter().zip(&CANONICAL_HEADER[1..]).enumerate() {
            let parsed = value.parse::<f64>().map_err(|_| {
                ReportError::Parse(format!(
                    "row {}: column '{}' value {:?} is not numeric",
                    row + 1,
                    name,
                    value
                ))
            })?;
            coords[axis].push(parsed);
        }
    }

    let [l, a, b] = coords;
    Table::new(vec![
        Column::text(CANONICAL_HEADER[0], patches),
        Column::numeric(CANONICAL_HEADER[1], l),
        Column::numeric(CANONICAL_HEADER[2], a),
        Column::numeric(CANONICAL_HEADER[3], b),
    ])
}
