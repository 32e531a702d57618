//! Strongly-typed tabular values
//!
//! Reference and measurement data both arrive as small delimited tables. They
//! are held as an ordered list of named columns, each either numeric or text,
//! so every consumer validates the schema it needs instead of probing cells.

use crate::types::{ReportError, Result};
use std::fmt;

/// Values of a single column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Floating-point column; empty cells are held as NaN
    Numeric(Vec<f64>),
    /// Free-text column (raw cell text)
    Text(Vec<String>),
}

impl ColumnValues {
    /// Number of rows in this column
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnValues::Numeric(_))
    }

    /// Render one cell as text (numbers use shortest round-trip formatting)
    pub fn cell_text(&self, row: usize) -> Option<String> {
        match self {
            ColumnValues::Numeric(v) => v.get(row).map(|x| format_number(*x)),
            ColumnValues::Text(v) => v.get(row).cloned(),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name (surrounding whitespace stripped)
    pub name: String,
    /// Column values
    pub values: ColumnValues,
}

impl Column {
    /// Create a numeric column
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            values: ColumnValues::Numeric(values),
        }
    }

    /// Create a text column
    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            values: ColumnValues::Text(values),
        }
    }

    /// Build a column from raw cells, inferring its type
    ///
    /// The column is numeric when every non-empty cell parses as a float and
    /// at least one cell is non-empty. Empty cells in a numeric column become NaN.
    pub fn from_cells(name: impl Into<String>, cells: Vec<String>) -> Self {
        let mut any_value = false;
        let mut all_numeric = true;
        let mut parsed = Vec::with_capacity(cells.len());

        for cell in &cells {
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                parsed.push(f64::NAN);
                continue;
            }
            match trimmed.parse::<f64>() {
                Ok(v) => {
                    any_value = true;
                    parsed.push(v);
                }
                Err(_) => {
                    all_numeric = false;
                    break;
                }
            }
        }

        if all_numeric && any_value {
            Self::numeric(name, parsed)
        } else {
            Self::text(name, cells)
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An ordered set of equal-length named columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    /// Create a table from columns, checking they all have the same length
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map(Column::len).unwrap_or(0);

        if let Some(bad) = columns.iter().find(|c| c.len() != num_rows) {
            return Err(ReportError::Parse(format!(
                "column '{}' has {} rows, expected {}",
                bad.name,
                bad.len(),
                num_rows
            )));
        }

        Ok(Self { columns, num_rows })
    }

    /// Build a table from a header row and data rows, inferring column types
    ///
    /// Every row must have exactly as many fields as the header.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        Self::from_rows_with_text(header, rows, &[])
    }

    /// Like `from_rows`, but the named columns are always kept as raw text
    pub fn from_rows_with_text(
        header: Vec<String>,
        rows: Vec<Vec<String>>,
        text_columns: &[&str],
    ) -> Result<Self> {
        let width = header.len();
        let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); width];

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(ReportError::Parse(format!(
                    "row {} has {} fields, expected {}",
                    index + 1,
                    row.len(),
                    width
                )));
            }
            for (col, cell) in row.into_iter().enumerate() {
                cells[col].push(cell);
            }
        }

        let columns = header
            .into_iter()
            .zip(cells)
            .map(|(name, values)| {
                if text_columns.contains(&name.trim()) {
                    Column::text(name, values)
                } else {
                    Column::from_cells(name, values)
                }
            })
            .collect();

        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by exact (trimmed) name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Typed accessor for a numeric column
    ///
    /// Fails with `NonNumeric` naming the first offending cell when the column
    /// holds text.
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        let column = self
            .column(name)
            .ok_or_else(|| ReportError::Computation(format!("column '{}' not found", name)))?;

        match &column.values {
            ColumnValues::Numeric(values) => Ok(values.as_slice()),
            ColumnValues::Text(values) => {
                let (row, value) = values
                    .iter()
                    .enumerate()
                    .find(|(_, v)| v.trim().parse::<f64>().is_err())
                    .map(|(i, v)| (i, v.clone()))
                    .unwrap_or((0, String::new()));
                Err(ReportError::NonNumeric {
                    column: name.to_string(),
                    row,
                    value,
                })
            }
        }
    }

    /// Append a column, replacing any existing column of the same name in place
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.num_rows {
            return Err(ReportError::Computation(format!(
                "column '{}' has {} rows, table has {}",
                column.name,
                column.len(),
                self.num_rows
            )));
        }
        if self.columns.is_empty() {
            self.num_rows = column.len();
        }

        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Set a text column holding the same value on every row
    pub fn set_constant_column(&mut self, name: &str, value: &str) {
        let column = Column::text(name, vec![value.to_string(); self.num_rows]);
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    /// Text of a single cell, empty when out of range
    pub fn cell_text(&self, row: usize, col: usize) -> String {
        self.columns
            .get(col)
            .and_then(|c| c.values.cell_text(row))
            .unwrap_or_default()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(col, c)| {
                (0..self.num_rows)
                    .map(|row| self.cell_text(row, col).chars().count())
                    .chain(std::iter::once(c.name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:>w$}", c.name, w = *w))
            .collect();
        writeln!(f, "{}", header.join("  "))?;

        for row in 0..self.num_rows {
            let cells: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(col, w)| format!("{:>w$}", self.cell_text(row, col), w = *w))
                .collect();
            writeln!(f, "{}", cells.join("  "))?;
        }
        Ok(())
    }
}

/// Format a float for display and serialisation (NaN becomes an empty cell)
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{}", value)
    }
}
