//! Comma-delimited text reading and writing
//!
//! Handles the small subset of CSV that spectrophotometer exports and report
//! logs use: a header row, comma separators, optional double-quoted fields
//! (`""` escapes a quote inside a quoted field) and LF or CRLF line endings.

use crate::table::Table;
use crate::types::{ReportError, Result};

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// A record together with the 1-based line it started on
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Split text into records, skipping blank lines
pub fn split_records(text: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    field.push(QUOTE);
                }
                QUOTE => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            QUOTE if field.is_empty() => in_quotes = true,
            DELIMITER => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut fields), record_line);
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ReportError::Parse(format!(
            "unterminated quoted field starting on line {}",
            record_line
        )));
    }

    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        push_record(&mut records, fields, record_line);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<Record>, fields: Vec<String>, line: usize) {
    let blank = fields.len() == 1 && fields[0].trim().is_empty();
    if !blank {
        records.push(Record { line, fields });
    }
}

/// Read a delimited table: first record is the header, column names are trimmed
///
/// Empty header names become `Unnamed: N` (0-based position), so exports that
/// end every line with a comma still load.
pub fn read_table(text: &str) -> Result<Table> {
    read_table_with_text(text, &[])
}

/// Like `read_table`, but the named columns are never type-inferred
pub fn read_table_with_text(text: &str, text_columns: &[&str]) -> Result<Table> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = split_records(text)?.into_iter();

    let header = records
        .next()
        .ok_or_else(|| ReportError::Parse("file is empty".to_string()))?;
    let width = header.fields.len();
    let names: Vec<String> = header
        .fields
        .iter()
        .enumerate()
        .map(|(i, n)| match n.trim() {
            "" => format!("Unnamed: {}", i),
            name => name.to_string(),
        })
        .collect();

    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(ReportError::Parse(format!("duplicate column name '{}'", name)));
        }
    }

    let mut rows = Vec::new();
    for record in records {
        if record.fields.len() != width {
            return Err(ReportError::Parse(format!(
                "line {} has {} fields, expected {}",
                record.line,
                record.fields.len(),
                width
            )));
        }
        rows.push(record.fields);
    }

    log::debug!("Read table with {} columns and {} rows", width, rows.len());
    Table::from_rows_with_text(names, rows, text_columns)
}

/// Serialise a table as comma-delimited text with a header row
pub fn write_table(table: &Table) -> String {
    let mut out = String::new();

    let header: Vec<String> = table.columns().iter().map(|c| escape(&c.name)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in 0..table.num_rows() {
        let cells: Vec<String> = (0..table.num_columns())
            .map(|col| escape(&table.cell_text(row, col)))
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }

    out
}

fn escape(field: &str) -> String {
    if field.contains([DELIMITER, QUOTE, '\n', '\r']) {
        format!("\"{}\"", field.replace(QUOTE, "\"\""))
    } else {
        field.to_string()
    }
}
