// src/csv.rs
//! Table ⇄ delimited text (CSV/TSV) and Table ⇄ JSON.
//!
//! JSON keeps cell types exactly. Delimited text only keeps strings, so
//! reading it back infers one type per column (see `infer_column`).
use std::io::{self, Write};
use std::mem::{replace, take};

use chrono::NaiveDate;

use crate::config::consts::MISSING_TEXT;
use crate::config::options::ExportFormat;
use crate::core::table::{Table, Value};
use crate::error::{Error, Result};

/* ---------------- Parsing ---------------- */

/// Minimal CSV/TSV parser (quotes + CRLF tolerant).
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = s!();
    let mut row = Vec::new();
    let mut in_quotes = false;
    // a line holding only `""` is a record with one empty field
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && matches!(chars.peek(), Some('"')) => {
                chars.next();
                field.push('"');
            }
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                // blank lines carry no record
                if quoted || !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
                quoted = false;
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline.
    if quoted || !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Header row + data rows back into a typed table.
pub fn table_from_delimited(text: &str, sep: char) -> Result<Table> {
    let mut rows = parse_rows(text, sep).into_iter();
    let Some(fields) = rows.next() else { return Table::empty(Vec::new()) };
    let raw: Vec<Vec<String>> = rows.collect();

    let mut columns: Vec<Vec<Value>> = (0..fields.len())
        .map(|c| infer_column(raw.iter().map(|r| r.get(c).map(String::as_str).unwrap_or(""))))
        .collect();

    let mut typed = Vec::with_capacity(raw.len());
    for (i, r) in raw.iter().enumerate() {
        if r.len() != fields.len() {
            return Err(Error::RowShape { row: i, expected: fields.len(), found: r.len() });
        }
        typed.push(columns.iter_mut().map(|c| replace(&mut c[i], Value::Missing)).collect());
    }
    Table::new(fields, typed)
}

/// One type per column: Number if every present cell is a plain number,
/// Date if every present cell is ISO `YYYY-MM-DD`, else Text. `NA` is Missing.
fn infer_column<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> Vec<Value> {
    let present = || cells.clone().filter(|c| *c != MISSING_TEXT);
    let any = present().next().is_some();

    let parse = |c: &str, f: &dyn Fn(&str) -> Option<Value>| {
        if c == MISSING_TEXT { Value::Missing } else { f(c).unwrap_or_else(|| Value::text(c)) }
    };
    let number = |c: &str| c.parse::<f64>().ok().filter(|n| n.is_finite()).map(Value::Number);
    let date = |c: &str| NaiveDate::parse_from_str(c, "%Y-%m-%d").ok().map(Value::Date);

    if any && present().all(|c| number(c).is_some()) {
        cells.map(|c| parse(c, &number)).collect()
    } else if any && present().all(|c| date(c).is_some()) {
        cells.map(|c| parse(c, &date)).collect()
    } else {
        cells.map(|c| parse(c, &|c: &str| Some(Value::text(c)))).collect()
    }
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV/TSV row to any writer.
pub fn write_row<W: Write>(mut w: W, row: &[String], sep: char) -> io::Result<()> {
    // a bare blank line would read back as no record at all
    if let [only] = row {
        if only.is_empty() {
            return writeln!(w, "\"\"");
        }
    }
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{sep}")?;
        }
        if needs_quotes(cell, sep) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    writeln!(w)
}

pub fn table_to_delimited(table: &Table, sep: char, include_headers: bool) -> String {
    let mut buf: Vec<u8> = Vec::new();
    // writes into a Vec cannot fail
    if include_headers {
        let _ = write_row(&mut buf, table.fields(), sep);
    }
    for r in table.to_string_rows() {
        let _ = write_row(&mut buf, &r, sep);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/* ---------------- JSON ---------------- */

pub fn table_to_json(table: &Table) -> Result<String> {
    Ok(serde_json::to_string_pretty(table)?)
}

/// Shape and field checks apply, same as `Table::new`.
pub fn table_from_json(text: &str) -> Result<Table> {
    Ok(serde_json::from_str(text)?)
}

/* ---------------- Export ---------------- */

/// Full export text (Copy / Export) for one format.
pub fn to_export_string(table: &Table, format: ExportFormat, include_headers: bool) -> Result<String> {
    match format.delim() {
        Some(sep) => Ok(table_to_delimited(table, sep, include_headers)),
        None => table_to_json(table),
    }
}
