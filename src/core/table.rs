// src/core/table.rs
//! Tabular data model: typed scalars, records, and tables with a shared schema.
//!
//! A `Table` owns its field names and its records. Every record carries exactly
//! one value per field; constructors and mutators keep it that way, so code
//! downstream can index cells without checking lengths.
//!
//! Row handles (`RowId`) remember the table generation they were issued at.
//! Removing a row bumps the generation, and old handles stop resolving, so a
//! caller holding indices across a `drop_row` must fetch fresh ones.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::consts::MISSING_TEXT;
use crate::error::{Error, Result};

/// One typed cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    /// "Not available": a cell that failed coercion, or had no source.
    Missing,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            // integral values print without a trailing ".0"
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Missing => f.write_str(MISSING_TEXT),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s!(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

/// Values of one row, positionally aligned with the table's fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, col: usize) -> Option<&Value> {
        self.values.get(col)
    }
}

/// Handle to a row, valid until the table is next reshaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowId {
    index: usize,
    generation: u64,
}

impl RowId {
    pub fn index(&self) -> usize {
        self.index
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(into = "TableRepr", try_from = "TableRepr")]
pub struct Table {
    fields: Vec<String>,
    records: Vec<Record>,
    generation: u64,
}

/// Equality is over content; the generation counter is bookkeeping.
impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.records == other.records
    }
}

/// Wire shape, so deserialized tables go through the same checks as `Table::new`.
#[derive(Serialize, Deserialize)]
struct TableRepr {
    fields: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl From<Table> for TableRepr {
    fn from(t: Table) -> Self {
        let rows = t.records.into_iter().map(|r| r.values).collect();
        TableRepr { fields: t.fields, rows }
    }
}

impl TryFrom<TableRepr> for Table {
    type Error = Error;

    fn try_from(repr: TableRepr) -> Result<Self> {
        Table::new(repr.fields, repr.rows)
    }
}

impl Table {
    /// Build from a schema and rows; every row must match the schema width.
    pub fn new(fields: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        check_unique(&fields)?;
        let mut records = Vec::with_capacity(rows.len());
        for (i, values) in rows.into_iter().enumerate() {
            if values.len() != fields.len() {
                return Err(Error::RowShape { row: i, expected: fields.len(), found: values.len() });
            }
            records.push(Record { values });
        }
        Ok(Self { fields, records, generation: 0 })
    }

    pub fn empty(fields: Vec<String>) -> Result<Self> {
        Self::new(fields, Vec::new())
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn field_index(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| Error::UnknownField(s!(name)))
    }

    /// Cell by row position and field name.
    pub fn get(&self, row: usize, field: &str) -> Option<&Value> {
        let col = self.fields.iter().position(|f| f == field)?;
        self.records.get(row).and_then(|r| r.get(col))
    }

    /// All values of one field, in row order.
    pub fn column(&self, field: &str) -> Result<Vec<&Value>> {
        let col = self.field_index(field)?;
        Ok(self.records.iter().map(|r| &r.values[col]).collect())
    }

    /* ---------- row handles ---------- */

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fresh handle for the row currently at `index`.
    pub fn row_id(&self, index: usize) -> Result<RowId> {
        if index >= self.records.len() {
            return Err(Error::RowOutOfRange { index, len: self.records.len() });
        }
        Ok(RowId { index, generation: self.generation })
    }

    pub fn record(&self, id: RowId) -> Result<&Record> {
        self.check_id(id)?;
        Ok(&self.records[id.index])
    }

    fn check_id(&self, id: RowId) -> Result<()> {
        if id.generation != self.generation {
            return Err(Error::StaleRowIndex {
                index: id.index,
                issued: id.generation,
                current: self.generation,
            });
        }
        if id.index >= self.records.len() {
            return Err(Error::RowOutOfRange { index: id.index, len: self.records.len() });
        }
        Ok(())
    }

    /* ---------- mutation (crate-internal; see core::normalize) ---------- */

    pub(crate) fn remove_record(&mut self, id: RowId) -> Result<Record> {
        self.check_id(id)?;
        let rec = self.records.remove(id.index);
        self.generation += 1;
        Ok(rec)
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Vec<String> {
        &mut self.fields
    }

    pub(crate) fn cell_mut(&mut self, row: usize, col: usize) -> &mut Value {
        &mut self.records[row].values[col]
    }

    /// Keep only `cols`, in that order. Indices are checked by the caller.
    pub(crate) fn project(&mut self, cols: &[usize]) {
        self.fields = cols.iter().map(|&c| self.fields[c].clone()).collect();
        for r in &mut self.records {
            r.values = cols.iter().map(|&c| r.values[c].clone()).collect();
        }
    }

    /// Rows as display strings (export, GUI).
    pub fn to_string_rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|r| r.values.iter().map(|v| v.to_string()).collect())
            .collect()
    }
}

pub(crate) fn check_unique(fields: &[String]) -> Result<()> {
    for (i, f) in fields.iter().enumerate() {
        if fields[..i].contains(f) {
            return Err(Error::DuplicateField(f.clone()));
        }
    }
    Ok(())
}
