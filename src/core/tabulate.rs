// src/core/tabulate.rs
//! Tabulator: zip equal-length columns into a `Table`.
//!
//! A length mismatch here means selection and extraction drifted apart
//! upstream, so it is always an error and never padded over.

use crate::core::extract;
use crate::core::select::NodeSet;
use crate::core::table::{Table, Value};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct Tabulator {
    columns: Vec<(String, Vec<Value>)>,
}

impl Tabulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.columns.push((name.into(), values));
        self
    }

    /// Trimmed text of each node.
    pub fn column_text(self, name: impl Into<String>, nodes: &NodeSet<'_>) -> Self {
        let values = nodes.iter().map(|n| Value::Text(extract::text(n))).collect();
        self.column(name, values)
    }

    pub fn build(self) -> Result<Table> {
        let expected = self.columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        for (name, values) in &self.columns {
            if values.len() != expected {
                return Err(Error::FieldLengthMismatch {
                    field: name.clone(),
                    expected,
                    found: values.len(),
                });
            }
        }

        let fields: Vec<String> = self.columns.iter().map(|(n, _)| n.clone()).collect();
        let mut cols: Vec<std::vec::IntoIter<Value>> =
            self.columns.into_iter().map(|(_, v)| v.into_iter()).collect();

        let mut rows = Vec::with_capacity(expected);
        for _ in 0..expected {
            // lengths were checked above
            rows.push(cols.iter_mut().filter_map(|c| c.next()).collect());
        }
        Table::new(fields, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zips_columns_into_rows() {
        let t = Tabulator::new()
            .column("date", vec!["Jan. 21".into(), "Jan. 23".into()])
            .column("n", vec![1.0.into(), 2.0.into()])
            .build()
            .unwrap();
        assert_eq!(t.fields(), ["date", "n"]);
        assert_eq!(t.get(1, "date"), Some(&Value::text("Jan. 23")));
        assert_eq!(t.get(1, "n"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn mismatch_names_the_field() {
        let err = Tabulator::new()
            .column("a", vec!["1".into(), "2".into()])
            .column("b", vec!["1".into()])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::FieldLengthMismatch { field, expected: 2, found: 1 } if field == "b"));
    }

    #[test]
    fn no_columns_is_an_empty_table() {
        let t = Tabulator::new().build().unwrap();
        assert_eq!(t.field_count(), 0);
        assert!(t.is_empty());
    }
}
