// src/core/normalize.rs
//! Normalizer: string cleanup, scalar coercion, and table reshaping.
//!
//! The string functions are pure. The table functions mutate in place and
//! keep the schema invariant: a rename touches the schema once for all rows,
//! a retype touches one cell per row, a row drop invalidates row handles.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::table::{Record, Table, Value};
use crate::error::{Error, Result};

/* ---------------- Patterns ---------------- */

/// Bracketed footnote markers: `[1]`, `[a]`, `[note 3]`.
pub const FOOTNOTES: &str = r"\[[^\]]*\]";
pub const CURRENCY: &str = r"[$€£¥]";
pub const THOUSANDS: &str = r",";

static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?(?:\d[\d,]*(?:\.\d+)?|\.\d+)").expect("static regex"));

/// Named presets accepted wherever a pattern string is (recipes, CLI).
pub fn preset(name: &str) -> Option<&'static str> {
    match name {
        "footnotes" => Some(FOOTNOTES),
        "currency" => Some(CURRENCY),
        "thousands" => Some(THOUSANDS),
        _ => None,
    }
}

pub fn compile(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(preset(pattern).unwrap_or(pattern))?)
}

/* ---------------- Strings ---------------- */

/// Remove every match of `pattern`, again and again until none is left, so a
/// second call never finds anything more (`"(())"` with `\(\)` ends empty).
pub fn strip_pattern(text: &str, pattern: &Regex) -> String {
    let mut out = s!(text);
    loop {
        // every non-empty match shortens the text; empty matches change nothing
        let next = pattern.replace_all(&out, "");
        if next.len() == out.len() {
            return out;
        }
        out = next.into_owned();
    }
}

/// First numeric token, ignoring symbols around it and `,` grouping.
pub fn parse_number(text: &str) -> Result<f64> {
    let token = NUMBER_TOKEN
        .find(text)
        .map(|m| m.as_str().replace(',', ""))
        .ok_or_else(|| Error::NotNumeric(s!(text)))?;
    token
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| Error::NotNumeric(s!(text)))
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%B %d %Y", "%b %d %Y", "%m/%d/%Y", "%d %B %Y"];

/// ISO, "January 21, 2017", "Jan. 21, 2017", "1/21/2017", "21 January 2017".
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    // "Jan." / "Sept." → "Jan" / "Sep"
    let cleaned = text.trim().replace('.', "").replace("Sept ", "Sep ");
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(&cleaned, f).ok())
        .ok_or_else(|| Error::NotDate(s!(text)))
}

/* ---------------- Coercions ---------------- */

/// Target type for `retype_field`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coercion {
    Number,
    Date,
    Text,
}

impl Coercion {
    pub fn apply(&self, v: &Value) -> Result<Value> {
        match (self, v) {
            (_, Value::Missing) => Ok(Value::Missing),
            (Coercion::Text, v) => Ok(Value::Text(v.to_string())),
            (Coercion::Number, Value::Number(n)) => Ok(Value::Number(*n)),
            (Coercion::Number, Value::Text(s)) => parse_number(s).map(Value::Number),
            (Coercion::Number, Value::Date(d)) => Err(Error::NotNumeric(d.to_string())),
            (Coercion::Date, Value::Date(d)) => Ok(Value::Date(*d)),
            (Coercion::Date, Value::Text(s)) => parse_date(s).map(Value::Date),
            (Coercion::Date, Value::Number(n)) => Err(Error::NotDate(n.to_string())),
        }
    }
}

/// What `retype_field` does with a cell that will not coerce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetypePolicy {
    /// Leave the table untouched and return the first failure.
    FailFast,
    /// Set the cell to `Missing`, keep going, report the row.
    #[default]
    #[serde(alias = "collect")]
    CollectAndContinue,
}

#[derive(Debug, Default)]
pub struct RetypeReport {
    pub converted: usize,
    /// Row positions whose cell became `Missing`.
    pub failed: Vec<usize>,
    /// The coercion error behind each entry of `failed`.
    pub errors: Vec<Error>,
}

/* ---------------- Tables ---------------- */

/// Remove the row at `index`. Every `RowId` issued before this call is stale
/// afterwards; callers re-fetch handles with `Table::row_id`.
pub fn drop_row(table: &mut Table, index: usize) -> Result<Record> {
    let id = table.row_id(index)?;
    let rec = table.remove_record(id)?;
    debug!(index, generation = table.generation(), "Normalize: row dropped");
    Ok(rec)
}

pub fn rename_field(table: &mut Table, old: &str, new: &str) -> Result<()> {
    let col = table.field_index(old)?;
    if old != new && table.fields().iter().any(|f| f == new) {
        return Err(Error::DuplicateField(s!(new)));
    }
    table.fields_mut()[col] = s!(new);
    Ok(())
}

/// Project onto `names`, in the given order.
pub fn keep_fields(table: &mut Table, names: &[&str]) -> Result<()> {
    let cols = names.iter().map(|n| table.field_index(n)).collect::<Result<Vec<_>>>()?;
    crate::core::table::check_unique(&names.iter().map(|n| s!(*n)).collect::<Vec<_>>())?;
    table.project(&cols);
    Ok(())
}

/// Coerce every cell of `name` with `coercion`.
pub fn retype_field<F>(table: &mut Table, name: &str, coercion: F, policy: RetypePolicy) -> Result<RetypeReport>
where
    F: Fn(&Value) -> Result<Value>,
{
    let col = table.field_index(name)?;

    // Coerce first; only write once the policy allows it.
    let mut coerced = Vec::with_capacity(table.row_count());
    let mut report = RetypeReport::default();
    for (row, rec) in table.records().iter().enumerate() {
        match coercion(&rec.values()[col]) {
            Ok(v) => {
                report.converted += 1;
                coerced.push(v);
            }
            Err(e) if policy == RetypePolicy::CollectAndContinue && e.is_coercion() => {
                report.failed.push(row);
                report.errors.push(e);
                coerced.push(Value::Missing);
            }
            Err(e) => return Err(e),
        }
    }

    for (row, v) in coerced.into_iter().enumerate() {
        *table.cell_mut(row, col) = v;
    }
    if !report.failed.is_empty() {
        warn!(field = name, failed = report.failed.len(), "Normalize: cells set to missing");
    }
    Ok(report)
}

/// Rewrite the text cells of one field; other cells pass through.
pub fn map_field<F>(table: &mut Table, name: &str, f: F) -> Result<()>
where
    F: Fn(&str) -> String,
{
    let col = table.field_index(name)?;
    for row in 0..table.row_count() {
        let cell = table.cell_mut(row, col);
        if let Value::Text(s) = cell {
            *s = f(s);
        }
    }
    Ok(())
}

/// Drop footnote markers from every text cell and from the field names.
/// A cleaned name that is empty or already taken keeps its marker.
pub fn strip_footnotes(table: &mut Table) -> Result<()> {
    let re = compile(FOOTNOTES)?;
    let fields: Vec<String> = table.fields().to_vec();
    for f in &fields {
        map_field(table, f, |s| strip_pattern(s, &re).trim().to_string())?;
        let clean = strip_pattern(f, &re).trim().to_string();
        if clean.is_empty() || clean == *f {
            continue;
        }
        if let Err(e) = rename_field(table, f, &clean) {
            debug!("Normalize: header kept: {e}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col_table(name: &str, cells: &[&str]) -> Table {
        Table::new(vec![s!(name)], cells.iter().map(|c| vec![Value::text(*c)]).collect()).unwrap()
    }

    #[test]
    fn strip_is_idempotent() {
        let re = compile("footnotes").unwrap();
        for input in ["1,234[1][note 2]", "plain", "[a]b[c]", "x]y[z"] {
            let once = strip_pattern(input, &re);
            assert_eq!(strip_pattern(&once, &re), once, "input {input:?}");
        }
        assert_eq!(strip_pattern("Population[2]", &re), "Population");
        assert_eq!(strip_pattern("none here", &re), "none here");
    }

    #[test]
    fn strip_repeats_until_nothing_matches() {
        let re = compile(r"\(\)").unwrap();
        let once = strip_pattern("(())", &re);
        assert_eq!(once, "");
        assert_eq!(strip_pattern(&once, &re), once);
        assert_eq!(strip_pattern("a(()(()))b", &re), "ab");

        // zero-width matches leave the text alone
        let empty = compile("x*").unwrap();
        assert_eq!(strip_pattern("abxxc", &empty), "abc");
    }

    #[test]
    fn numbers_from_noisy_text() {
        assert_eq!(parse_number("1,234,567[2]").unwrap(), 1_234_567.0);
        let cleaned = strip_pattern("$958,483,377", &compile("currency").unwrap());
        assert_eq!(parse_number(&cleaned).unwrap(), 958_483_377.0);
        assert_eq!(parse_number("$958,483,377").unwrap(), 958_483_377.0);
        assert_eq!(parse_number("about -3.5%").unwrap(), -3.5);
        assert!(matches!(parse_number("-"), Err(Error::NotNumeric(_))));
        assert!(matches!(parse_number(""), Err(Error::NotNumeric(_))));

        // overflows to infinity, which no export format can carry
        let huge = "9".repeat(400);
        assert!(matches!(parse_number(&huge), Err(Error::NotNumeric(_))));
        assert_eq!(parse_number(&"9".repeat(300)).unwrap(), "9".repeat(300).parse::<f64>().unwrap());
    }

    #[test]
    fn dates_in_common_shapes() {
        let d = NaiveDate::from_ymd_opt(2017, 1, 21).unwrap();
        assert_eq!(parse_date("Jan. 21, 2017").unwrap(), d);
        assert_eq!(parse_date("January 21, 2017").unwrap(), d);
        assert_eq!(parse_date("2017-01-21").unwrap(), d);
        assert_eq!(parse_date("1/21/2017").unwrap(), d);
        assert_eq!(parse_date("Sept. 5, 2017").unwrap(), NaiveDate::from_ymd_opt(2017, 9, 5).unwrap());
        assert!(matches!(parse_date("Jan. 21"), Err(Error::NotDate(_))));
    }

    #[test]
    fn retype_collects_failures() {
        let mut t = col_table("Rank", &["-", "5", "12"]);
        let report = retype_field(&mut t, "Rank", |v| Coercion::Number.apply(v), RetypePolicy::default()).unwrap();
        assert_eq!(report.converted, 2);
        assert_eq!(report.failed, [0]);
        assert!(matches!(&report.errors[..], [Error::NotNumeric(t)] if t == "-"));
        assert_eq!(t.get(0, "Rank"), Some(&Value::Missing));
        assert_eq!(t.get(1, "Rank"), Some(&Value::Number(5.0)));
        assert_eq!(t.get(2, "Rank"), Some(&Value::Number(12.0)));
    }

    #[test]
    fn retype_fail_fast_leaves_table_alone() {
        let mut t = col_table("Rank", &["5", "-", "12"]);
        let before = t.clone();
        let err = retype_field(&mut t, "Rank", |v| Coercion::Number.apply(v), RetypePolicy::FailFast).unwrap_err();
        assert!(matches!(err, Error::NotNumeric(_)));
        assert_eq!(t, before);
    }

    #[test]
    fn rename_is_schema_wide() {
        let mut t = Table::new(
            fields!["a", "b"],
            vec![vec!["1".into(), "2".into()], vec!["3".into(), "4".into()]],
        )
        .unwrap();
        rename_field(&mut t, "b", "Population").unwrap();
        assert_eq!(t.fields(), ["a", "Population"]);
        assert_eq!(t.get(1, "Population"), Some(&Value::text("4")));
        assert!(matches!(rename_field(&mut t, "zzz", "y"), Err(Error::UnknownField(_))));
        assert!(matches!(rename_field(&mut t, "a", "Population"), Err(Error::DuplicateField(_))));
    }

    #[test]
    fn keep_fields_projects_and_reorders() {
        let mut t = Table::new(
            fields!["Rank", "Country", "Population"],
            vec![vec!["1".into(), "China".into(), "1.4e9".into()]],
        )
        .unwrap();
        keep_fields(&mut t, &["Population", "Country"]).unwrap();
        assert_eq!(t.fields(), ["Population", "Country"]);
        assert_eq!(t.get(0, "Country"), Some(&Value::text("China")));
        assert!(matches!(keep_fields(&mut t, &["Rank"]), Err(Error::UnknownField(_))));
    }

    #[test]
    fn drop_row_requires_reindex() {
        let mut t = col_table("Country", &["World", "China", "India"]);
        let stale = t.row_id(1).unwrap();
        let dropped = drop_row(&mut t, 0).unwrap();
        assert_eq!(dropped.get(0), Some(&Value::text("World")));
        assert!(matches!(t.record(stale), Err(Error::StaleRowIndex { .. })));
        let fresh = t.row_id(0).unwrap();
        assert_eq!(t.record(fresh).unwrap().get(0), Some(&Value::text("China")));
        assert!(matches!(drop_row(&mut t, 5), Err(Error::RowOutOfRange { index: 5, len: 2 })));
    }

    #[test]
    fn map_field_only_touches_text() {
        let mut t = Table::new(fields!["p"], vec![vec!["7[1]".into()], vec![Value::Missing]]).unwrap();
        let re = compile("footnotes").unwrap();
        map_field(&mut t, "p", |s| strip_pattern(s, &re)).unwrap();
        assert_eq!(t.get(0, "p"), Some(&Value::text("7")));
        assert_eq!(t.get(1, "p"), Some(&Value::Missing));
    }

    #[test]
    fn footnotes_leave_cells_and_names() {
        let mut t = Table::new(
            fields!["Country[a]", "Population[1]", "Population"],
            vec![vec!["China[b]".into(), "1,403,500,365[2]".into(), Value::Missing]],
        )
        .unwrap();
        strip_footnotes(&mut t).unwrap();
        // the second rename would clash, so that header keeps its marker
        assert_eq!(t.fields(), ["Country", "Population[1]", "Population"]);
        assert_eq!(t.get(0, "Country"), Some(&Value::text("China")));
        assert_eq!(t.get(0, "Population[1]"), Some(&Value::text("1,403,500,365")));
        assert_eq!(t.get(0, "Population"), Some(&Value::Missing));
    }
}
