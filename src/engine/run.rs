// src/engine/run.rs
use std::fmt;

use tracing::{info, warn};

use crate::core::document;
use crate::core::extract;
use crate::core::fetch::Fetch;
use crate::core::normalize::{self, RetypeReport};
use crate::core::select::select_chain;
use crate::core::table::Table;
use crate::engine::recipe::{Extract, Recipe, Step};
use crate::error::{Error, Result};

/// Non-fatal problem met during extraction or cleanup.
#[derive(Debug)]
pub struct Warning {
    pub stage: String,
    pub error: Error,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.error)
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub name: String,
    pub table: Table,
    pub warnings: Vec<Warning>,
}

/// Fetch the recipe's source, then `run_markup`.
pub fn run(recipe: &Recipe, fetcher: &dyn Fetch) -> Result<RunReport> {
    let markup = fetcher.fetch(&recipe.source)?;
    run_markup(recipe, &markup)
}

/// Parse → extract → steps. Parse, selection and shape errors abort; cells
/// that fail coercion or lack an attribute become `Missing` plus a warning.
pub fn run_markup(recipe: &Recipe, markup: &str) -> Result<RunReport> {
    let doc = document::parse(markup)?;
    let mut warnings = Vec::new();

    let mut table = match &recipe.extract {
        Extract::Table(t) => {
            let node = extract::find_table(&doc, &t.pick)?;
            extract::html_table(&doc, node, t.options)?
        }
        Extract::Groups(g) => {
            let hits = select_chain(&doc, &g.queries()?);
            let (table, missing) = g.shape().tabulate(&hits, g.missing)?;
            warnings.extend(missing.into_iter().map(|error| Warning { stage: s!("extract"), error }));
            table
        }
    };

    for (i, step) in recipe.steps.iter().enumerate() {
        let stage = format!("step {}", i + 1);
        if let Some(report) = apply_step(&mut table, step)? {
            for (row, error) in report.failed.into_iter().zip(report.errors) {
                warnings.push(Warning { stage: format!("{stage}, row {row}"), error });
            }
        }
    }

    for w in &warnings {
        warn!(recipe = %recipe.name, "{w}");
    }
    info!(
        recipe = %recipe.name,
        rows = table.row_count(),
        fields = table.field_count(),
        warnings = warnings.len(),
        "Run: done"
    );
    Ok(RunReport { name: recipe.name.clone(), table, warnings })
}

/// One cleanup step; a retype hands back its report.
pub fn apply_step(table: &mut Table, step: &Step) -> Result<Option<RetypeReport>> {
    match step {
        Step::DropRow(i) => {
            normalize::drop_row(table, *i)?;
        }
        Step::Rename { from, to } => normalize::rename_field(table, from, to)?,
        Step::Strip { field, pattern } => {
            let re = normalize::compile(pattern)?;
            normalize::map_field(table, field, |s| normalize::strip_pattern(s, &re).trim().to_string())?;
        }
        Step::Retype { field, to, policy } => {
            let coercion = *to;
            return normalize::retype_field(table, field, |v| coercion.apply(v), *policy).map(Some);
        }
        Step::Keep(names) => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            normalize::keep_fields(table, &names)?;
        }
    }
    Ok(None)
}
