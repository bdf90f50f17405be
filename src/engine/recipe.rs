// src/engine/recipe.rs
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::options::TableOptions;
use crate::core::extract::{GroupField, GroupShape, MissingPolicy, TablePick};
use crate::core::normalize::{Coercion, RetypePolicy};
use crate::core::select::Query;
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    /// URL, `file://` URL, or plain path.
    pub source: String,
    pub extract: Extract,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/* Where the rows come from */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extract {
    Table(TableExtract),
    Groups(GroupsExtract),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableExtract {
    pub pick: TablePick,
    #[serde(flatten)]
    pub options: TableOptions,
}

/// Sibling-group records: `select` is a nested query chain in compact form,
/// the hits are cut into groups of `size` and read per field offset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupsExtract {
    pub select: Vec<String>,
    pub size: usize,
    pub fields: Vec<GroupField>,
    #[serde(default)]
    pub missing: MissingPolicy,
}

impl GroupsExtract {
    pub fn queries(&self) -> Result<Vec<Query>> {
        if self.select.is_empty() {
            return Err(Error::Recipe(s!("groups.select needs at least one query")));
        }
        self.select.iter().map(|q| Query::parse(q)).collect()
    }

    pub fn shape(&self) -> GroupShape {
        GroupShape { size: self.size, fields: self.fields.clone() }
    }
}

/* Cleanup, applied in order */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    DropRow(usize),
    Rename { from: String, to: String },
    /// `pattern` is a regex or one of `footnotes`, `currency`, `thousands`.
    Strip { field: String, pattern: String },
    Retype {
        field: String,
        to: Coercion,
        #[serde(default)]
        policy: RetypePolicy,
    },
    Keep(Vec<String>),
}

impl Recipe {
    pub fn from_json(text: &str) -> Result<Self> {
        let recipe: Recipe = serde_json::from_str(text)?;
        recipe.validate()?;
        Ok(recipe)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|e| match e {
            Error::Json(j) => Error::Recipe(format!("{}: {j}", path.display())),
            other => other,
        })
    }

    /// Static checks that do not need the page.
    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(Error::Recipe(format!("{}: empty source", self.name)));
        }
        if let Extract::Groups(g) = &self.extract {
            g.queries()?;
            g.shape().validate()?;
        }
        for step in &self.steps {
            if let Step::Strip { pattern, .. } = step {
                crate::core::normalize::compile(pattern)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extract::ExtractMode;

    #[test]
    fn table_recipe_from_json() {
        let r = Recipe::from_json(
            r#"{ "name": "population", "source": "https://example.org/pop",
                 "extract": { "table": { "pick": { "signature": { "headers": ["Country"] } }, "header": true } },
                 "steps": [ {"drop_row": 0}, {"rename": {"from": "A", "to": "B"}},
                            {"strip": {"field": "B", "pattern": "footnotes"}},
                            {"retype": {"field": "B", "to": "number", "policy": "collect"}},
                            {"keep": ["B"]} ] }"#,
        )
        .unwrap();
        let Extract::Table(t) = &r.extract else { panic!("expected table extract") };
        assert_eq!(t.options.header, Some(true));
        assert!(t.options.fill);
        assert_eq!(r.steps[0], Step::DropRow(0));
        assert_eq!(
            r.steps[3],
            Step::Retype { field: s!("B"), to: Coercion::Number, policy: RetypePolicy::CollectAndContinue }
        );
    }

    #[test]
    fn groups_recipe_from_json() {
        let r = Recipe::from_json(
            r#"{ "name": "lies", "source": "lies.html",
                 "extract": { "groups": { "select": ["span.short-desc", "strong, span.short-truth, a"], "size": 3,
                   "fields": [ {"name": "date", "offset": 0},
                               {"name": "lie", "offset": 1},
                               {"name": "url", "offset": 2, "mode": {"attr": "href"}} ] } } }"#,
        )
        .unwrap();
        let Extract::Groups(g) = &r.extract else { panic!("expected groups extract") };
        assert_eq!(g.queries().unwrap().len(), 2);
        assert_eq!(g.fields[2].mode, ExtractMode::Attr(s!("href")));
        assert_eq!(g.missing, MissingPolicy::Null);
    }

    #[test]
    fn bad_recipes_are_rejected_early() {
        let bad_offset = r#"{ "name": "x", "source": "a.html",
            "extract": { "groups": { "select": ["b"], "size": 2, "fields": [ {"name": "t", "offset": 2} ] } } }"#;
        assert!(matches!(Recipe::from_json(bad_offset), Err(Error::InvalidGroupShape { size: 2, offset: 2 })));

        let bad_pattern = r#"{ "name": "x", "source": "a.html",
            "extract": { "table": { "pick": { "ordinal": 1 } } },
            "steps": [ {"strip": {"field": "a", "pattern": "("}} ] }"#;
        assert!(matches!(Recipe::from_json(bad_pattern), Err(Error::InvalidPattern(_))));
    }
}
