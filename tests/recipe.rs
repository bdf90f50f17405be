// tests/recipe.rs
//
// The bundled demo recipes, run offline against the fixture pages.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tabscrape::{
    core::{fetch::FileFetcher, table::Value},
    engine::{self, Recipe},
    progress::Progress,
    scrape, Error,
};

fn root() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

/// Demo recipe with its relative source resolved against the crate root.
fn demo(name: &str) -> Recipe {
    let mut r = Recipe::load(&root().join("demos").join(format!("{name}.json"))).unwrap();
    r.source = root().join(&r.source).to_string_lossy().into_owned();
    r
}

#[test]
fn population_recipe() {
    let report = engine::run(&demo("population"), &FileFetcher).unwrap();
    let t = &report.table;

    assert_eq!(report.name, "population");
    assert_eq!(t.fields(), ["Country", "Population", "Date"]);
    assert_eq!(t.row_count(), 4);
    assert_eq!(t.get(0, "Country"), Some(&Value::text("China")));
    assert_eq!(t.get(2, "Country"), Some(&Value::text("United States")));
    assert_eq!(t.get(1, "Population"), Some(&Value::Number(1_324_171_354.0)));
    assert_eq!(t.get(2, "Date"), Some(&Value::Date(NaiveDate::from_ymd_opt(2017, 2, 1).unwrap())));

    // Antarctica: no figure, no date
    assert_eq!(t.get(3, "Population"), Some(&Value::Missing));
    assert_eq!(t.get(3, "Date"), Some(&Value::Missing));
    let stages: Vec<&str> = report.warnings.iter().map(|w| w.stage.as_str()).collect();
    assert_eq!(stages, ["step 5, row 3", "step 6, row 3"]);
    assert!(report.warnings.iter().all(|w| w.error.is_coercion()));
}

#[test]
fn lies_recipe() {
    let report = engine::run(&demo("lies"), &FileFetcher).unwrap();
    let t = &report.table;

    assert_eq!(t.fields(), ["date", "lie", "explanation", "url"]);
    assert_eq!(t.row_count(), 4);
    assert_eq!(t.get(1, "date"), Some(&Value::text("Jan. 21")));
    assert_eq!(t.get(2, "explanation"), Some(&Value::text("There's no evidence of illegal voting.")));
    assert_eq!(t.get(1, "url"), Some(&Value::text("https://example.org/time")));
    assert_eq!(t.get(3, "url"), Some(&Value::Missing));

    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].stage, "extract");
    assert!(matches!(report.warnings[0].error, Error::MissingAttribute { .. }));
}

#[test]
fn unknown_field_aborts_the_run() {
    let mut r = demo("population");
    r.steps.push(engine::Step::Rename { from: "Area".into(), to: "Size".into() });
    let err = engine::run(&r, &FileFetcher).unwrap_err();
    assert!(matches!(err, Error::UnknownField(ref f) if f == "Area"));
}

#[derive(Default)]
struct Seen {
    total: usize,
    done: Vec<usize>,
    notes: Vec<String>,
    finished: bool,
}

impl Progress for Seen {
    fn begin(&mut self, total: usize) {
        self.total = total;
    }
    fn log(&mut self, msg: &str) {
        self.notes.push(msg.to_string());
    }
    fn item_done(&mut self, index: usize) {
        self.done.push(index);
    }
    fn finish(&mut self) {
        self.finished = true;
    }
}

#[test]
fn several_recipes_keep_their_order() {
    let mut missing = demo("lies");
    missing.name = "gone".into();
    missing.source = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/nope.html").display().to_string();

    let recipes = [demo("population"), missing, demo("lies")];
    let mut seen = Seen::default();
    let reports = scrape::run_all(&recipes, &FileFetcher, Some(&mut seen));

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].as_ref().unwrap().name, "population");
    assert!(matches!(reports[1], Err(Error::Network { .. })));
    assert_eq!(reports[2].as_ref().unwrap().name, "lies");

    assert_eq!(seen.total, 3);
    seen.done.sort_unstable();
    assert_eq!(seen.done, [0, 2]);
    assert!(seen.notes.iter().any(|n| n.contains("nope.html")));
    assert!(seen.finished);
}

#[test]
fn bad_recipes_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();

    let path = dir.path().join("empty-select.json");
    std::fs::write(
        &path,
        r#"{"name":"x","source":"a.html","extract":{"groups":{"select":[],"size":1,"fields":[]}}}"#,
    )
    .unwrap();
    assert!(matches!(Recipe::load(&path), Err(Error::Recipe(_))));

    let path = dir.path().join("bad-offset.json");
    std::fs::write(
        &path,
        r#"{"name":"x","source":"a.html","extract":{"groups":{"select":["b"],"size":2,"fields":[{"name":"n","offset":2}]}}}"#,
    )
    .unwrap();
    assert!(matches!(Recipe::load(&path), Err(Error::InvalidGroupShape { size: 2, offset: 2 })));

    let path = dir.path().join("zero-size.json");
    std::fs::write(
        &path,
        r#"{"name":"x","source":"a.html","extract":{"groups":{"select":["b"],"size":0,"fields":[]}}}"#,
    )
    .unwrap();
    assert!(matches!(Recipe::load(&path), Err(Error::InvalidGroupShape { size: 0, .. })));

    let path = dir.path().join("not-json.json");
    std::fs::write(&path, "{ nope").unwrap();
    assert!(matches!(Recipe::load(&path), Err(Error::Recipe(_))));
}
