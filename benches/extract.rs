// benches/extract.rs
use criterion::{criterion_group, criterion_main, Criterion, black_box};

use tabscrape::{
    config::options::TableOptions,
    core::{
        document,
        extract::{self, ExtractMode, GroupShape, MissingPolicy, TablePick},
        select::{select, Query},
    },
};

fn load_sample(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).expect("read fixture")
}

fn bench_extract(c: &mut Criterion) {
    let population = load_sample("population.html");
    let lies = load_sample("lies.html");

    c.bench_function("parse_population", |b| {
        b.iter(|| {
            let doc = document::parse(black_box(&population)).unwrap();
            black_box(doc.len())
        })
    });

    let doc = document::parse(&population).unwrap();
    let pick = TablePick::Signature { headers: vec![String::from("Country")], columns: None };
    c.bench_function("table_by_signature", |b| {
        b.iter(|| {
            let node = extract::find_table(black_box(&doc), &pick).unwrap();
            let t = extract::html_table(&doc, node, TableOptions::default()).unwrap();
            black_box(t.row_count())
        })
    });

    let doc = document::parse(&lies).unwrap();
    let query = Query::parse("span.short-desc, strong, a").unwrap();
    let shape = GroupShape::new(3)
        .field("date", 1, ExtractMode::Text)
        .field("lie", 0, ExtractMode::OwnText)
        .field("url", 2, ExtractMode::Attr(String::from("href")));
    c.bench_function("sibling_groups", |b| {
        b.iter(|| {
            let hits = select(black_box(&doc), &query);
            let (t, _) = shape.tabulate(&hits, MissingPolicy::Null).unwrap();
            black_box(t.row_count())
        })
    });
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
