// src/gui/actions.rs
//
// Button actions. Layout lives in components/*; the operational logic here
// updates status/logs and mutates `app`.

use std::{sync::mpsc, thread};

use eframe::egui;
use tracing::{debug, error, info};

use crate::{
    core::{
        document,
        extract,
        fetch::AutoFetcher,
        normalize,
        table::{Table, Value},
    },
    csv, error, file,
    gui::{app::App, progress::GuiProgress},
    scrape,
};

/// Fetch the address bar target on a worker thread.
pub fn fetch(app: &mut App, ctx: &egui::Context) {
    let address = app.state.gui.address.trim().to_string();
    if address.is_empty() {
        app.status("Enter a URL or a file path");
        return;
    }
    info!(%address, "Fetch: begin");

    let (tx, rx) = mpsc::channel();
    let opts = app.state.options.fetch.clone();
    let status = app.status.clone();
    let ctx = ctx.clone();
    thread::spawn(move || {
        let fetcher = AutoFetcher::new(&opts);
        let mut prog = GuiProgress::new(status);
        let result = scrape::fetch_all(std::slice::from_ref(&address), &fetcher, Some(&mut prog))
            .pop()
            .unwrap_or_else(|| Err(error::Error::network(address.as_str(), "no result")));
        let _ = tx.send(result);
        ctx.request_repaint();
    });
    app.pending = Some(rx);
}

/// Parse fetched markup and list its tables.
pub fn load_page(app: &mut App, result: error::Result<String>) {
    let parsed = result.and_then(|markup| document::parse(&markup));
    match parsed {
        Ok(doc) => {
            app.tables = extract::tables(&doc);
            app.doc = Some(doc);
            app.state.gui.selected_table = app.tables.first().map(|_| 0);
            app.status(format!("Found {} table(s)", app.tables.len()));
            info!(tables = app.tables.len(), "Fetch: page loaded");
            rebuild(app);
        }
        Err(e) => {
            error!("Fetch: {e}");
            app.status(format!("Error: {e}"));
        }
    }
}

/// Re-extract the selected table with the current toggles.
pub fn rebuild(app: &mut App) {
    app.table = None;
    app.rows.clear();
    app.numeric_cols.clear();

    let (Some(doc), Some(ix)) = (&app.doc, app.state.gui.selected_table) else { return };
    let Some(summary) = app.tables.get(ix) else { return };

    let built = extract::html_table(doc, summary.node, app.state.options.table).and_then(|mut t| {
        if app.state.gui.strip_footnotes {
            normalize::strip_footnotes(&mut t)?;
        }
        Ok(t)
    });

    match built {
        Ok(t) => {
            app.rows = t.to_string_rows();
            app.numeric_cols = numeric_columns(&t);
            debug!(rows = t.row_count(), fields = t.field_count(), "Table: shown");
            app.table = Some(t);
        }
        Err(e) => {
            error!("Table: {e}");
            app.status(format!("Table error: {e}"));
        }
    }
}

/// Columns where every non-empty cell reads as a number (display alignment).
fn numeric_columns(t: &Table) -> Vec<bool> {
    (0..t.field_count())
        .map(|c| {
            let mut cells = t.records().iter().filter_map(|r| match r.get(c) {
                Some(Value::Text(s)) if s.trim().is_empty() => None,
                other => other,
            });
            let mut any = false;
            let all = cells.all(|v| {
                any = true;
                match v {
                    Value::Number(_) | Value::Missing => true,
                    Value::Text(s) => normalize::parse_number(s).is_ok() && !s.chars().any(char::is_alphabetic),
                    Value::Date(_) => false,
                }
            });
            any && all
        })
        .collect()
}

pub fn copy(app: &mut App, ctx: &egui::Context) {
    let Some(table) = &app.table else {
        app.status("Nothing to copy");
        debug!("Copy: Clicked, but there's nothing to copy");
        return;
    };
    let export = &app.state.options.export;
    match csv::to_export_string(table, export.format, export.include_headers) {
        Ok(txt) => {
            ctx.copy_text(txt);
            info!(rows = table.row_count(), format = ?export.format, "Copy: ok");
            app.status("Copied to clipboard");
        }
        Err(e) => app.status(format!("Copy error: {e}")),
    }
}

pub fn export(app: &mut App) {
    if app.out_path_dirty {
        app.state.options.export.set_path(&app.out_path_text);
        info!(path = %app.state.options.export.out_path().display(), "Export: Out path set");
        app.out_path_dirty = false;
    }
    let Some(table) = &app.table else {
        app.status("Nothing to export");
        return;
    };
    match file::write_export(&app.state.options.export, table) {
        Ok(path) => app.status(format!("Exported to {}", path.display())),
        Err(e) => {
            error!("Export: Error: {e}");
            app.status(format!("Export error: {e}"));
        }
    }
}
