// src/gui/components/export_bar.rs
//
// Table toggles (header row, fill, footnotes) and the export controls
// (format, headers, output path, Copy / Export).

use eframe::egui;
use tracing::{debug, info};

use crate::{
    config::options::ExportFormat,
    gui::{actions, app::App},
};

pub fn draw(ui: &mut egui::Ui, app: &mut App) {
    // --- Table toggles ---
    let mut rebuild = false;
    ui.horizontal(|ui| {
        let table = &mut app.state.options.table;
        ui.label("Header row:");
        rebuild |= ui.selectable_value(&mut table.header, None, "Auto").changed();
        rebuild |= ui.selectable_value(&mut table.header, Some(true), "Yes").changed();
        rebuild |= ui.selectable_value(&mut table.header, Some(false), "No").changed();
        ui.separator();
        rebuild |= ui.checkbox(&mut table.fill, "Fill ragged rows").changed();
        rebuild |= ui.checkbox(&mut app.state.gui.strip_footnotes, "Strip footnotes").changed();
    });
    if rebuild {
        info!(
            header = ?app.state.options.table.header,
            fill = app.state.options.table.fill,
            strip = app.state.gui.strip_footnotes,
            "UI: table options changed"
        );
        actions::rebuild(app);
    }

    // --- Format + Include headers ---
    {
        let export = &mut app.state.options.export;
        let prev_fmt = export.format;

        ui.horizontal(|ui| {
            ui.label("Format:");
            ui.selectable_value(&mut export.format, ExportFormat::Csv, "CSV");
            ui.selectable_value(&mut export.format, ExportFormat::Tsv, "TSV");
            ui.selectable_value(&mut export.format, ExportFormat::Json, "JSON");
            ui.separator();
            // JSON always carries its field names
            ui.add_enabled(
                export.format != ExportFormat::Json,
                egui::Checkbox::new(&mut export.include_headers, "Include headers"),
            );
        });

        if export.format != prev_fmt {
            info!("UI: Export format → {:?}", export.format);
            if !app.out_path_dirty {
                app.out_path_text = export.out_path().to_string_lossy().into_owned();
            }
        }
    }

    // --- Output field + actions ---
    ui.horizontal(|ui| {
        ui.label("Output:");
        if ui
            .add(egui::TextEdit::singleline(&mut app.out_path_text).font(egui::TextStyle::Monospace))
            .changed()
        {
            app.out_path_dirty = true;
            debug!("UI: out_path_text changed (dirty=true) → {}", app.out_path_text);
        }

        let has_table = app.table.is_some();
        if ui.add_enabled(has_table, egui::Button::new("Copy")).clicked() {
            actions::copy(app, ui.ctx());
        }
        if ui.add_enabled(has_table, egui::Button::new("Export")).clicked() {
            actions::export(app);
        }
        if let Some(t) = &app.table {
            ui.label(format!("{} rows × {} fields", t.row_count(), t.field_count()));
        }
    });
}
