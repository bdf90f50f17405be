// src/gui/components/table_list.rs
//
// Left panel: every <table> on the page with its first-row signature.
// Clicking one re-extracts it into the main view.

use eframe::egui;
use crate::gui::{actions, app::App};

pub fn draw(ui: &mut egui::Ui, app: &mut App) {
    ui.heading("Tables");
    ui.separator();

    if app.tables.is_empty() {
        ui.weak(if app.doc.is_some() { "No tables on this page" } else { "Fetch a page first" });
        return;
    }

    let mut clicked = None;
    egui::ScrollArea::vertical()
        .id_salt("table_list_scroll")
        .show(ui, |ui| {
            let w = ui.available_width();
            ui.set_min_width(w);

            for (idx, t) in app.tables.iter().enumerate() {
                let selected = app.state.gui.selected_table == Some(idx);
                let mut sig = t.headers.iter().take(4).cloned().collect::<Vec<_>>().join(", ");
                if t.headers.len() > 4 {
                    sig.push_str(", …");
                }
                let label = format!("#{}  {}×{}  {}", t.ordinal, t.rows, t.columns, sig);
                if ui.selectable_label(selected, label).clicked() && !selected {
                    clicked = Some(idx);
                }
            }
        });

    if let Some(idx) = clicked {
        app.state.gui.selected_table = Some(idx);
        actions::rebuild(app);
    }
}
