// src/gui/components/data_table.rs
//
// Draws the current table. Purely a view over `app.rows`; numeric columns
// are centered, text columns left-aligned.

use eframe::egui::{self, Align, Layout, RichText, TextWrapMode};
use egui_extras::{Column, TableBuilder};

use crate::config::consts::MISSING_TEXT;
use crate::gui::app::App;

pub fn draw(ui: &mut egui::Ui, app: &mut App) {
    let Some(table) = &app.table else {
        ui.weak("No table selected");
        return;
    };
    let fields = table.fields();
    let cols = fields.len();
    if cols == 0 {
        ui.weak("Empty table");
        return;
    }

    // Ensure scroll bars allocate space (not floating over content)
    {
        let s = &mut ui.style_mut().spacing.scroll;
        s.floating = false;
        s.bar_width = 10.0;
        s.handle_min_length = 48.0;
    }

    let numeric = |ci: usize| app.numeric_cols.get(ci).copied().unwrap_or(false);
    let avail_h = ui.available_height();

    egui::ScrollArea::horizontal()
        .id_salt("data_table_hscroll")
        .min_scrolled_height(avail_h)
        .show(ui, |ui| {
            let mut builder = TableBuilder::new(ui)
                .striped(true)
                .min_scrolled_height(0.0)
                // fresh widths when the schema changes
                .id_salt(("table_state", fields));
            for ci in 0..cols {
                let w = if numeric(ci) { 90.0 } else { 160.0 };
                builder = builder.column(Column::initial(w).resizable(true).clip(true).at_least(20.0));
            }

            builder
                .header(24.0, |mut header| {
                    for name in fields {
                        header.col(|ui| {
                            ui.style_mut().wrap_mode = Some(TextWrapMode::Extend);
                            ui.label(RichText::new(name).strong());
                        });
                    }
                })
                .body(|body| {
                    body.rows(20.0, app.rows.len(), |mut row| {
                        let Some(data) = app.rows.get(row.index()) else { return };
                        for (ci, cell) in data.iter().enumerate() {
                            row.col(|ui| {
                                ui.style_mut().wrap_mode = Some(TextWrapMode::Extend);
                                let mut rt = RichText::new(cell);
                                if cell == MISSING_TEXT {
                                    rt = rt.weak();
                                }
                                if numeric(ci) {
                                    ui.centered_and_justified(|ui| {
                                        ui.label(rt);
                                    });
                                } else {
                                    ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                                        ui.label(rt);
                                    });
                                }
                            });
                        }
                    });
                });
        });
}
