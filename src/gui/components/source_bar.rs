// src/gui/components/source_bar.rs
//
// Address bar: URL or local path, Fetch button, status line.

use eframe::egui::{self, widgets::Spinner};
use crate::gui::{actions, app::App};

pub fn draw(ui: &mut egui::Ui, app: &mut App) {
    let running = app.running();

    ui.horizontal(|ui| {
        ui.label("Address:");
        let resp = ui.add(
            egui::TextEdit::singleline(&mut app.state.gui.address)
                .hint_text("https://… or page.html")
                .font(egui::TextStyle::Monospace)
                .desired_width(ui.available_width() - 120.0),
        );
        let enter = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        let fetch = ui.add_enabled(!running, egui::Button::new("Fetch")).clicked();
        if (fetch || enter) && !running {
            actions::fetch(app, ui.ctx());
        }
        if running {
            ui.add(Spinner::new());
        }
    });

    ui.label(format!("Status: {}", app.status_text()));
}
