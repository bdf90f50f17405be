// src/bin/gui.rs
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]
use eframe::egui::ViewportBuilder;
use tabscrape::{
    config::state::AppState,
    gui,
    log::{self, LogTarget},
};

fn main() {
    if let Err(e) = log::init(LogTarget::default_file()) {
        eprintln!("Logging disabled: {e}");
    }

    let mut state = AppState::default();
    // `tabscrape <address>` pre-fills the address bar
    if let Some(address) = std::env::args().nth(1) {
        state.gui.address = address;
    }

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([state.gui.window_w as f32, state.gui.window_h as f32])
            .with_title("Table Scraper"),
        ..Default::default()
    };

    if let Err(e) = gui::run(options, state) {
        eprintln!("GUI failed: {e}");
        std::process::exit(1);
    }
}
