// src/gui/app.rs
use std::{
    error::Error,
    sync::{mpsc, Arc, Mutex},
    time::Duration,
};

use eframe::egui;
use tracing::info;

use crate::{
    config::state::AppState,
    core::{document::Document, extract::TableSummary, table::Table},
    error,
};

pub fn run(options: eframe::NativeOptions, state: AppState) -> Result<(), Box<dyn Error>> {
    eframe::run_native(
        "Table Scraper",
        options,
        Box::new(|_cc| Ok(Box::new(App::new(state)))),
    )?;
    Ok(())
}

pub struct App {
    // single source of truth (UI thread only)
    pub state: AppState,

    // output text field UX (we map this <-> ExportOptions)
    pub out_path_text: String,
    pub out_path_dirty: bool,

    // current page
    pub doc: Option<Document>,
    pub tables: Vec<TableSummary>,

    // current table + display cache
    pub table: Option<Table>,
    pub rows: Vec<Vec<String>>,
    pub numeric_cols: Vec<bool>,

    // status/progress (the fetch worker writes here)
    pub status: Arc<Mutex<String>>,
    pub pending: Option<mpsc::Receiver<error::Result<String>>>,
}

impl App {
    pub fn new(state: AppState) -> Self {
        let out_path_text = state.options.export.out_path().to_string_lossy().into();
        info!("Init: GUI ready");
        Self {
            state,
            out_path_text,
            out_path_dirty: false,
            doc: None,
            tables: Vec::new(),
            table: None,
            rows: Vec::new(),
            numeric_cols: Vec::new(),
            status: Arc::new(Mutex::new(s!("Idle"))),
            pending: None,
        }
    }

    #[inline]
    pub fn running(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn status<T: Into<String>>(&self, msg: T) {
        *self.status.lock().unwrap_or_else(|e| e.into_inner()) = msg.into();
    }

    pub fn status_text(&self) -> String {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Pick up a finished fetch, if any.
    fn poll_fetch(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.pending else { return };
        match rx.try_recv() {
            Ok(result) => {
                self.pending = None;
                crate::gui::actions::load_page(self, result);
            }
            Err(mpsc::TryRecvError::Empty) => ctx.request_repaint_after(Duration::from_millis(100)),
            Err(mpsc::TryRecvError::Disconnected) => {
                self.pending = None;
                self.status("Fetch worker stopped");
            }
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_fetch(ctx);

        egui::TopBottomPanel::top("source").show(ctx, |ui| {
            crate::gui::components::source_bar::draw(ui, self);
        });

        egui::SidePanel::left("tables")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                crate::gui::components::table_list::draw(ui, self);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            crate::gui::components::export_bar::draw(ui, self);

            ui.separator();

            crate::gui::components::data_table::draw(ui, self);
        });
    }
}
