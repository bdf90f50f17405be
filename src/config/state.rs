// src/config/state.rs
use super::options::AppOptions;

#[derive(Clone, Debug)]
pub struct GuiState {
    /// Address bar contents (URL or local path).
    pub address: String,

    pub window_w: u32,
    pub window_h: u32,

    /// Index into the table list of the current page.
    pub selected_table: Option<usize>,

    /// Drop `[1]`-style markers from cells and header names.
    pub strip_footnotes: bool,
}

impl Default for GuiState {
    fn default() -> Self {
        Self {
            address: s!(),
            window_w: 1100,
            window_h: 700,
            selected_table: None,
            strip_footnotes: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub options: AppOptions,
    pub gui: GuiState,
}
