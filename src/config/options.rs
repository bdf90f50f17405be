// src/config/options.rs
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::consts::*;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppOptions {
    pub fetch: FetchOptions,
    pub table: TableOptions,
    pub export: ExportOptions,
}

/* ---------------- Fetch ---------------- */

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// Abort after this many seconds.
    pub timeout_secs: u64,
    /// Overrides the client identity string.
    pub user_agent: String,
    /// Extra request headers, sent in order.
    pub headers: Vec<(String, String)>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: s!(USER_AGENT),
            headers: Vec::new(),
        }
    }
}

impl FetchOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/* ---------------- Tabular extraction ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Some(true): first row is the schema. None: only when every cell is <th>.
    pub header: Option<bool>,
    /// Pad short rows / truncate long rows instead of failing.
    pub fill: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self { header: None, fill: true }
    }
}

/* ---------------- Export ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn ext(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }

    /// Field separator; JSON has none.
    pub fn delim(&self) -> Option<char> {
        match self {
            ExportFormat::Csv => Some(','),
            ExportFormat::Tsv => Some('\t'),
            ExportFormat::Json => None,
        }
    }

    pub fn from_ext(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "tsv" | "tab" => Some(ExportFormat::Tsv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    out_path: OutputPath,
    pub include_headers: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            out_path: OutputPath::default(),
            include_headers: true,
        }
    }
}

impl ExportOptions {
    /// `<dir>/<stem>.<ext>`, or the user's own extension if they typed one.
    pub fn out_path(&self) -> PathBuf {
        let file_name = match &self.out_path.user_ext {
            Some(ext) => {
                let mut name = self.out_path.file_stem.clone();
                name.push(".");
                name.push(ext);
                name
            }
            None => {
                let stem = self.out_path.file_stem.to_string_lossy();
                OsString::from(format!("{stem}.{}", self.format.ext()))
            }
        };
        Self::join_dir_and_filename(&self.out_path.dir, file_name)
    }

    pub fn current_dir(&self) -> &Path {
        &self.out_path.dir
    }

    /// Parse user text into dir + stem (+ explicit extension, kept verbatim).
    pub fn set_path(&mut self, text: &str) {
        let p = Path::new(text.trim());
        if let Some(parent) = p.parent() {
            self.out_path.dir = parent.to_path_buf();
        }
        if let Some(stem) = p.file_stem() {
            self.out_path.file_stem = stem.to_os_string();
        }
        self.out_path.user_ext = p.extension().map(|e| e.to_os_string());
    }

    /// Output directory for multi-table runs; stem and extension stay.
    pub fn set_dir(&mut self, dir: impl Into<PathBuf>) {
        self.out_path.dir = dir.into();
    }

    pub fn join_dir_and_filename(dir: &Path, file_name: impl AsRef<Path>) -> PathBuf {
        if dir.as_os_str().is_empty() {
            file_name.as_ref().to_path_buf()
        } else {
            dir.join(file_name)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct OutputPath {
    dir: PathBuf,
    file_stem: OsString,       // without extension
    user_ext: Option<OsString>,
}

impl Default for OutputPath {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUT_DIR),
            file_stem: OsString::from(DEFAULT_FILE),
            user_ext: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_follows_format() {
        let mut opts = ExportOptions::default();
        assert!(opts.out_path().to_string_lossy().ends_with("table.csv"));
        opts.format = ExportFormat::Json;
        assert!(opts.out_path().to_string_lossy().ends_with("table.json"));
    }

    #[test]
    fn user_extension_survives_format_change() {
        let mut opts = ExportOptions::default();
        opts.set_path("out/custom/population.txt");
        opts.format = ExportFormat::Tsv;
        let p = opts.out_path();
        assert_eq!(p, PathBuf::from("out/custom").join("population.txt"));
    }

    #[test]
    fn bare_file_name_has_no_dir() {
        let mut opts = ExportOptions::default();
        opts.set_path("lies");
        assert_eq!(opts.out_path(), PathBuf::from("lies.csv"));
    }
}
