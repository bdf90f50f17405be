// src/file.rs

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::config::options::ExportOptions;
use crate::core::table::Table;
use crate::csv::to_export_string;
use crate::error::{Error, Result};

/// Write one table per `ExportOptions` (path, format, headers policy).
/// Returns the final path written to.
pub fn write_export(export: &ExportOptions, table: &Table) -> Result<PathBuf> {
    let path = export.out_path();
    write_table_to(&path, export, table)?;
    Ok(path)
}

/// Several named tables side by side in the export dir, `<name>.<ext>`,
/// with `name (2)` style suffixes when two names collide.
pub fn write_export_many(export: &ExportOptions, tables: &[(String, Table)]) -> Result<Vec<PathBuf>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut written = Vec::with_capacity(tables.len());
    for (name, table) in tables {
        let stem = crate::core::sanitize::sanitize_file_stem(name, "table");
        let path = resolve_filename(export.current_dir(), &stem, &mut seen, export.format.ext());
        write_table_to(&path, export, table)?;
        written.push(path);
    }
    Ok(written)
}

fn write_table_to(path: &Path, export: &ExportOptions, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    let contents = to_export_string(table, export.format, export.include_headers)?;
    fs::write(path, contents)?;
    info!(path = %path.display(), rows = table.row_count(), "Export: written");
    Ok(())
}

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("path exists but is not a directory: {}", dir.display()),
        )));
    }
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Duplicate handling only within this run.
pub fn resolve_filename(
    dir: &Path,
    stem: &str, // already sanitized, no extension
    seen_names: &mut HashMap<String, usize>,
    ext: &str,
) -> PathBuf {
    let count = seen_names.entry(s!(stem)).or_insert(0);

    // "<stem>.ext", then "<stem> (2).ext", "<stem> (3).ext", ...
    let filename = if *count == 0 { format!("{stem}.{ext}") } else { format!("{stem} ({}).{ext}", *count + 1) };

    *count += 1;
    ExportOptions::join_dir_and_filename(dir, filename)
}
