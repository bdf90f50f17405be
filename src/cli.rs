// src/cli.rs
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use tracing::info;

use crate::{
    config::{
        consts::{DEFAULT_OUT_DIR, DEFAULT_TIMEOUT_SECS, USER_AGENT},
        options::{ExportFormat, ExportOptions, FetchOptions, TableOptions},
    },
    core::{
        document,
        extract::{self, TablePick},
        fetch::{AutoFetcher, Fetch},
        normalize,
        table::Table,
    },
    csv,
    engine::Recipe,
    file,
    progress::Progress,
    scrape,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Csv,
    Tsv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Csv => ExportFormat::Csv,
            Format::Tsv => ExportFormat::Tsv,
            Format::Json => ExportFormat::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HeaderRow {
    Auto,
    Yes,
    No,
}

/// Pull tables out of web pages (or local HTML files) into CSV/TSV/JSON.
#[derive(Parser, Debug)]
#[command(name = "tabscrape-cli", version, about)]
pub struct Args {
    /// Recipe file(s) (JSON). Several recipes are fetched concurrently.
    #[arg(long, value_name = "FILE", conflicts_with = "url")]
    pub recipe: Vec<PathBuf>,

    /// Page to scrape (URL, file:// URL or path).
    #[arg(long, required_unless_present = "recipe")]
    pub url: Option<String>,

    /// Pick the N-th table on the page (1-based).
    #[arg(long, value_name = "N", conflicts_with = "has_header")]
    pub table: Option<usize>,

    /// Pick the first table whose header row has all of these labels.
    #[arg(long = "has-header", value_name = "LABEL")]
    pub has_header: Vec<String>,

    /// Treat the first row as field names.
    #[arg(long, value_enum, default_value_t = HeaderRow::Auto)]
    pub header_row: HeaderRow,

    /// Fail on ragged rows instead of padding them.
    #[arg(long)]
    pub strict: bool,

    /// Remove `[1]`-style footnote markers from every cell.
    #[arg(long)]
    pub strip_footnotes: bool,

    /// Output format. Defaults to the `-o` extension, else CSV.
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    #[arg(long)]
    pub include_headers: bool,

    /// Output file (one table) or directory (several). Stdout if omitted.
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    #[arg(long, default_value = USER_AGENT)]
    pub user_agent: String,

    /// Print the tables found on the page and exit.
    #[arg(long, requires = "url")]
    pub list_tables: bool,
}

impl Args {
    fn fetch_options(&self) -> FetchOptions {
        FetchOptions { timeout_secs: self.timeout, user_agent: self.user_agent.clone(), ..FetchOptions::default() }
    }

    fn table_options(&self) -> TableOptions {
        let header = match self.header_row {
            HeaderRow::Auto => None,
            HeaderRow::Yes => Some(true),
            HeaderRow::No => Some(false),
        };
        TableOptions { header, fill: !self.strict }
    }

    fn export_options(&self) -> ExportOptions {
        let mut export = ExportOptions::default();
        export.format = self.format.map(ExportFormat::from).unwrap_or_else(|| {
            self.out
                .as_deref()
                .and_then(|p| p.extension())
                .and_then(|e| ExportFormat::from_ext(&e.to_string_lossy()))
                .unwrap_or(ExportFormat::Csv)
        });
        export.include_headers = self.include_headers;
        if let Some(out) = &self.out {
            export.set_path(&out.to_string_lossy());
        }
        // JSON always carries its field names
        if export.format == ExportFormat::Json {
            export.include_headers = true;
        }
        export
    }

    fn pick(&self) -> TablePick {
        match (self.table, self.has_header.is_empty()) {
            (Some(n), _) => TablePick::Ordinal(n),
            (None, false) => TablePick::Signature { headers: self.has_header.clone(), columns: None },
            (None, true) => TablePick::Ordinal(1),
        }
    }
}

/// Fetch progress on the log.
struct LogProgress;

impl Progress for LogProgress {
    fn begin(&mut self, total: usize) {
        info!(total, "Fetch: begin");
    }
    fn log(&mut self, msg: &str) {
        info!("{msg}");
    }
    fn item_done(&mut self, index: usize) {
        info!(index, "Fetch: page done");
    }
}

pub fn run(args: Args) -> Result<()> {
    let fetcher = AutoFetcher::new(&args.fetch_options());
    if args.recipe.is_empty() {
        run_url(&args, &fetcher)
    } else {
        run_recipes(&args, &fetcher)
    }
}

fn run_url(args: &Args, fetcher: &dyn Fetch) -> Result<()> {
    let url = args.url.as_deref().ok_or_else(|| eyre!("--url or --recipe is required"))?;
    let markup = fetcher.fetch(url)?;
    let doc = document::parse(&markup)?;

    if args.list_tables {
        let mut out = std::io::stdout().lock();
        for t in extract::tables(&doc) {
            writeln!(out, "{}\t{}x{}\t{}", t.ordinal, t.rows, t.columns, t.headers.join(" | "))?;
        }
        return Ok(());
    }

    let node = extract::find_table(&doc, &args.pick())?;
    let mut table = extract::html_table(&doc, node, args.table_options())?;
    if args.strip_footnotes {
        normalize::strip_footnotes(&mut table)?;
    }
    emit(args, &table)
}

fn run_recipes(args: &Args, fetcher: &dyn Fetch) -> Result<()> {
    let recipes = args
        .recipe
        .iter()
        .map(|p| Recipe::load(p).wrap_err_with(|| format!("loading {}", p.display())))
        .collect::<Result<Vec<_>>>()?;

    let reports = scrape::run_all(&recipes, fetcher, Some(&mut LogProgress));

    let mut tables = Vec::new();
    let mut failed = 0;
    for (recipe, report) in recipes.iter().zip(reports) {
        match report {
            Ok(mut r) => {
                if args.strip_footnotes {
                    normalize::strip_footnotes(&mut r.table)?;
                }
                for w in &r.warnings {
                    eprintln!("warning: {}: {w}", r.name);
                }
                tables.push((r.name, r.table));
            }
            Err(e) => {
                eprintln!("error: {}: {e}", recipe.name);
                failed += 1;
            }
        }
    }

    if let [(_, table)] = tables.as_slice() {
        emit(args, table)?;
    } else if !tables.is_empty() {
        let mut export = args.export_options();
        export.set_dir(args.out.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)));
        for p in file::write_export_many(&export, &tables)? {
            println!("{}", p.display());
        }
    }

    if failed > 0 {
        bail!("{failed} of {} recipe(s) failed", recipes.len());
    }
    Ok(())
}

/// Stdout, or the `-o` file.
fn emit(args: &Args, table: &Table) -> Result<()> {
    let export = args.export_options();
    if args.out.is_some() {
        let path = file::write_export(&export, table)?;
        eprintln!("wrote {} rows to {}", table.row_count(), path.display());
    } else {
        let text = csv::to_export_string(table, export.format, export.include_headers)?;
        std::io::stdout().lock().write_all(text.as_bytes())?;
    }
    Ok(())
}
