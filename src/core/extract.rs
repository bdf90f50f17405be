// src/core/extract.rs
//! Extractor: text and attributes from selected nodes, whole `<table>`
//! subtrees into `Table`s, and stride decoding of repeating sibling groups.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::consts::UNNAMED_FIELD_PREFIX;
use crate::config::options::TableOptions;
use crate::core::document::{Document, NodeId, NodeKind};
use crate::core::sanitize::{header_key, normalize_ws};
use crate::core::select::{self, NodeRef, NodeSet, Query};
use crate::core::table::{Table, Value};
use crate::core::tabulate::Tabulator;
use crate::error::{Error, Result};

/* ---------------- Text / attributes ---------------- */

/// All descendant text, concatenated in order, outer whitespace trimmed.
pub fn text(node: NodeRef<'_>) -> String {
    raw_text(node.doc, node.id).trim().to_string()
}

/// Like `text`, with inner whitespace runs collapsed too.
pub fn text_squished(node: NodeRef<'_>) -> String {
    normalize_ws(&raw_text(node.doc, node.id))
}

/// Only the node's direct text children, squished. Skips nested elements.
pub fn own_text(node: NodeRef<'_>) -> String {
    let mut out = String::new();
    for &c in &node.node().children {
        if let NodeKind::Text(t) = &node.doc.node(c).kind {
            out.push_str(t);
            out.push(' ');
        }
    }
    normalize_ws(&out)
}

fn raw_text(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    if let NodeKind::Text(t) = &doc.node(id).kind {
        out.push_str(t);
    }
    for d in doc.descendants(id) {
        if let NodeKind::Text(t) = &doc.node(d).kind {
            out.push_str(t);
        }
    }
    out
}

pub fn attr(node: NodeRef<'_>, name: &str) -> Result<String> {
    let n = node.node();
    n.attr(name).map(|v| s!(v)).ok_or_else(|| Error::MissingAttribute {
        tag: s!(n.tag().unwrap_or("#text")),
        name: s!(name),
    })
}

/// `attr` with the caller's fallback for a missing attribute.
pub fn attr_or(node: NodeRef<'_>, name: &str, fallback: &str) -> String {
    attr(node, name).unwrap_or_else(|_| s!(fallback))
}

pub fn texts(nodes: &NodeSet<'_>) -> Vec<String> {
    nodes.iter().map(text).collect()
}

/* ---------------- Stride / group shape ---------------- */

/// Nodes at `offset, offset + size, offset + 2*size, ...`.
pub fn stride<'d>(nodes: &NodeSet<'d>, size: usize, offset: usize) -> Result<NodeSet<'d>> {
    if size == 0 || offset >= size {
        return Err(Error::InvalidGroupShape { size, offset });
    }
    let ids = nodes.ids().iter().skip(offset).step_by(size).copied().collect();
    Ok(NodeSet::from_ordered(nodes.document(), ids))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    Text,
    OwnText,
    Attr(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupField {
    pub name: String,
    pub offset: usize,
    #[serde(default = "default_mode")]
    pub mode: ExtractMode,
}

fn default_mode() -> ExtractMode {
    ExtractMode::Text
}

/// What to do when an `Attr` field's node lacks the attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    Fail,
    /// Store `Value::Missing` and report the error as a warning.
    #[default]
    Null,
}

/// Layout of a record spread over `size` consecutive sibling nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupShape {
    pub size: usize,
    pub fields: Vec<GroupField>,
}

impl GroupShape {
    pub fn new(size: usize) -> Self {
        Self { size, fields: Vec::new() }
    }

    pub fn field(mut self, name: &str, offset: usize, mode: ExtractMode) -> Self {
        self.fields.push(GroupField { name: s!(name), offset, mode });
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidGroupShape { size: 0, offset: 0 });
        }
        for f in &self.fields {
            if f.offset >= self.size {
                return Err(Error::InvalidGroupShape { size: self.size, offset: f.offset });
            }
        }
        crate::core::table::check_unique(
            &self.fields.iter().map(|f| f.name.clone()).collect::<Vec<_>>(),
        )
    }

    /// One node set per field, in field order.
    pub fn split<'d>(&self, nodes: &NodeSet<'d>) -> Result<Vec<(String, NodeSet<'d>)>> {
        self.validate()?;
        if nodes.len() % self.size != 0 {
            debug!(len = nodes.len(), size = self.size, "Group: trailing partial group");
        }
        self.fields
            .iter()
            .map(|f| Ok((f.name.clone(), stride(nodes, self.size, f.offset)?)))
            .collect()
    }

    /// Extract every field and zip the columns. A trailing partial group
    /// surfaces as `FieldLengthMismatch`.
    pub fn tabulate(&self, nodes: &NodeSet<'_>, missing: MissingPolicy) -> Result<(Table, Vec<Error>)> {
        let mut warnings = Vec::new();
        let mut tab = Tabulator::new();
        for ((name, set), field) in self.split(nodes)?.into_iter().zip(&self.fields) {
            let mut values = Vec::with_capacity(set.len());
            for node in set.iter() {
                let v = match &field.mode {
                    ExtractMode::Text => Value::Text(text_squished(node)),
                    ExtractMode::OwnText => Value::Text(own_text(node)),
                    ExtractMode::Attr(a) => match attr(node, a) {
                        Ok(v) => Value::Text(v),
                        Err(e) if missing == MissingPolicy::Null => {
                            warnings.push(e);
                            Value::Missing
                        }
                        Err(e) => return Err(e),
                    },
                };
                values.push(v);
            }
            tab = tab.column(name, values);
        }
        Ok((tab.build()?, warnings))
    }
}

/* ---------------- Tables ---------------- */

/// How to find the target `<table>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TablePick {
    /// First table whose header row holds all these labels (and, if set,
    /// exactly this many columns). Labels compare loosely: case, footnote
    /// markers and extra whitespace are ignored.
    Signature {
        headers: Vec<String>,
        #[serde(default)]
        columns: Option<usize>,
    },
    /// 1-based position among all tables on the page. Breaks when the page
    /// gains or loses a table; prefer `Signature`.
    Ordinal(usize),
}

impl std::fmt::Display for TablePick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TablePick::Signature { headers, columns: Some(n) } => write!(f, "headers {headers:?} with {n} columns"),
            TablePick::Signature { headers, columns: None } => write!(f, "headers {headers:?}"),
            TablePick::Ordinal(n) => write!(f, "table #{n}"),
        }
    }
}

/// Shape of one table as seen from its first row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSummary {
    pub node: NodeId,
    pub ordinal: usize,
    pub headers: Vec<String>,
    pub columns: usize,
    pub rows: usize,
}

impl TableSummary {
    pub fn matches(&self, pick: &TablePick) -> bool {
        match pick {
            TablePick::Ordinal(n) => self.ordinal == *n,
            TablePick::Signature { headers, columns } => {
                let have: Vec<String> = self.headers.iter().map(|h| header_key(h)).collect();
                columns.is_none_or(|n| n == self.columns)
                    && headers.iter().all(|want| have.contains(&header_key(want)))
            }
        }
    }
}

/// Every `<table>` in document order, summarized.
pub fn tables(doc: &Document) -> Vec<TableSummary> {
    select::select(doc, &Query::tag("table"))
        .ids()
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            let grid = cell_grid(doc, id);
            let headers = grid.first().map(|r| r.iter().map(|c| c.text.clone()).collect()).unwrap_or_default();
            let columns = grid.first().map(Vec::len).unwrap_or(0);
            TableSummary { node: id, ordinal: i + 1, headers, columns, rows: grid.len() }
        })
        .collect()
}

pub fn find_table(doc: &Document, pick: &TablePick) -> Result<NodeId> {
    let found = tables(doc).into_iter().find(|t| t.matches(pick));
    match found {
        Some(t) => {
            debug!(ordinal = t.ordinal, %pick, "Table: picked");
            Ok(t.node)
        }
        None => Err(Error::TableNotFound(pick.to_string())),
    }
}

struct GridCell {
    text: String,
    header: bool,
}

/// Rows of a table with `colspan`/`rowspan` expanded. Rows of nested tables
/// are not included; rows without cells are skipped.
fn cell_grid(doc: &Document, table: NodeId) -> Vec<Vec<GridCell>> {
    // (text, is_th, rows still to cover) per column
    let mut pending: Vec<Option<(String, bool, usize)>> = Vec::new();
    let mut grid = Vec::new();

    let rows = doc
        .descendants(table)
        .filter(|&id| doc.node(id).tag() == Some("tr") && doc.closest(id, "table") == Some(table));

    for tr in rows {
        let cells: Vec<NodeId> = doc
            .child_elements(tr)
            .filter(|&c| matches!(doc.node(c).tag(), Some("td" | "th")))
            .collect();
        if cells.is_empty() {
            continue;
        }

        let mut row: Vec<GridCell> = Vec::new();
        let mut col = 0usize;

        let take_pending = |row: &mut Vec<GridCell>, pending: &mut Vec<Option<(String, bool, usize)>>, col: usize| -> bool {
            if let Some(Some((text, header, left))) = pending.get_mut(col) {
                row.push(GridCell { text: text.clone(), header: *header });
                *left -= 1;
                if *left == 0 {
                    pending[col] = None;
                }
                true
            } else {
                false
            }
        };

        for &cell in &cells {
            while take_pending(&mut row, &mut pending, col) {
                col += 1;
            }
            let node = doc.node(cell);
            let header = node.tag() == Some("th");
            let txt = normalize_ws(&raw_text(doc, cell));
            let colspan = span(node.attr("colspan"), 1000);
            let rowspan = span(node.attr("rowspan"), 65534);
            for _ in 0..colspan {
                row.push(GridCell { text: txt.clone(), header });
                if rowspan > 1 {
                    if pending.len() <= col {
                        pending.resize(col + 1, None);
                    }
                    pending[col] = Some((txt.clone(), header, rowspan - 1));
                }
                col += 1;
            }
        }

        // rowspans reaching past this row's last cell; gaps become empty cells
        if let Some(last) = pending.iter().rposition(Option::is_some) {
            while col <= last {
                if !take_pending(&mut row, &mut pending, col) {
                    row.push(GridCell { text: s!(), header: false });
                }
                col += 1;
            }
        }
        grid.push(row);
    }
    grid
}

fn span(v: Option<&str>, cap: usize) -> usize {
    v.and_then(|s| s.trim().parse::<usize>().ok()).unwrap_or(1).clamp(1, cap)
}

/// Convert a `<table>` subtree into a `Table` of text cells. `table` must be
/// an id from `doc` (as returned by `find_table` or `tables`).
pub fn html_table(doc: &Document, table: NodeId, opts: TableOptions) -> Result<Table> {
    if doc.get(table).and_then(|n| n.tag()) != Some("table") {
        return Err(Error::TableNotFound(format!("node {} is not a <table> in this document", table.index())));
    }
    let mut grid = cell_grid(doc, table);

    let use_header = match opts.header {
        Some(h) => h,
        None => grid.first().is_some_and(|r| r.iter().all(|c| c.header)),
    };

    let header_row = if use_header && !grid.is_empty() { Some(grid.remove(0)) } else { None };

    let width = match &header_row {
        Some(h) => h.len(),
        None if opts.fill => grid.iter().map(Vec::len).max().unwrap_or(0),
        None => grid.first().map(Vec::len).unwrap_or(0),
    };

    let fields = match header_row {
        Some(h) => field_names(h.into_iter().map(|c| c.text)),
        None => (1..=width).map(|i| format!("{UNNAMED_FIELD_PREFIX}{i}")).collect(),
    };

    let mut rows = Vec::with_capacity(grid.len());
    for (i, cells) in grid.into_iter().enumerate() {
        if cells.len() != width && !opts.fill {
            return Err(Error::RowShape { row: i, expected: width, found: cells.len() });
        }
        let mut values: Vec<Value> = cells.into_iter().take(width).map(|c| Value::Text(c.text)).collect();
        values.resize(width, Value::Text(s!()));
        rows.push(values);
    }

    debug!(fields = fields.len(), rows = rows.len(), "Table: extracted");
    Table::new(fields, rows)
}

/// Blank labels become `X<n>`; repeats get `_2`, `_3`, ...
pub fn field_names(labels: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (i, label) in labels.into_iter().enumerate() {
        let base = if label.trim().is_empty() { format!("{UNNAMED_FIELD_PREFIX}{}", i + 1) } else { label };
        let mut name = base.clone();
        let mut n = 2;
        while out.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        out.push(name);
    }
    out
}
