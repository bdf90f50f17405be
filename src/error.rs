// src/error.rs
//! Error kinds for every pipeline stage.
//!
//! Fetch and parse failures are fatal to the current run. Extraction and
//! normalization failures are recoverable at the call site; the recipe
//! engine collects them as warnings next to the partial table.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unreachable host, timeout, non-success status, unreadable file.
    #[error("network error fetching {address}: {reason}")]
    Network { address: String, reason: String },

    /// Input could not be tokenized at all.
    #[error("malformed markup: {0}")]
    MalformedMarkup(String),

    #[error("node <{tag}> has no attribute '{name}'")]
    MissingAttribute { tag: String, name: String },

    #[error("row {row} has {found} cells, expected {expected}")]
    RowShape { row: usize, expected: usize, found: usize },

    #[error("not numeric: {0:?}")]
    NotNumeric(String),

    #[error("not a date: {0:?}")]
    NotDate(String),

    #[error("field '{field}' has {found} values, expected {expected}")]
    FieldLengthMismatch { field: String, expected: usize, found: usize },

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    /// A `RowId` issued before the table was last reshaped.
    #[error("row id {index} is stale (issued at generation {issued}, table is at {current})")]
    StaleRowIndex { index: usize, issued: u64, current: u64 },

    #[error("row {index} out of range (table has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("invalid group shape: size {size}, offset {offset}")]
    InvalidGroupShape { size: usize, offset: usize },

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid query {query:?}: {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("no table matches {0}")]
    TableNotFound(String),

    #[error("recipe error: {0}")]
    Recipe(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn network(address: impl Into<String>, reason: impl ToString) -> Self {
        Error::Network { address: address.into(), reason: reason.to_string() }
    }

    /// Coercion failures that `retype_field` may collect instead of failing.
    pub fn is_coercion(&self) -> bool {
        matches!(self, Error::NotNumeric(_) | Error::NotDate(_))
    }
}
