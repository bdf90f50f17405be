// src/core/mod.rs
//! Pipeline stages, leaf first: fetch → document → select → extract →
//! normalize → tabulate, all producing or consuming `table::Table`.

pub mod document;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod sanitize;
pub mod select;
pub mod table;
pub mod tabulate;

pub use document::Document;
pub use fetch::{AutoFetcher, Fetch, FileFetcher, HttpFetcher};
pub use select::{NodeRef, NodeSet, Query};
pub use table::{RowId, Table, Value};
pub use tabulate::Tabulator;
