// src/lib.rs

#[macro_use]
pub mod macros;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;

pub mod csv;
pub mod file;
pub mod gui;
pub mod log;
pub mod progress;
pub mod scrape;

pub use error::{Error, Result};
