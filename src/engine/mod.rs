// src/engine/mod.rs
//! Declarative runs: a `Recipe` names a source, how to pull a table out of
//! it, and the cleanup steps to apply afterwards.

pub mod recipe;
pub mod run;

pub use recipe::{Extract, Recipe, Step};
pub use run::{RunReport, Warning, run, run_markup};
