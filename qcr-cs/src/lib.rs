//! qcr-cs library - Consolidate QCA solutions
//!
//! Flattens conservative, intermediate and parsimonious minimization results
//! into a single report table with one row per prime implicant, optionally
//! filtered by consistency, rounded and exported.
//!
//! ```no_run
//! use qcr_cs::{consolidate, ConsolidateOptions, SolutionInputs};
//!
//! # fn run(inputs: SolutionInputs) -> qcr_common::Result<()> {
//! let options = ConsolidateOptions::default()
//!     .incl_cut(0.8)
//!     .round(3)
//!     .save("solutions.csv");
//! let table = consolidate(&inputs, &options)?;
//! println!("{} rows", table.len());
//! # Ok(())
//! # }
//! ```

pub mod cases;
pub mod consolidate;
pub mod export;
pub mod post;
pub mod render;
pub mod rows;

pub use consolidate::{consolidate, consolidate_with, ConsolidateOptions, SolutionInputs};
pub use export::{TableWriter, WriterRegistry};
pub use post::{Cell, ConsolidatedRow, ConsolidatedTable, COLUMNS, PLACEHOLDER};
pub use rows::SolutionType;
