//! # QCR Common Library
//!
//! Shared code for the QCA solution consolidation tools including:
//! - Error types
//! - Upstream minimization result model (conservative, intermediate and
//!   parsimonious solution objects)
//! - Configuration loading

pub mod config;
pub mod error;
pub mod solution;

pub use error::{Error, Result};
pub use solution::{
    CaseEntry, InclCovTable, IntermediateSolution, MembershipMatrix, ModelBundle, PiStatistics,
    SolutionAggregate, SolutionObject,
};
