//! Row building
//!
//! Turns one model's statistics into draft rows of the consolidated table.
//! Draft rows keep absent values as `None`; they become the "-" placeholder
//! only when the finished table is normalized (see [`crate::post`]).

use qcr_common::{InclCovTable, SolutionAggregate};
use serde::Serialize;
use std::fmt;

/// Which minimization produced a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SolutionType {
    Conservative,
    Intermediate,
    Parsimonious,
}

impl SolutionType {
    pub fn label(&self) -> &'static str {
        match self {
            SolutionType::Conservative => "Conservative",
            SolutionType::Intermediate => "Intermediate",
            SolutionType::Parsimonious => "Parsimonious",
        }
    }
}

impl fmt::Display for SolutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Provenance attached to every row of one model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowTags<'a> {
    /// 1-based model index, only for multi-model results
    pub model: Option<usize>,
    /// CnPn label, only for intermediate results
    pub cnpn: Option<&'a str>,
}

/// One consolidated row before missing-value normalization
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRow {
    pub solution: SolutionType,
    pub model: Option<usize>,
    pub cnpn: Option<String>,
    pub prime_implicant: String,
    pub consistency_pi: Option<f64>,
    pub pri_pi: Option<f64>,
    pub raw_coverage_pi: Option<f64>,
    pub unique_coverage_pi: Option<f64>,
    pub solution_consistency: Option<f64>,
    pub solution_pri: Option<f64>,
    pub solution_coverage: Option<f64>,
    pub cases: Option<String>,
}

impl DraftRow {
    /// Mutable access to every numeric column, in column order
    pub fn numeric_mut(&mut self) -> [&mut Option<f64>; 7] {
        [
            &mut self.consistency_pi,
            &mut self.pri_pi,
            &mut self.raw_coverage_pi,
            &mut self.unique_coverage_pi,
            &mut self.solution_consistency,
            &mut self.solution_pri,
            &mut self.solution_coverage,
        ]
    }
}

/// True when a row with this consistency survives the threshold
///
/// The comparison is inclusive. A row without a consistency score cannot be
/// shown to meet a threshold and is dropped whenever one is set.
pub fn meets_incl_cut(consistency: Option<f64>, incl_cut: Option<f64>) -> bool {
    match incl_cut {
        None => true,
        Some(cut) => consistency.is_some_and(|value| value >= cut),
    }
}

/// Build the rows of one model
///
/// Rows follow the order of `incl_cov`. `cases` holds one entry per
/// `incl_cov` row, as produced by [`crate::cases::reconstruct_cases`].
/// The threshold is applied right after construction; the solution level
/// columns are copied unchanged onto every surviving row.
pub fn build_rows(
    solution: SolutionType,
    incl_cov: &InclCovTable,
    aggregate: &SolutionAggregate,
    cases: Vec<Option<String>>,
    tags: RowTags<'_>,
    incl_cut: Option<f64>,
) -> Vec<DraftRow> {
    debug_assert_eq!(incl_cov.len(), cases.len());

    incl_cov
        .rows
        .iter()
        .zip(cases)
        .map(|(stats, cases)| DraftRow {
            solution,
            model: tags.model,
            cnpn: tags.cnpn.map(str::to_string),
            prime_implicant: stats.term.clone(),
            consistency_pi: stats.incl,
            pri_pi: stats.pri,
            raw_coverage_pi: stats.cov_raw,
            unique_coverage_pi: stats.cov_unique,
            solution_consistency: aggregate.incl,
            solution_pri: aggregate.pri,
            solution_coverage: aggregate.cov,
            cases,
        })
        .filter(|row| meets_incl_cut(row.consistency_pi, incl_cut))
        .collect()
}
