//! Case reconstruction
//!
//! Produces the `Cases` column for one model. Engines that were asked to
//! report cases put them inline in `incl.cov`; otherwise the membership
//! matrix is consulted and every case scoring at least
//! [`MEMBERSHIP_THRESHOLD`](qcr_common::solution::MEMBERSHIP_THRESHOLD) in a
//! prime implicant is listed for it. Both paths render identically: case
//! identifiers joined with ", ", or "-" when there are none.

use qcr_common::{CaseEntry, InclCovTable, MembershipMatrix};

/// Rendered form of an empty case set
pub const NO_CASES: &str = "-";

/// Where the case strings of a model came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSource {
    /// `cases` column of `incl.cov`
    Inline,
    /// Recomputed from `pims`
    Matrix,
}

/// Which path [`reconstruct_cases`] takes for this table
pub fn case_source(incl_cov: &InclCovTable) -> CaseSource {
    if incl_cov.has_cases() {
        CaseSource::Inline
    } else {
        CaseSource::Matrix
    }
}

/// One case string per `incl_cov` row, in row order
///
/// On the inline path a row without a cases value yields `None`, which the
/// post-processor renders as the placeholder.
pub fn reconstruct_cases(
    incl_cov: &InclCovTable,
    pims: Option<&MembershipMatrix>,
) -> Vec<Option<String>> {
    match case_source(incl_cov) {
        CaseSource::Inline => incl_cov
            .rows
            .iter()
            .map(|row| row.cases.as_ref().map(render_inline))
            .collect(),
        CaseSource::Matrix => incl_cov
            .terms()
            .map(|term| Some(matrix_cases(term, pims)))
            .collect(),
    }
}

fn render_inline(entry: &CaseEntry) -> String {
    entry.render().unwrap_or_else(|| NO_CASES.to_string())
}

/// Cases of one prime implicant according to the membership matrix
///
/// Only the column named after the term is read, so extra columns in the
/// matrix are ignored. A term with no column has no members.
fn matrix_cases(term: &str, pims: Option<&MembershipMatrix>) -> String {
    let members = pims
        .and_then(|matrix| matrix.column(term).map(|col| matrix.members(col)))
        .unwrap_or_default();

    if members.is_empty() {
        NO_CASES.to_string()
    } else {
        members.join(", ")
    }
}
