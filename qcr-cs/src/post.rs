//! Post-processing and the consolidated table
//!
//! Applied once, after every solution type has been turned into row sets:
//! 1. Concatenate the row sets in order
//! 2. Round numeric columns (optional)
//! 3. Replace every missing value with the "-" placeholder
//! 4. Number the rows densely from 1
//!
//! Rounding is round-half-away-from-zero, the behavior of [`f64::round`].

use crate::rows::{DraftRow, SolutionType};
use serde::{Serialize, Serializer};
use std::fmt;

/// Literal that stands in for every missing value
pub const PLACEHOLDER: &str = "-";

/// Column names, in output order
pub const COLUMNS: [&str; 12] = [
    "Solution",
    "Model",
    "Intermediate_CnPn",
    "Prime_Implicants",
    "Consistency_PI",
    "PRI_PI",
    "Raw_Coverage_PI",
    "Unique_Coverage_PI",
    "Solution_Consistency",
    "Solution_PRI",
    "Solution_Coverage",
    "Cases",
];

/// A table cell: a concrete value or the placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<T> {
    Value(T),
    Placeholder,
}

impl<T> Cell<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Cell::Value(value) => Some(value),
            Cell::Placeholder => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Cell::Placeholder)
    }
}

impl<T> From<Option<T>> for Cell<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Placeholder, Cell::Value)
    }
}

impl<T: fmt::Display> fmt::Display for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Value(value) => fmt::Display::fmt(value, f),
            Cell::Placeholder => f.write_str(PLACEHOLDER),
        }
    }
}

impl<T: Serialize> Serialize for Cell<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Value(value) => value.serialize(serializer),
            Cell::Placeholder => serializer.serialize_str(PLACEHOLDER),
        }
    }
}

/// One row of the consolidated report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedRow {
    /// Dense 1-based display index, not part of the exported columns
    #[serde(skip)]
    pub index: usize,
    #[serde(rename = "Solution")]
    pub solution: SolutionType,
    #[serde(rename = "Model")]
    pub model: Cell<usize>,
    #[serde(rename = "Intermediate_CnPn")]
    pub intermediate_cnpn: Cell<String>,
    #[serde(rename = "Prime_Implicants")]
    pub prime_implicants: String,
    #[serde(rename = "Consistency_PI")]
    pub consistency_pi: Cell<f64>,
    #[serde(rename = "PRI_PI")]
    pub pri_pi: Cell<f64>,
    #[serde(rename = "Raw_Coverage_PI")]
    pub raw_coverage_pi: Cell<f64>,
    #[serde(rename = "Unique_Coverage_PI")]
    pub unique_coverage_pi: Cell<f64>,
    #[serde(rename = "Solution_Consistency")]
    pub solution_consistency: Cell<f64>,
    #[serde(rename = "Solution_PRI")]
    pub solution_pri: Cell<f64>,
    #[serde(rename = "Solution_Coverage")]
    pub solution_coverage: Cell<f64>,
    #[serde(rename = "Cases")]
    pub cases: Cell<String>,
}

impl ConsolidatedRow {
    /// Display strings of every column, in [`COLUMNS`] order
    pub fn cells(&self) -> [String; 12] {
        [
            self.solution.to_string(),
            self.model.to_string(),
            self.intermediate_cnpn.to_string(),
            self.prime_implicants.clone(),
            self.consistency_pi.to_string(),
            self.pri_pi.to_string(),
            self.raw_coverage_pi.to_string(),
            self.unique_coverage_pi.to_string(),
            self.solution_consistency.to_string(),
            self.solution_pri.to_string(),
            self.solution_coverage.to_string(),
            self.cases.to_string(),
        ]
    }

    /// Numeric columns, in [`COLUMNS`] order
    pub fn numeric(&self) -> [&Cell<f64>; 7] {
        [
            &self.consistency_pi,
            &self.pri_pi,
            &self.raw_coverage_pi,
            &self.unique_coverage_pi,
            &self.solution_consistency,
            &self.solution_pri,
            &self.solution_coverage,
        ]
    }
}

/// The consolidated report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConsolidatedTable {
    pub rows: Vec<ConsolidatedRow>,
}

impl ConsolidatedTable {
    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConsolidatedRow> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a ConsolidatedTable {
    type Item = &'a ConsolidatedRow;
    type IntoIter = std::slice::Iter<'a, ConsolidatedRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Join row sets into one buffer sized up front
pub fn concatenate(row_sets: Vec<Vec<DraftRow>>) -> Vec<DraftRow> {
    let total = row_sets.iter().map(Vec::len).sum();
    let mut rows = Vec::with_capacity(total);
    for set in row_sets {
        rows.extend(set);
    }
    rows
}

/// Round to `digits` decimal places, half away from zero
///
/// Values already finer than the scale can represent are returned as is,
/// which keeps repeated rounding stable.
pub fn round_to(value: f64, digits: u32) -> f64 {
    const EXACT_LIMIT: f64 = 4_503_599_627_370_496.0; // 2^52

    let factor = 10f64.powi(digits.min(i32::MAX as u32) as i32);
    let scaled = value * factor;
    if !value.is_finite() || !scaled.is_finite() || scaled.abs() >= EXACT_LIMIT {
        return value;
    }
    // `+ 0.0` folds -0.0 into 0.0
    (scaled.round() / factor) + 0.0
}

/// Round every numeric column in place
pub fn round_numeric(rows: &mut [DraftRow], digits: u32) {
    for row in rows {
        for value in row.numeric_mut() {
            if let Some(v) = value {
                *v = round_to(*v, digits);
            }
        }
    }
}

/// Replace missing values with the placeholder and number the rows
pub fn normalize(rows: Vec<DraftRow>) -> ConsolidatedTable {
    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| ConsolidatedRow {
            index: idx + 1,
            solution: row.solution,
            model: row.model.into(),
            intermediate_cnpn: row.cnpn.into(),
            prime_implicants: row.prime_implicant,
            consistency_pi: row.consistency_pi.into(),
            pri_pi: row.pri_pi.into(),
            raw_coverage_pi: row.raw_coverage_pi.into(),
            unique_coverage_pi: row.unique_coverage_pi.into(),
            solution_consistency: row.solution_consistency.into(),
            solution_pri: row.solution_pri.into(),
            solution_coverage: row.solution_coverage.into(),
            cases: row.cases.filter(|c| !c.is_empty()).into(),
        })
        .collect();

    ConsolidatedTable { rows }
}

/// Full post-processing pipeline
pub fn post_process(row_sets: Vec<Vec<DraftRow>>, round: Option<u32>) -> ConsolidatedTable {
    let mut rows = concatenate(row_sets);
    if let Some(digits) = round {
        round_numeric(&mut rows, digits);
    }
    normalize(rows)
}
