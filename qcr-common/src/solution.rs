//! Minimization result model
//!
//! Typed view of the objects produced by an external QCA minimization engine.
//! The engine hands over JSON documents shaped like its native result objects:
//!
//! ```json
//! {
//!   "incl.cov": [
//!     { "term": "A*B", "inclS": 0.91, "PRI": 0.85, "covS": 0.52, "covU": 0.12,
//!       "cases": ["ARG", "BRA"] }
//!   ],
//!   "sol.incl.cov": { "inclS": 0.9, "PRI": 0.84, "covS": 0.61 },
//!   "pims": { "cases": ["ARG", "BRA", "CHL"], "terms": ["A*B"],
//!             "scores": [[0.8], [0.6], [0.2]] }
//! }
//! ```
//!
//! A result with several equally good models carries them in an `individual`
//! array of the same per-model shape. Intermediate results are a mapping under
//! `i.sol` from a CnPn label to one such object.
//!
//! Shape detection happens once, in [`SolutionObject::from_raw`]. Everything
//! downstream matches on [`SolutionObject`] instead of probing fields.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Membership score at or above which a case belongs to a prime implicant
pub const MEMBERSHIP_THRESHOLD: f64 = 0.5;

/// One `cases` cell of an `incl.cov` table
///
/// Only two shapes are accepted: a list of case identifiers, or a single
/// preformatted label. Numbers, objects and nested lists are rejected when
/// the document is decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaseEntry {
    /// Case identifiers, joined with ", " for display
    Identifiers(Vec<String>),
    /// Preformatted label, used verbatim
    Label(String),
}

impl CaseEntry {
    /// Display form of the entry, `None` when it names no case at all
    pub fn render(&self) -> Option<String> {
        let rendered = match self {
            CaseEntry::Identifiers(ids) => ids.join(", "),
            CaseEntry::Label(label) => label.clone(),
        };
        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }
}

/// Per prime implicant statistics, one row of `incl.cov`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiStatistics {
    /// Prime implicant expression (row identifier)
    pub term: String,
    /// Inclusion (consistency) score
    #[serde(rename = "inclS", default)]
    pub incl: Option<f64>,
    /// Proportional reduction in inconsistency
    #[serde(rename = "PRI", default)]
    pub pri: Option<f64>,
    /// Raw coverage
    #[serde(rename = "covS", default)]
    pub cov_raw: Option<f64>,
    /// Unique coverage
    #[serde(rename = "covU", default)]
    pub cov_unique: Option<f64>,
    /// Inline case membership, when the engine was asked to report it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cases: Option<CaseEntry>,
}

impl PiStatistics {
    /// Statistics row with every score present and no inline cases
    pub fn new(term: impl Into<String>, incl: f64, pri: f64, cov_raw: f64, cov_unique: f64) -> Self {
        Self {
            term: term.into(),
            incl: Some(incl),
            pri: Some(pri),
            cov_raw: Some(cov_raw),
            cov_unique: Some(cov_unique),
            cases: None,
        }
    }

    /// Attach inline case membership
    pub fn with_cases(mut self, cases: CaseEntry) -> Self {
        self.cases = Some(cases);
        self
    }

    fn scores(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("inclS", self.incl),
            ("PRI", self.pri),
            ("covS", self.cov_raw),
            ("covU", self.cov_unique),
        ]
    }
}

/// The `incl.cov` table of one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InclCovTable {
    pub rows: Vec<PiStatistics>,
}

impl InclCovTable {
    pub fn new(rows: Vec<PiStatistics>) -> Self {
        Self { rows }
    }

    /// True when the table carries a cases column
    ///
    /// The engine emits the column for every row or for none; a table where
    /// only some rows have it is still treated as carrying the column.
    pub fn has_cases(&self) -> bool {
        self.rows.iter().any(|row| row.cases.is_some())
    }

    /// Prime implicant identifiers in table order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.term.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Solution level statistics, the `sol.incl.cov` record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionAggregate {
    #[serde(rename = "inclS", default)]
    pub incl: Option<f64>,
    #[serde(rename = "PRI", default)]
    pub pri: Option<f64>,
    #[serde(rename = "covS", default)]
    pub cov: Option<f64>,
}

impl SolutionAggregate {
    fn scores(&self) -> [(&'static str, Option<f64>); 3] {
        [("inclS", self.incl), ("PRI", self.pri), ("covS", self.cov)]
    }

    pub fn new(incl: f64, pri: f64, cov: f64) -> Self {
        Self {
            incl: Some(incl),
            pri: Some(pri),
            cov: Some(cov),
        }
    }
}

/// Case by prime implicant membership scores (`pims`)
///
/// `scores[row][col]` is the membership of `cases[row]` in `terms[col]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembershipMatrix {
    pub cases: Vec<String>,
    pub terms: Vec<String>,
    pub scores: Vec<Vec<f64>>,
}

impl MembershipMatrix {
    pub fn new(cases: Vec<String>, terms: Vec<String>, scores: Vec<Vec<f64>>) -> Self {
        Self {
            cases,
            terms,
            scores,
        }
    }

    /// Column index of a prime implicant
    pub fn column(&self, term: &str) -> Option<usize> {
        self.terms.iter().position(|t| t == term)
    }

    /// Cases whose membership in column `col` reaches [`MEMBERSHIP_THRESHOLD`]
    pub fn members(&self, col: usize) -> Vec<&str> {
        self.cases
            .iter()
            .zip(&self.scores)
            .filter(|(_, row)| row.get(col).is_some_and(|&score| score >= MEMBERSHIP_THRESHOLD))
            .map(|(case, _)| case.as_str())
            .collect()
    }

    fn validate(&self, param: &str) -> Result<()> {
        if self.scores.len() != self.cases.len() {
            return Err(Error::invalid_input(
                param,
                format!(
                    "membership matrix has {} case labels but {} score rows",
                    self.cases.len(),
                    self.scores.len()
                ),
            ));
        }
        if let Some((idx, row)) = self
            .scores
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.terms.len())
        {
            return Err(Error::invalid_input(
                param,
                format!(
                    "membership row '{}' has {} scores, expected {}",
                    self.cases[idx],
                    row.len(),
                    self.terms.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Everything the engine reports about one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    #[serde(rename = "incl.cov")]
    pub incl_cov: InclCovTable,
    #[serde(rename = "sol.incl.cov", default)]
    pub sol_incl_cov: SolutionAggregate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pims: Option<MembershipMatrix>,
}

impl ModelBundle {
    pub fn new(
        incl_cov: InclCovTable,
        sol_incl_cov: SolutionAggregate,
        pims: Option<MembershipMatrix>,
    ) -> Self {
        Self {
            incl_cov,
            sol_incl_cov,
            pims,
        }
    }

    fn validate(&self, param: &str) -> Result<()> {
        if let Some(pos) = self.incl_cov.rows.iter().position(|row| row.term.trim().is_empty()) {
            return Err(Error::invalid_input(
                param,
                format!("incl.cov row {} has an empty prime implicant", pos + 1),
            ));
        }
        // Missing scores are `None`, never NaN
        for row in &self.incl_cov.rows {
            if let Some((column, value)) = non_finite(&row.scores()) {
                return Err(Error::invalid_input(
                    param,
                    format!("incl.cov '{}' has non-finite {} ({})", row.term, column, value),
                ));
            }
        }
        if let Some((column, value)) = non_finite(&self.sol_incl_cov.scores()) {
            return Err(Error::invalid_input(
                param,
                format!("sol.incl.cov has non-finite {} ({})", column, value),
            ));
        }
        if let Some(pims) = &self.pims {
            pims.validate(param)?;
        }
        Ok(())
    }
}

fn non_finite(scores: &[(&'static str, Option<f64>)]) -> Option<(&'static str, f64)> {
    scores.iter().find_map(|&(column, value)| match value {
        Some(v) if !v.is_finite() => Some((column, v)),
        _ => None,
    })
}

/// Upstream document as decoded, before shape detection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSolution {
    #[serde(rename = "incl.cov", default)]
    pub incl_cov: Option<InclCovTable>,
    #[serde(rename = "sol.incl.cov", default)]
    pub sol_incl_cov: Option<SolutionAggregate>,
    #[serde(default)]
    pub pims: Option<MembershipMatrix>,
    #[serde(default)]
    pub individual: Option<Vec<ModelBundle>>,
}

/// A conservative or parsimonious minimization result, or one intermediate
/// variant
#[derive(Debug, Clone, PartialEq)]
pub enum SolutionObject {
    /// Exactly one model was found
    SingleModel(ModelBundle),
    /// Several models, in engine order (model 1 first)
    MultiModel(Vec<ModelBundle>),
}

impl SolutionObject {
    /// Detect the shape of a decoded upstream document
    ///
    /// An `individual` collection marks a multi-model result even when
    /// top level `incl.cov` fields are also present.
    pub fn from_raw(param: &str, raw: RawSolution) -> Result<Self> {
        let solution = match (raw.individual, raw.incl_cov) {
            (Some(models), _) => SolutionObject::MultiModel(models),
            (None, Some(incl_cov)) => SolutionObject::SingleModel(ModelBundle {
                incl_cov,
                sol_incl_cov: raw.sol_incl_cov.unwrap_or_default(),
                pims: raw.pims,
            }),
            (None, None) => {
                return Err(Error::invalid_input(
                    param,
                    "not a minimization result (neither 'individual' nor 'incl.cov' present)",
                ))
            }
        };
        solution.validate(param)?;
        Ok(solution)
    }

    /// Decode and validate an upstream JSON document
    pub fn from_json(param: &str, value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::invalid_input(param, "expected a JSON object"));
        }
        let raw: RawSolution = serde_json::from_value(value)
            .map_err(|e| Error::invalid_input(param, e.to_string()))?;
        Self::from_raw(param, raw)
    }

    /// Structural checks that do not depend on statistic values
    pub fn validate(&self, param: &str) -> Result<()> {
        match self {
            SolutionObject::SingleModel(model) => model.validate(param),
            SolutionObject::MultiModel(models) => {
                if models.is_empty() {
                    return Err(Error::invalid_input(param, "'individual' holds no models"));
                }
                models.iter().try_for_each(|model| model.validate(param))
            }
        }
    }

    /// Number of models in the result
    pub fn model_count(&self) -> usize {
        match self {
            SolutionObject::SingleModel(_) => 1,
            SolutionObject::MultiModel(models) => models.len(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawIntermediate {
    #[serde(rename = "i.sol")]
    i_sol: BTreeMap<String, serde_json::Value>,
}

/// Intermediate minimization result keyed by CnPn label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntermediateSolution {
    pub variants: BTreeMap<String, SolutionObject>,
}

impl IntermediateSolution {
    pub fn new(variants: BTreeMap<String, SolutionObject>) -> Self {
        Self { variants }
    }

    /// Decode an `{"i.sol": {"C1P1": {...}}}` document
    pub fn from_json(param: &str, value: serde_json::Value) -> Result<Self> {
        let raw: RawIntermediate = serde_json::from_value(value).map_err(|e| {
            Error::invalid_input(param, format!("not an intermediate minimization result: {}", e))
        })?;

        let variants = raw
            .i_sol
            .into_iter()
            .map(|(label, doc)| {
                let context = format!("{}[{}]", param, label);
                SolutionObject::from_json(&context, doc).map(|solution| (label, solution))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self { variants })
    }

    pub fn get(&self, label: &str) -> Option<&SolutionObject> {
        self.variants.get(label)
    }

    /// Available CnPn labels in sorted order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    pub fn validate(&self, param: &str) -> Result<()> {
        self.variants
            .iter()
            .try_for_each(|(label, solution)| solution.validate(&format!("{}[{}]", param, label)))
    }
}
