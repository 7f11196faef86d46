//! Solution consolidation
//!
//! Merges the conservative, parsimonious and intermediate minimization
//! results into one [`ConsolidatedTable`]. Row order is fixed: conservative
//! rows, then parsimonious rows, then intermediate rows grouped by CnPn label
//! in the order the caller listed the labels. Within each group rows follow
//! model order, then `incl.cov` order.
//!
//! Every input check runs before the first row is built, so a failing call
//! never leaves partial output behind.

use crate::cases::{case_source, reconstruct_cases};
use crate::export::WriterRegistry;
use crate::post::{post_process, ConsolidatedTable};
use crate::rows::{build_rows, DraftRow, RowTags, SolutionType};
use qcr_common::{Error, IntermediateSolution, ModelBundle, Result, SolutionObject};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// The three optional minimization results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionInputs {
    /// Conservative solution
    pub c: Option<SolutionObject>,
    /// Intermediate solutions keyed by CnPn label
    pub i: Option<IntermediateSolution>,
    /// Parsimonious solution
    pub p: Option<SolutionObject>,
}

impl SolutionInputs {
    /// Decode upstream JSON documents, naming the parameter that fails
    pub fn from_json(
        c: Option<serde_json::Value>,
        i: Option<serde_json::Value>,
        p: Option<serde_json::Value>,
    ) -> Result<Self> {
        Ok(Self {
            c: c.map(|doc| SolutionObject::from_json("c", doc)).transpose()?,
            i: i.map(|doc| IntermediateSolution::from_json("i", doc)).transpose()?,
            p: p.map(|doc| SolutionObject::from_json("p", doc)).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.c.is_none() && self.i.is_none() && self.p.is_none()
    }
}

/// Options controlling one consolidation run
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidateOptions {
    /// CnPn labels to include, required when an intermediate input is given
    pub icp: Option<Vec<String>>,
    /// Emit progress notices at info level
    pub verbose: bool,
    /// Export destination
    pub save: Option<PathBuf>,
    /// Decimal places for numeric columns
    pub round: Option<u32>,
    /// Minimum Consistency_PI a row must reach
    pub incl_cut: Option<f64>,
}

impl Default for ConsolidateOptions {
    fn default() -> Self {
        Self {
            icp: None,
            verbose: true,
            save: None,
            round: None,
            incl_cut: None,
        }
    }
}

impl ConsolidateOptions {
    pub fn with_icp<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.icp = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn save(mut self, path: impl Into<PathBuf>) -> Self {
        self.save = Some(path.into());
        self
    }

    pub fn round(mut self, digits: u32) -> Self {
        self.round = Some(digits);
        self
    }

    pub fn incl_cut(mut self, cut: f64) -> Self {
        self.incl_cut = Some(cut);
        self
    }
}

/// Progress notices, advisory only
struct Progress {
    verbose: bool,
}

impl Progress {
    fn notice(&self, message: &str) {
        if self.verbose {
            info!(target: "qcr_cs::progress", "{}", message);
        } else {
            debug!(target: "qcr_cs::progress", "{}", message);
        }
    }
}

/// Consolidate with the default export formats
pub fn consolidate(
    inputs: &SolutionInputs,
    options: &ConsolidateOptions,
) -> Result<ConsolidatedTable> {
    consolidate_with(inputs, options, &WriterRegistry::default())
}

/// Consolidate, exporting through `writers` when `options.save` is set
pub fn consolidate_with(
    inputs: &SolutionInputs,
    options: &ConsolidateOptions,
    writers: &WriterRegistry,
) -> Result<ConsolidatedTable> {
    let progress = Progress {
        verbose: options.verbose,
    };

    progress.notice("Validating inputs...");
    let labels = validate(inputs, options)?;

    let mut row_sets: Vec<Vec<DraftRow>> = Vec::new();

    if let Some(c) = &inputs.c {
        progress.notice("Processing conservative solution...");
        debug!("Conservative solution has {} model(s)", c.model_count());
        row_sets.extend(solution_rows(SolutionType::Conservative, c, None, options.incl_cut));
    }

    if let Some(p) = &inputs.p {
        progress.notice("Processing parsimonious solution...");
        debug!("Parsimonious solution has {} model(s)", p.model_count());
        row_sets.extend(solution_rows(SolutionType::Parsimonious, p, None, options.incl_cut));
    }

    if let Some(i) = &inputs.i {
        progress.notice("Processing intermediate solutions...");
        for label in labels {
            let solution = i
                .get(label)
                .ok_or_else(|| Error::UnknownLabel(label.to_string()))?;
            row_sets.extend(solution_rows(
                SolutionType::Intermediate,
                solution,
                Some(label.as_str()),
                options.incl_cut,
            ));
        }
    }

    let table = post_process(row_sets, options.round);
    debug!("Consolidated {} rows", table.len());

    if let Some(path) = &options.save {
        progress.notice(&format!("Saving results to {}...", path.display()));
        writers.export(&table, path)?;
    }

    progress.notice("Done.");
    Ok(table)
}

/// Check every input before processing; returns the CnPn labels to emit
fn validate<'a>(inputs: &SolutionInputs, options: &'a ConsolidateOptions) -> Result<&'a [String]> {
    if let Some(c) = &inputs.c {
        c.validate("c")?;
    }
    if let Some(p) = &inputs.p {
        p.validate("p")?;
    }
    if let Some(cut) = options.incl_cut {
        if cut.is_nan() {
            return Err(Error::invalid_input("incl.cut", "threshold is NaN"));
        }
    }

    let Some(i) = &inputs.i else {
        if options.icp.is_some() {
            warn!("'icp' given without an intermediate solution, ignoring it");
        }
        return Ok(&[]);
    };

    i.validate("i")?;
    let labels = options
        .icp
        .as_deref()
        .ok_or_else(|| Error::MissingParameter("icp (required with an intermediate solution)".into()))?;

    if let Some(missing) = labels.iter().find(|label| i.get(label.as_str()).is_none()) {
        debug!(
            "Intermediate labels available: {}",
            i.labels().collect::<Vec<_>>().join(", ")
        );
        return Err(Error::UnknownLabel(missing.clone()));
    }
    Ok(labels)
}

/// Row sets of one solution object, one set per model
fn solution_rows(
    solution_type: SolutionType,
    solution: &SolutionObject,
    cnpn: Option<&str>,
    incl_cut: Option<f64>,
) -> Vec<Vec<DraftRow>> {
    match solution {
        SolutionObject::SingleModel(model) => {
            let tags = RowTags { model: None, cnpn };
            vec![model_rows(solution_type, model, tags, incl_cut)]
        }
        SolutionObject::MultiModel(models) => models
            .iter()
            .enumerate()
            .map(|(idx, model)| {
                let tags = RowTags {
                    model: Some(idx + 1),
                    cnpn,
                };
                model_rows(solution_type, model, tags, incl_cut)
            })
            .collect(),
    }
}

fn model_rows(
    solution_type: SolutionType,
    model: &ModelBundle,
    tags: RowTags<'_>,
    incl_cut: Option<f64>,
) -> Vec<DraftRow> {
    debug!(
        "{} model {:?} {:?}: {} prime implicants, cases from {:?}",
        solution_type,
        tags.model,
        tags.cnpn,
        model.incl_cov.len(),
        case_source(&model.incl_cov)
    );
    let cases = reconstruct_cases(&model.incl_cov, model.pims.as_ref());
    build_rows(
        solution_type,
        &model.incl_cov,
        &model.sol_incl_cov,
        cases,
        tags,
        incl_cut,
    )
}
