//! Integration tests for solution consolidation
//!
//! Covers row ordering, provenance columns, filtering, rounding, placeholder
//! handling, input validation and export.

use qcr_common::{
    CaseEntry, Error, InclCovTable, IntermediateSolution, MembershipMatrix, ModelBundle,
    PiStatistics, SolutionAggregate, SolutionObject,
};
use qcr_cs::{
    consolidate, consolidate_with, Cell, ConsolidateOptions, SolutionInputs, SolutionType,
    WriterRegistry,
};
use serde_json::json;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn quiet() -> ConsolidateOptions {
    ConsolidateOptions::default().verbose(false)
}

fn model(terms: &[(&str, f64)], aggregate: f64) -> ModelBundle {
    let rows = terms
        .iter()
        .map(|&(term, incl)| PiStatistics::new(term, incl, incl - 0.1, 0.4, 0.1))
        .collect();
    ModelBundle::new(
        InclCovTable::new(rows),
        SolutionAggregate::new(aggregate, aggregate - 0.1, 0.6),
        None,
    )
}

fn single(terms: &[(&str, f64)]) -> SolutionObject {
    SolutionObject::SingleModel(model(terms, 0.85))
}

fn intermediate(labels: &[&str]) -> IntermediateSolution {
    let variants: BTreeMap<String, SolutionObject> = labels
        .iter()
        .map(|label| (label.to_string(), single(&[(&format!("PI_{}", label), 0.9)])))
        .collect();
    IntermediateSolution::new(variants)
}

#[test]
fn test_conservative_only_with_incl_cut() {
    let inputs = SolutionInputs {
        c: Some(single(&[("A*B", 0.9), ("~C", 0.75)])),
        ..Default::default()
    };

    let table = consolidate(&inputs, &quiet().incl_cut(0.8)).unwrap();

    assert_eq!(table.len(), 1);
    let row = &table.rows[0];
    assert_eq!(row.solution, SolutionType::Conservative);
    assert_eq!(row.prime_implicants, "A*B");
    assert_eq!(row.consistency_pi, Cell::Value(0.9));
    assert_eq!(row.model.to_string(), "-");
    assert_eq!(row.intermediate_cnpn.to_string(), "-");
}

#[test]
fn test_intermediate_labels_single_model() {
    let inputs = SolutionInputs {
        i: Some(intermediate(&["C1P1", "C2P2"])),
        ..Default::default()
    };

    let table = consolidate(&inputs, &quiet().with_icp(["C1P1", "C2P2"])).unwrap();

    assert_eq!(table.len(), 2);
    let labels: Vec<_> = table.iter().map(|r| r.intermediate_cnpn.to_string()).collect();
    assert_eq!(labels, vec!["C1P1", "C2P2"]);
    for row in &table {
        assert_eq!(row.solution, SolutionType::Intermediate);
        assert!(row.model.is_placeholder());
    }
}

#[test]
fn test_intermediate_follows_caller_label_order() {
    let inputs = SolutionInputs {
        i: Some(intermediate(&["C1P1", "C2P1", "C3P1"])),
        ..Default::default()
    };

    let table = consolidate(&inputs, &quiet().with_icp(["C3P1", "C1P1"])).unwrap();

    let terms: Vec<_> = table.iter().map(|r| r.prime_implicants.as_str()).collect();
    assert_eq!(terms, vec!["PI_C3P1", "PI_C1P1"]);
}

#[test]
fn test_unknown_label_fails_without_table() {
    let inputs = SolutionInputs {
        c: Some(single(&[("A", 0.9)])),
        i: Some(intermediate(&["C1P1", "C2P2"])),
        ..Default::default()
    };

    let result = consolidate(&inputs, &quiet().with_icp(["C1P1", "C9P9"]));

    match result {
        Err(Error::UnknownLabel(label)) => assert_eq!(label, "C9P9"),
        other => panic!("Expected UnknownLabel, got {:?}", other),
    }
}

#[test]
fn test_unknown_label_does_not_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.csv");
    let inputs = SolutionInputs {
        i: Some(intermediate(&["C1P1"])),
        ..Default::default()
    };

    let result = consolidate(&inputs, &quiet().with_icp(["C1P1", "C9P9"]).save(&path));

    assert!(result.is_err());
    assert!(!path.exists());
}

#[test]
fn test_intermediate_without_icp_is_missing_parameter() {
    let inputs = SolutionInputs {
        i: Some(intermediate(&["C1P1"])),
        ..Default::default()
    };

    let err = consolidate(&inputs, &quiet()).unwrap_err();
    assert!(matches!(err, Error::MissingParameter(_)), "got {:?}", err);
}

#[test]
fn test_row_order_across_solution_types() {
    let inputs = SolutionInputs {
        c: Some(SolutionObject::MultiModel(vec![
            model(&[("c1a", 0.9), ("c1b", 0.8)], 0.9),
            model(&[("c2a", 0.9)], 0.8),
        ])),
        i: Some(intermediate(&["C1P1", "C2P1"])),
        p: Some(SolutionObject::MultiModel(vec![
            model(&[("p1a", 0.95)], 0.95),
            model(&[("p2a", 0.7)], 0.7),
        ])),
    };

    let table = consolidate(&inputs, &quiet().with_icp(["C2P1", "C1P1"])).unwrap();

    let summary: Vec<_> = table
        .iter()
        .map(|r| {
            (
                r.solution.label(),
                r.model.to_string(),
                r.intermediate_cnpn.to_string(),
                r.prime_implicants.as_str(),
            )
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            ("Conservative", "1".to_string(), "-".to_string(), "c1a"),
            ("Conservative", "1".to_string(), "-".to_string(), "c1b"),
            ("Conservative", "2".to_string(), "-".to_string(), "c2a"),
            ("Parsimonious", "1".to_string(), "-".to_string(), "p1a"),
            ("Parsimonious", "2".to_string(), "-".to_string(), "p2a"),
            ("Intermediate", "-".to_string(), "C2P1".to_string(), "PI_C2P1"),
            ("Intermediate", "-".to_string(), "C1P1".to_string(), "PI_C1P1"),
        ]
    );

    let indices: Vec<_> = table.iter().map(|r| r.index).collect();
    assert_eq!(indices, (1..=7).collect::<Vec<_>>());
}

#[test]
fn test_multi_model_intermediate_sets_both_tags() {
    let mut variants = BTreeMap::new();
    variants.insert(
        "C1P2".to_string(),
        SolutionObject::MultiModel(vec![model(&[("a", 0.9)], 0.9), model(&[("b", 0.9)], 0.8)]),
    );
    let inputs = SolutionInputs {
        i: Some(IntermediateSolution::new(variants)),
        ..Default::default()
    };

    let table = consolidate(&inputs, &quiet().with_icp(["C1P2"])).unwrap();

    assert_eq!(table.rows[0].model, Cell::Value(1));
    assert_eq!(table.rows[1].model, Cell::Value(2));
    assert!(table.iter().all(|r| r.intermediate_cnpn == Cell::Value("C1P2".to_string())));
    assert_eq!(table.rows[1].solution_consistency, Cell::Value(0.8));
}

#[test]
fn test_aggregate_columns_survive_filtering() {
    let inputs = SolutionInputs {
        p: Some(single(&[("A", 0.95), ("B", 0.6), ("C", 0.85)])),
        ..Default::default()
    };

    let table = consolidate(&inputs, &quiet().incl_cut(0.85)).unwrap();

    assert_eq!(table.len(), 2);
    for row in &table {
        assert_eq!(row.solution_consistency, Cell::Value(0.85));
        assert_eq!(row.solution_coverage, Cell::Value(0.6));
    }
}

#[test]
fn test_no_inputs_gives_empty_table() {
    let table = consolidate(&SolutionInputs::default(), &quiet().round(2)).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.columns(), &qcr_cs::COLUMNS);
}

#[test]
fn test_rounding_all_numeric_columns() {
    let inputs = SolutionInputs {
        c: Some(SolutionObject::SingleModel(ModelBundle::new(
            InclCovTable::new(vec![PiStatistics::new("A", 0.91666, 0.83333, 0.41234, 0.0049)]),
            SolutionAggregate::new(0.87654, 0.76543, 0.65432),
            None,
        ))),
        ..Default::default()
    };

    let table = consolidate(&inputs, &quiet().round(2)).unwrap();

    let values: Vec<_> = table.rows[0]
        .numeric()
        .iter()
        .map(|cell| *cell.value().unwrap())
        .collect();
    assert_eq!(values, vec![0.92, 0.83, 0.41, 0.0, 0.88, 0.77, 0.65]);
}

#[test]
fn test_missing_statistics_become_placeholders() {
    let mut stats = PiStatistics::new("A", 0.9, 0.8, 0.5, 0.2);
    stats.pri = None;
    let inputs = SolutionInputs {
        c: Some(SolutionObject::SingleModel(ModelBundle::new(
            InclCovTable::new(vec![stats]),
            SolutionAggregate {
                incl: Some(0.9),
                pri: None,
                cov: Some(0.5),
            },
            None,
        ))),
        ..Default::default()
    };

    let table = consolidate(&inputs, &quiet().round(1)).unwrap();
    let cells = table.rows[0].cells();

    assert_eq!(cells[5], "-");
    assert_eq!(cells[9], "-");
    assert!(cells.iter().all(|cell| !cell.is_empty()));
}

#[test]
fn test_cases_from_matrix_and_inline_agree() {
    let inline = SolutionObject::SingleModel(ModelBundle::new(
        InclCovTable::new(vec![PiStatistics::new("P1", 0.9, 0.8, 0.5, 0.2)
            .with_cases(CaseEntry::Identifiers(vec!["A".into(), "B".into()]))]),
        SolutionAggregate::new(0.9, 0.8, 0.5),
        None,
    ));
    let matrix = SolutionObject::SingleModel(ModelBundle::new(
        InclCovTable::new(vec![PiStatistics::new("P1", 0.9, 0.8, 0.5, 0.2)]),
        SolutionAggregate::new(0.9, 0.8, 0.5),
        Some(MembershipMatrix::new(
            vec!["A".into(), "B".into(), "C".into()],
            vec!["P1".into(), "P2".into()],
            vec![vec![0.8, 0.0], vec![0.5, 1.0], vec![0.2, 1.0]],
        )),
    ));

    let table = consolidate(
        &SolutionInputs {
            c: Some(inline),
            p: Some(matrix),
            ..Default::default()
        },
        &quiet(),
    )
    .unwrap();

    assert_eq!(table.rows[0].cases, Cell::Value("A, B".to_string()));
    assert_eq!(table.rows[0].cases, table.rows[1].cases);
}

#[test]
fn test_consolidation_is_repeatable() {
    let inputs = SolutionInputs {
        c: Some(single(&[("A", 0.9), ("B", 0.7)])),
        i: Some(intermediate(&["C1P1"])),
        p: Some(single(&[("A", 0.9)])),
    };
    let options = quiet().with_icp(["C1P1"]).round(3);

    let first = consolidate(&inputs, &options).unwrap();
    let second = consolidate(&inputs, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_invalid_structure_names_parameter() {
    let inputs = SolutionInputs {
        p: Some(SolutionObject::MultiModel(Vec::new())),
        ..Default::default()
    };

    let err = consolidate(&inputs, &quiet()).unwrap_err();
    match err {
        Error::InvalidInput { param, .. } => assert_eq!(param, "p"),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
}

#[test]
fn test_json_inputs_end_to_end() {
    let c = json!({
        "individual": [
            {
                "incl.cov": [
                    {"term": "A*B", "inclS": 0.912, "PRI": 0.871, "covS": 0.5, "covU": 0.2}
                ],
                "sol.incl.cov": {"inclS": 0.912, "PRI": 0.871, "covS": 0.5},
                "pims": {"cases": ["x", "y"], "terms": ["A*B"], "scores": [[0.7], [0.3]]}
            },
            {
                "incl.cov": [
                    {"term": "A*~C", "inclS": 0.88, "PRI": 0.8, "covS": 0.45, "covU": 0.15,
                     "cases": "y"}
                ],
                "sol.incl.cov": {"inclS": 0.88, "PRI": 0.8, "covS": 0.45}
            }
        ]
    });
    let i = json!({
        "i.sol": {
            "C1P1": {
                "incl.cov": [{"term": "A", "inclS": 0.95, "PRI": 0.9, "covS": 0.6, "covU": 0.6}],
                "sol.incl.cov": {"inclS": 0.95, "PRI": 0.9, "covS": 0.6}
            }
        }
    });

    let inputs = SolutionInputs::from_json(Some(c), Some(i), None).unwrap();
    let table = consolidate(&inputs, &quiet().with_icp(["C1P1"]).round(2)).unwrap();

    let cells: Vec<_> = table.iter().map(|r| r.cells()).collect();
    assert_eq!(cells.len(), 3);
    assert_eq!(
        cells[0],
        ["Conservative", "1", "-", "A*B", "0.91", "0.87", "0.5", "0.2", "0.91", "0.87", "0.5", "x"]
            .map(String::from)
    );
    assert_eq!(cells[1][1], "2");
    assert_eq!(cells[1][11], "y");
    assert_eq!(cells[2][0], "Intermediate");
    assert_eq!(cells[2][2], "C1P1");
    assert_eq!(cells[2][11], "-");
}

#[test]
fn test_json_input_rejects_unrecognized_object() {
    let err = SolutionInputs::from_json(None, None, Some(json!({"tt": []}))).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { ref param, .. } if param == "p"));

    let err = SolutionInputs::from_json(Some(json!("not a solution")), None, None).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { ref param, .. } if param == "c"));
}

#[test]
fn test_save_writes_returned_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("solutions.csv");
    let inputs = SolutionInputs {
        c: Some(single(&[("A", 0.9), ("B", 0.8)])),
        ..Default::default()
    };

    let table = consolidate(&inputs, &quiet().save(&path)).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), qcr_cs::COLUMNS.to_vec());
    let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), table.len());
    for (record, row) in records.iter().zip(&table) {
        assert_eq!(record.iter().collect::<Vec<_>>(), row.cells().to_vec());
    }
}

#[test]
fn test_save_xlsx_writes_one_sheet() {
    use calamine::{open_workbook, Data, Reader, Xlsx};

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("solutions.xlsx");
    let inputs = SolutionInputs {
        c: Some(single(&[("A", 0.9), ("B", 0.8)])),
        p: Some(single(&[("A", 0.9)])),
        ..Default::default()
    };

    let table = consolidate(&inputs, &quiet().round(2).save(&path)).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(workbook.sheet_names().len(), 1);
    let sheet = workbook.sheet_names()[0].clone();
    let range = workbook.worksheet_range(&sheet).unwrap();
    let rows: Vec<_> = range.rows().collect();

    assert_eq!(rows.len(), table.len() + 1);
    assert_eq!(rows[0][0], Data::String("Solution".into()));
    assert_eq!(rows[3][0], Data::String("Parsimonious".into()));
    assert_eq!(rows[1][3], Data::String("A".into()));
    assert_eq!(rows[1][4], Data::Float(0.9));
    assert_eq!(rows[2][1], Data::String("-".into()));
}

#[test]
fn test_non_finite_statistic_rejected_before_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("solutions.json");
    let mut bundle = model(&[("A", 0.9)], 0.85);
    bundle.incl_cov.rows[0].cov_unique = Some(f64::NAN);
    let inputs = SolutionInputs {
        c: Some(SolutionObject::SingleModel(bundle)),
        ..Default::default()
    };

    let err = consolidate(&inputs, &quiet().save(&path)).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { ref param, .. } if param == "c"), "got {:?}", err);
    assert!(!path.exists());
}

#[test]
fn test_save_without_writer_is_fatal() {
    let dir = TempDir::new().unwrap();
    let inputs = SolutionInputs {
        c: Some(single(&[("A", 0.9)])),
        ..Default::default()
    };

    let err = consolidate(&inputs, &quiet().save(dir.path().join("out.ods"))).unwrap_err();
    assert!(matches!(err, Error::ExportUnavailable(_)), "got {:?}", err);

    let err = consolidate_with(
        &inputs,
        &quiet().save(dir.path().join("out.csv")),
        &WriterRegistry::empty(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ExportUnavailable(_)), "got {:?}", err);
}

#[test]
fn test_save_to_unwritable_path_is_fatal() {
    let dir = TempDir::new().unwrap();
    let inputs = SolutionInputs {
        c: Some(single(&[("A", 0.9)])),
        ..Default::default()
    };

    let err = consolidate(&inputs, &quiet().save(dir.path().join("no/such/dir/out.csv"))).unwrap_err();
    assert!(matches!(err, Error::ExportWrite { .. }), "got {:?}", err);
}
