//! Testing utilities for the Formzone workspace
//!
//! A small two-page survey project used across integration tests:
//!
//! - page 1: tick boxes `none`, `x`, `y`; radio group `colour` (`red`,
//!   `blue`); text `name`; integer `age`
//! - page 2: text `school`, `county`; integers `total`, `part_a`, `part_b`
//!
//! The project config wires the rules that exercise these fields and a
//! lookup list of schools.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use formzone_schema::{FieldKind, FieldRecord, ProjectSchema};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PROJECT_CONFIG: &str = r#"{
    "validations": [
        {"strategy": "mutually_exclusive", "field_names": ["none", "x", "y"],
         "params": {"exclusive_field": "none"}},
        {"strategy": "max_tickboxes", "field_names": ["x", "y"], "params": {"max": 1}},
        {"strategy": "match_value_in_lookup", "field_names": ["school", "county"],
         "params": {"lookup_column": 1}},
        {"strategy": "sum_should_equal_total", "field_names": ["total", "part_a", "part_b"]}
    ],
    "lookup_list": "lookup.csv",
    "always_review": ["name"],
    "quick_review": ["name", "school"]
}"#;

pub const LOOKUP_CSV: &str = "school,county\nS1,Cork\nS2,Kerry\n";

pub const QC_COMMENTS: &str = "Illegible\n\nCheck with supervisor\n";

fn record(kind: FieldKind, name: &str, x: i32, y: i32, width: i32, height: i32) -> FieldRecord {
    FieldRecord {
        kind,
        name: name.to_string(),
        x,
        y,
        width,
        height,
        radio_buttons: Vec::new(),
    }
}

/// Page records of the fixture project
#[must_use]
pub fn page_records() -> Vec<Vec<FieldRecord>> {
    let mut colour = record(FieldKind::RadioGroup, "colour", 0, 60, 100, 20);
    colour.radio_buttons = vec![
        record(FieldKind::RadioButton, "red", 0, 60, 20, 20),
        record(FieldKind::RadioButton, "blue", 50, 60, 20, 20),
    ];
    vec![
        vec![
            record(FieldKind::TickBox, "none", 0, 0, 12, 12),
            record(FieldKind::TickBox, "x", 0, 20, 12, 12),
            record(FieldKind::TickBox, "y", 0, 40, 12, 12),
            colour,
            record(FieldKind::TextField, "name", 0, 100, 200, 20),
            record(FieldKind::IntegerField, "age", 0, 130, 40, 20),
        ],
        vec![
            record(FieldKind::TextField, "school", 0, 0, 200, 20),
            record(FieldKind::TextField, "county", 0, 30, 200, 20),
            record(FieldKind::IntegerField, "total", 0, 60, 60, 20),
            record(FieldKind::IntegerField, "part_a", 0, 90, 60, 20),
            record(FieldKind::IntegerField, "part_b", 0, 120, 60, 20),
        ],
    ]
}

/// Fixture schema
#[must_use]
pub fn fixture_schema() -> ProjectSchema {
    ProjectSchema::from_page_records(page_records()).expect("fixture schema is valid")
}

/// Write the fixture project into `dir`
pub fn write_project(dir: &Path) {
    let json = dir.join("json");
    std::fs::create_dir_all(&json).expect("create json dir");
    for (page, records) in (1u32..).zip(page_records()) {
        let text = serde_json::to_string_pretty(&records).expect("encode page");
        std::fs::write(json.join(format!("{page}.json")), text).expect("write page");
    }
    std::fs::write(dir.join("project_config.json"), PROJECT_CONFIG).expect("write config");
    std::fs::write(dir.join("lookup.csv"), LOOKUP_CSV).expect("write lookup");
    std::fs::write(dir.join("qc_comments.txt"), QC_COMMENTS).expect("write presets");
}

/// Fixture project in a fresh temporary directory
///
/// Returns the directory guard and the path of an (absent) batch file in it.
#[must_use]
pub fn temp_project() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_project(dir.path());
    let batch = dir.path().join("batch01.csv");
    (dir, batch)
}
