//! End-to-end dataset validation tests

mod common;

use hed_core::{DatasetValidator, HedEntry, HedFile, SchemaDocument, SchemaIndex, ValidatorConfig};

fn sidecar(path: &str, entries: &[(&str, &str)]) -> HedFile {
    HedFile::sidecar(
        path,
        entries
            .iter()
            .map(|(key, text)| HedEntry::new(*text).with_sidecar_key(*key))
            .collect(),
    )
}

fn events(path: &str, rows: &[&str]) -> HedFile {
    HedFile::tabular(
        path,
        rows.iter()
            .enumerate()
            .map(|(index, text)| HedEntry::new(*text).with_tsv_line(index + 2))
            .collect(),
    )
}

#[test]
fn test_valid_dataset() {
    let schema = common::schema();
    let files = vec![
        sidecar(
            "task-look_events.json",
            &[
                ("defs", "(Definition/Cue, (Sensory-event, Red)), (Definition/Count/#, (Item-count/#))"),
                ("trial", "Label/#, Def/Cue"),
            ],
        ),
        events(
            "sub-01_task-look_events.tsv",
            &["Def/Count/3, Agent/Human", "(Def-expand/Cue, (Red, Sensory-event))"],
        ),
    ];

    let result = DatasetValidator::new(&schema, ValidatorConfig::default()).validate(&files);
    assert!(result.issues.is_empty(), "{:?}", result.issues);
    assert_eq!(result.definitions.len(), 2);
    assert_eq!(result.files.len(), 2);
    assert!(result.files[1].referenced_definitions.contains("count"));
}

#[test]
fn test_identical_redeclarations_merge_across_sidecars() {
    let schema = common::schema();
    let files = vec![
        sidecar("a.json", &[("defs", "(Definition/Cue, (Sensory-event))")]),
        sidecar("b.json", &[("defs", "(Definition/cue, (Event/Sensory-event))")]),
        events("c.tsv", &["Def/Cue"]),
    ];

    let result = DatasetValidator::new(&schema, ValidatorConfig::default()).validate(&files);
    assert!(result.issues.is_empty(), "{:?}", result.issues);
    assert_eq!(result.definitions.len(), 1);
}

#[test]
fn test_conflicting_redeclarations_are_reported() {
    let schema = common::schema();
    let files = vec![
        sidecar("a.json", &[("defs", "(Definition/Cue, (Sensory-event))")]),
        sidecar("b.json", &[("defs", "(Definition/Cue, (Agent-action))")]),
        events("c.tsv", &["Def/Cue"]),
    ];

    let result = DatasetValidator::new(&schema, ValidatorConfig::default()).validate(&files);
    assert_eq!(common::codes(&result.issues), vec!["duplicateDefinition"]);
    assert_eq!(result.issues[0].parameters().get("filePath"), Some("b.json"));
    assert_eq!(result.issues[0].parameters().get("sidecarKey"), Some("defs"));
}

#[test]
fn test_definition_contents_are_validated() {
    let schema = common::schema();
    let files = vec![
        sidecar(
            "a.json",
            &[("defs", "(Definition/Bad, (Item-count/abc, Sensory-presentation))")],
        ),
        events("b.tsv", &["Def/Bad"]),
    ];

    let result = DatasetValidator::new(&schema, ValidatorConfig::default()).validate(&files);
    assert_eq!(
        common::codes(&result.issues),
        vec!["invalidValue", "childRequired"]
    );
    assert!(
        result
            .issues
            .iter()
            .all(|issue| issue.parameters().get("filePath") == Some("a.json"))
    );
}

#[test]
fn test_unused_definitions_warn() {
    let schema = common::schema();
    let files = vec![
        sidecar("a.json", &[("defs", "(Definition/Used, (Red)), (Definition/Idle, (Red))")]),
        events("b.tsv", &["Def/Used"]),
    ];

    let result = DatasetValidator::new(&schema, ValidatorConfig::default()).validate(&files);
    assert_eq!(common::codes(&result.issues), vec!["unusedDefinition"]);
    assert!(result.issues[0].is_warning());
    assert!(!result.has_errors());

    let config = ValidatorConfig {
        check_warnings: false,
        ..Default::default()
    };
    let result = DatasetValidator::new(&schema, config).validate(&files);
    assert!(result.issues.is_empty());
}

#[test]
fn test_definitions_only_declared_in_sidecars() {
    let schema = common::schema();
    let files = vec![events("a.tsv", &["(Definition/Inline, (Red))", "Def/Inline"])];

    let result = DatasetValidator::new(&schema, ValidatorConfig::default()).validate(&files);
    assert_eq!(
        common::codes(&result.issues),
        vec!["illegalDefinitionContext", "missingDefinitionForDef"]
    );
    assert_eq!(result.issues[0].parameters().get("tsvLine"), Some("2"));
    assert_eq!(result.issues[1].parameters().get("tsvLine"), Some("3"));
}

#[test]
fn test_limit_errors_reduces_per_code() {
    let schema = common::schema();
    let files = vec![
        events("a.tsv", &["Bogus", "Nonsense"]),
        events("b.tsv", &["Gibberish"]),
    ];
    let config = ValidatorConfig {
        limit_errors: true,
        ..Default::default()
    };

    let result = DatasetValidator::new(&schema, config).validate(&files);
    assert_eq!(result.issues.len(), 3);

    let reduced = result.dataset_issues();
    assert_eq!(reduced.len(), 1);
    assert_eq!(reduced[0].code, "HED_ERROR");
    assert_eq!(reduced[0].sub_code, "TAG_INVALID");
    assert_eq!(reduced[0].line, Some(2));
    assert_eq!(reduced[0].location.as_deref(), Some("a.tsv"));
    assert!(
        reduced[0]
            .issue_message
            .ends_with(" There are 3 total TAG_INVALID errors in 2 files.")
    );
}

#[test]
fn test_definitions_rechecked_under_final_schema() {
    let schema = common::schema();
    let legacy = SchemaIndex::from_document(SchemaDocument {
        version: "8.2.0".to_string(),
        ..serde_json::from_str(include_str!("fixtures/schema.json")).unwrap()
    })
    .unwrap();
    let mut final_document: SchemaDocument =
        serde_json::from_str(include_str!("fixtures/schema.json")).unwrap();
    final_document
        .tags
        .retain(|tag| tag.long != "Attribute/Sensory/Visual/Color/Red");
    final_document.version = "8.3.0".to_string();
    let final_schema = SchemaIndex::from_document(final_document).unwrap();

    let files = vec![sidecar("a.json", &[("defs", "(Definition/Cue, (Red))")])];
    let config = ValidatorConfig {
        report_unused_definitions: false,
        ..Default::default()
    };

    let result = DatasetValidator::new(&final_schema, config.clone())
        .with_definition_schema(&legacy)
        .validate(&files);
    assert!(common::codes(&result.issues).contains(&"invalidTag"));

    let result = DatasetValidator::new(&schema, config).validate(&files);
    assert!(result.issues.is_empty());
}
