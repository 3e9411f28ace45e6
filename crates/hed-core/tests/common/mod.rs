//! Shared fixtures for the integration tests

#![allow(dead_code)]

use hed_core::{
    DefinitionManager, HedStringValidator, Issue, IssueContext, SchemaIndex, StringValidation,
    ValidatorConfig, parse_hed_string,
};

const SCHEMA_JSON: &str = include_str!("../fixtures/schema.json");

/// The test schema: a small slice of HED 8.3.0 plus a few value classes
pub fn schema() -> SchemaIndex {
    SchemaIndex::from_json(SCHEMA_JSON).expect("fixture schema should load")
}

/// A frozen registry holding the definitions declared in `declarations`
pub fn definitions(schema: &SchemaIndex, declarations: &[&str]) -> DefinitionManager {
    let mut manager = DefinitionManager::new();
    for text in declarations {
        let (parsed, issues) = parse_hed_string(text, schema).expect("declaration should parse");
        assert!(issues.is_empty(), "{text}: {issues:?}");
        for group in parsed.root.groups() {
            let issues = manager.add_definition(group).expect("registry should be open");
            assert!(issues.is_empty(), "{text}: {issues:?}");
        }
    }
    manager.finalize();
    manager
}

/// Validate `text` as a standalone string with the default configuration
pub fn validate(schema: &SchemaIndex, definitions: &DefinitionManager, text: &str) -> StringValidation {
    HedStringValidator::new(schema, definitions, ValidatorConfig::default())
        .validate(text, &IssueContext::new())
}

pub fn codes(issues: &[Issue]) -> Vec<&str> {
    issues.iter().map(Issue::internal_code).collect()
}

pub fn hed_codes(issues: &[Issue]) -> Vec<&str> {
    issues.iter().map(Issue::hed_code).collect()
}
