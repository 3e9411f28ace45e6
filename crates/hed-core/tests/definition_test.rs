//! Integration tests for definition registration and expansion

mod common;

use hed_core::semantic::RegistryState;
use hed_core::{DefinitionManager, parse_hed_string};

#[test]
fn test_duplicate_names_keep_first_registration() {
    let schema = common::schema();
    let mut manager = DefinitionManager::new();

    let (parsed, _) = parse_hed_string(
        "(Definition/Foo, (Sensory-event)), (Definition/foo, (Agent-action))",
        &schema,
    )
    .unwrap();
    let groups: Vec<_> = parsed.root.groups().collect();

    assert!(manager.add_definition(groups[0]).unwrap().is_empty());
    let issues = manager.add_definition(groups[1]).unwrap();
    assert_eq!(common::codes(&issues), vec!["duplicateDefinition"]);
    assert_eq!(issues[0].hed_code(), "DEFINITION_INVALID");
    assert_eq!(issues[0].bounds(), Some(groups[1].bounds));

    let definition = manager.get_definition("FOO").unwrap();
    assert_eq!(definition.name, "Foo");
    assert_eq!(
        definition.template.as_ref().unwrap().canonical_string(),
        "event/sensory-event"
    );
}

#[test]
fn test_registry_freezes() {
    let schema = common::schema();
    let mut manager = common::definitions(&schema, &["(Definition/Cue, (Sensory-event))"]);
    assert_eq!(manager.state(), RegistryState::Frozen);

    let (parsed, _) = parse_hed_string("(Definition/Late, (Red))", &schema).unwrap();
    let group = parsed.root.groups().next().unwrap();
    let err = manager.add_definition(group).unwrap_err();
    assert_eq!(err.issue().hed_code(), "INTERNAL_ERROR");
    assert!(manager.get_definition("Late").is_none());
}

#[test]
fn test_def_expand_with_numeric_placeholder() {
    let schema = common::schema();
    let definitions = common::definitions(&schema, &["(Definition/MyDef/#, (Item-count/#))"]);

    let validation = common::validate(&schema, &definitions, "Def-expand/MyDef/7");
    assert!(validation.issues.is_empty(), "{:?}", validation.issues);
}

#[test]
fn test_def_expand_with_text_placeholder() {
    let schema = common::schema();
    let definitions = common::definitions(&schema, &["(Definition/MyDef/#, (Description/#))"]);

    let validation = common::validate(&schema, &definitions, "Def-expand/MyDef/7x");
    assert!(validation.issues.is_empty(), "{:?}", validation.issues);

    let validation = common::validate(&schema, &definitions, "Def-expand/MyDef/7x!");
    assert_eq!(common::hed_codes(&validation.issues), vec!["VALUE_INVALID"]);
}

#[test]
fn test_expansion_carries_use_site_bounds() {
    let schema = common::schema();
    let definitions = common::definitions(
        &schema,
        &["(Definition/Scene/#, (Sensory-event, (Item-count/#, Red)))"],
    );

    let (parsed, _) = parse_hed_string("Agent/Human, Def/Scene/4", &schema).unwrap();
    let use_tag = parsed.tags()[1];
    let evaluation = definitions.evaluate_definition(use_tag, &schema, true);

    assert!(evaluation.errors.is_empty());
    let expanded = evaluation.expanded.unwrap();
    let tags = expanded.all_tags();
    assert_eq!(tags.len(), 3);
    assert!(tags.iter().all(|tag| tag.bounds == use_tag.bounds));
    assert!(tags.iter().any(|tag| tag.value.as_deref() == Some("4")));
}

#[test]
fn test_def_arity_errors() {
    let schema = common::schema();
    let definitions = common::definitions(
        &schema,
        &[
            "(Definition/Plain, (Sensory-event))",
            "(Definition/Count/#, (Item-count/#))",
        ],
    );

    let validation = common::validate(&schema, &definitions, "Def/Plain/3");
    assert_eq!(common::codes(&validation.issues), vec!["unexpectedDefinitionValue"]);

    let validation = common::validate(&schema, &definitions, "Def/Count");
    assert_eq!(common::codes(&validation.issues), vec!["missingDefinitionValue"]);

    let validation = common::validate(&schema, &definitions, "Def/Unknown");
    assert_eq!(common::codes(&validation.issues), vec!["missingDefinitionForDef"]);
    assert_eq!(validation.issues[0].hed_code(), "DEF_INVALID");
}

#[test]
fn test_def_expand_group_must_match_definition() {
    let schema = common::schema();
    let definitions = common::definitions(&schema, &["(Definition/Count/#, (Item-count/#, Red))"]);

    let validation = common::validate(
        &schema,
        &definitions,
        "(Def-expand/Count/3, (Red, Item-count/3))",
    );
    assert!(validation.issues.is_empty(), "{:?}", validation.issues);

    let validation = common::validate(
        &schema,
        &definitions,
        "(Def-expand/Count/3, (Red, Item-count/4))",
    );
    assert_eq!(common::codes(&validation.issues), vec!["defExpandContentsInvalid"]);
}
