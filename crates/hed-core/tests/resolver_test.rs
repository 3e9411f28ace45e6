//! Integration tests for tag resolution against the fixture schema

mod common;

use hed_core::schema::attributes;
use hed_core::{HedSchema, TagResolver};

#[test]
fn test_round_trip_is_idempotent() {
    let schema = common::schema();
    let resolver = TagResolver::new(&schema);

    for text in [
        "Sensory-event",
        "Event/Sensory-event",
        "Man-made-object/Device",
        "Item/Object/Man-made-object/Device",
        "Agent/Device",
        "Label/Cue",
        "Duration/5 s",
    ] {
        let first = resolver.resolve(text).tag.unwrap();
        let from_long = resolver.resolve(&first.long_form).tag.unwrap();
        let from_short = resolver.resolve(&from_long.short_form).tag.unwrap();

        assert_eq!(first.entry, from_long.entry, "{text}");
        assert_eq!(from_long.entry, from_short.entry, "{text}");
        assert_eq!(first.short_form, from_short.short_form, "{text}");
        assert_eq!(first.canonical_form, from_short.canonical_form, "{text}");
    }
}

#[test]
fn test_resolution_matches_schema_lookup() {
    let schema = common::schema();
    let resolver = TagResolver::new(&schema);
    let tag = resolver.resolve("Visual-presentation").tag.unwrap();
    assert_eq!(
        schema.lookup("Visual-presentation"),
        Some(&tag.entry)
    );
    assert_eq!(
        tag.long_form,
        "Property/Sensory-property/Sensory-presentation/Visual-presentation"
    );
}

#[test]
fn test_ambiguity_needs_parents() {
    let schema = common::schema();
    let resolver = TagResolver::new(&schema);

    let resolution = resolver.resolve("Device");
    assert!(resolution.tag.is_none());
    assert_eq!(common::codes(&resolution.issues), vec!["ambiguousTag"]);
    let candidates = resolution.issues[0].parameters().get("candidates").unwrap();
    assert!(candidates.contains("Agent/Device"));
    assert!(candidates.contains("Item/Object/Man-made-object/Device"));

    assert!(resolver.resolve("Agent/Device").tag.is_some());
    assert!(resolver.resolve("Object/Man-made-object/Device").tag.is_some());
}

#[test]
fn test_ambiguous_parent_of_misplaced_term() {
    let schema = common::schema();
    let resolver = TagResolver::new(&schema);

    let resolution = resolver.resolve("Device/Red");
    assert!(resolution.tag.is_none());
    assert_eq!(common::codes(&resolution.issues), vec!["ambiguousTag"]);

    let resolution = resolver.resolve("Agent/Device/Red");
    assert_eq!(common::codes(&resolution.issues), vec!["invalidExtension"]);
}

#[test]
fn test_extension_rules() {
    let schema = common::schema();
    let resolver = TagResolver::new(&schema);

    let resolution = resolver.resolve("Device/Drill");
    assert_eq!(common::codes(&resolution.issues), vec!["ambiguousTag"]);

    let resolution = resolver.resolve("Man-made-object/Device/Drill");
    assert_eq!(common::codes(&resolution.issues), vec!["extension"]);
    assert!(resolution.issues[0].is_warning());
    let tag = resolution.tag.unwrap();
    assert!(tag.has_attribute(attributes::EXTENSION_ALLOWED));
    assert_eq!(tag.extension.as_deref(), Some("Drill"));

    let resolution = resolver.resolve("Agent/Device/Drill");
    assert!(resolution.tag.is_none());
    assert_eq!(common::hed_codes(&resolution.issues), vec!["TAG_EXTENSION_INVALID"]);
}

#[test]
fn test_value_that_is_schema_term_warns() {
    let schema = common::schema();
    let resolver = TagResolver::new(&schema);
    let resolution = resolver.resolve("Label/Red");
    assert_eq!(common::codes(&resolution.issues), vec!["valueIsSchemaTerm"]);
    assert_eq!(resolution.tag.unwrap().value.as_deref(), Some("Red"));

    let resolution = resolver.resolve("Def/Red");
    assert!(resolution.issues.is_empty());
}
