//! Value-class matching for `#` placeholder values
//!
//! A value class is a list of character classes; each character class maps to
//! a regex fragment in the schema. The value is valid when every character is
//! admitted by at least one of the class's fragments.
//!
//! Compiled expressions are cached per class name for the lifetime of the
//! matcher, so one matcher should be shared per schema.

use dashmap::DashMap;
use regex::Regex;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::diagnostics::{Bounds, Issue, IssueCode, IssueParameters};
use crate::schema::HedSchema;

/// Outcome of checking a tag value against its value node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueCheck {
    Valid,
    /// No value class of the node admits the value
    InvalidValue { value_classes: Vec<String> },
    /// The value carries a unit outside the node's unit classes
    InvalidUnit { unit: String, units: Vec<String> },
}

impl ValueCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValueCheck::Valid)
    }

    /// Issue reported for a failed check of `value` on `tag`
    pub fn into_issue(self, tag: &str, value: &str, bounds: Bounds) -> Option<Issue> {
        let (code, parameters) = match self {
            ValueCheck::Valid => return None,
            ValueCheck::InvalidValue { value_classes } => (
                IssueCode::InvalidValue,
                IssueParameters::new().with("valueClass", value_classes.join(", ")),
            ),
            ValueCheck::InvalidUnit { unit, units } => (
                IssueCode::InvalidUnit,
                IssueParameters::new()
                    .with("unit", unit)
                    .with("units", units.join(", ")),
            ),
        };
        Some(Issue::with_parameters(
            code,
            parameters
                .with("tag", tag)
                .with("value", value)
                .with_bounds(bounds),
        ))
    }
}

/// Value-class matcher bound to one schema
pub struct ValueClassMatcher<'s> {
    schema: &'s dyn HedSchema,
    /// `None` marks a class that accepts any non-empty value
    cache: DashMap<String, Option<Arc<Regex>>>,
}

impl<'s> ValueClassMatcher<'s> {
    pub fn new(schema: &'s dyn HedSchema) -> Self {
        Self {
            schema,
            cache: DashMap::new(),
        }
    }

    pub fn schema(&self) -> &'s dyn HedSchema {
        self.schema
    }

    /// Compiled expression for a value class
    ///
    /// Unknown classes, and classes whose character classes are all unknown,
    /// compile to `None`, which accepts any non-empty value.
    pub fn compile(&self, class_name: &str) -> Option<Arc<Regex>> {
        if let Some(regex) = self.cache.get(class_name) {
            return regex.value().clone();
        }

        let regex = self.build(class_name).map(Arc::new);
        self.cache
            .entry(class_name.to_string())
            .or_insert(regex)
            .value()
            .clone()
    }

    fn build(&self, class_name: &str) -> Option<Regex> {
        let fragments: Vec<&str> = self
            .schema
            .value_class_chars(class_name)
            .unwrap_or_default()
            .iter()
            .filter_map(|char_class| {
                let fragment = self.schema.char_class_regex(char_class);
                if fragment.is_none() {
                    trace!("Value class {} names unknown character class {}", class_name, char_class);
                }
                fragment
            })
            .collect();

        if fragments.is_empty() {
            trace!("Value class {} accepts any value", class_name);
            return None;
        }

        let pattern = format!("^(?:{})+$", fragments.join("|"));
        match Regex::new(&pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!("Value class {} has an invalid pattern: {}", class_name, err);
                None
            }
        }
    }

    /// Whether `value` satisfies `class_name`; empty values never do
    pub fn test(&self, class_name: &str, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self.compile(class_name) {
            Some(regex) => regex.is_match(value),
            None => true,
        }
    }

    /// Check a value supplied for the value node with long form `value_node`
    ///
    /// A trailing unit (`"5 s"`) or a leading `$` unit is stripped first when
    /// the node declares unit classes. The remaining value is valid when any
    /// of the node's value classes admits it; nodes without value classes
    /// accept any non-empty value.
    pub fn check(&self, value_node: &str, value: &str) -> ValueCheck {
        let value = value.trim();
        let value_classes = self.schema.value_classes(value_node);
        let unit_classes = self.schema.unit_classes(value_node);

        let stripped = if unit_classes.is_empty() {
            value
        } else {
            let units: Vec<&String> = unit_classes
                .iter()
                .flat_map(|class| self.schema.units(class))
                .collect();
            match split_unit(value, &units) {
                Ok(stripped) => stripped,
                Err(unit) => {
                    return ValueCheck::InvalidUnit {
                        unit: unit.to_string(),
                        units: units.into_iter().cloned().collect(),
                    };
                }
            }
        };

        let valid = if value_classes.is_empty() {
            !stripped.is_empty()
        } else {
            value_classes.iter().any(|class| self.test(class, stripped))
        };

        if valid {
            ValueCheck::Valid
        } else {
            ValueCheck::InvalidValue {
                value_classes: value_classes.to_vec(),
            }
        }
    }
}

/// Strip a unit from `value`, returning the bare value or the rejected unit
fn split_unit<'v>(value: &'v str, units: &[&String]) -> Result<&'v str, &'v str> {
    let known = |unit: &str| {
        units
            .iter()
            .any(|candidate| candidate.as_str() == unit || (unit.len() > 1 && candidate.eq_ignore_ascii_case(unit)))
    };

    if let Some(rest) = value.strip_prefix('$') {
        return if known("$") { Ok(rest.trim()) } else { Err("$") };
    }

    match value.rsplit_once(char::is_whitespace) {
        Some((number, unit)) if !unit.is_empty() => {
            if known(unit) {
                Ok(number.trim())
            } else {
                Err(unit)
            }
        }
        _ => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaDocument, SchemaIndex, SchemaTagDocument};
    use indexmap::IndexMap;

    fn schema() -> SchemaIndex {
        let document = SchemaDocument {
            version: "8.3.0".to_string(),
            tags: vec![
                SchemaTagDocument::new("Property/Data-property/Data-value/Item-count/#")
                    .with_value_class("numericClass"),
                SchemaTagDocument::new("Property/Agent-property/Agent-trait/Age/#")
                    .with_value_class("numericClass")
                    .with_unit_class("timeUnits"),
                SchemaTagDocument::new("Property/Informational-property/Description/#"),
            ],
            class_chars: IndexMap::from([
                ("numericClass".to_string(), vec!["digits".to_string(), "period".to_string()]),
                ("digitsOnly".to_string(), vec!["digits".to_string()]),
                ("ghostClass".to_string(), vec!["missing".to_string()]),
            ]),
            char_regex: IndexMap::from([
                ("digits".to_string(), "[0-9]".to_string()),
                ("period".to_string(), "\\.".to_string()),
            ]),
            unit_classes: IndexMap::from([(
                "timeUnits".to_string(),
                vec!["s".to_string(), "second".to_string()],
            )]),
        };
        SchemaIndex::from_document(document).unwrap()
    }

    #[test]
    fn test_digit_class() {
        let schema = schema();
        let matcher = ValueClassMatcher::new(&schema);
        assert!(matcher.test("digitsOnly", "123"));
        assert!(!matcher.test("digitsOnly", "12a"));
        assert!(!matcher.test("digitsOnly", ""));
    }

    #[test]
    fn test_unknown_class_accepts_anything() {
        let schema = schema();
        let matcher = ValueClassMatcher::new(&schema);
        assert!(matcher.test("noSuchClass", "anything at all"));
        assert!(matcher.test("ghostClass", "x"));
        assert!(!matcher.test("noSuchClass", ""));
    }

    #[test]
    fn test_compile_is_cached() {
        let schema = schema();
        let matcher = ValueClassMatcher::new(&schema);
        let first = matcher.compile("numericClass").unwrap();
        let second = matcher.compile("numericClass").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(matcher.compile("noSuchClass").is_none());
    }

    #[test]
    fn test_check_value_node() {
        let schema = schema();
        let matcher = ValueClassMatcher::new(&schema);
        let node = "Property/Data-property/Data-value/Item-count/#";
        assert_eq!(matcher.check(node, "3.5"), ValueCheck::Valid);
        assert_eq!(
            matcher.check(node, "three"),
            ValueCheck::InvalidValue {
                value_classes: vec!["numericClass".to_string()]
            }
        );
        let free = "Property/Informational-property/Description/#";
        assert!(matcher.check(free, "Anything goes!").is_valid());
    }

    #[test]
    fn test_units_are_stripped() {
        let schema = schema();
        let matcher = ValueClassMatcher::new(&schema);
        let node = "Property/Agent-property/Agent-trait/Age/#";
        assert!(matcher.check(node, "30").is_valid());
        assert!(matcher.check(node, "30 s").is_valid());
        assert!(matcher.check(node, "30 Second").is_valid());
        assert_eq!(
            matcher.check(node, "30 parsecs"),
            ValueCheck::InvalidUnit {
                unit: "parsecs".to_string(),
                units: vec!["s".to_string(), "second".to_string()],
            }
        );
    }
}
