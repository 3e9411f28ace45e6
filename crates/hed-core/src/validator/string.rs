//! Annotation string validation
//!
//! Runs the parser, then walks the tree checking each tag and group:
//!
//! - `#` placeholders only where placeholders are allowed
//! - `requireChild` tags must have a child
//! - values must satisfy their value classes and units
//! - `unique` tags at most once per string, no duplicate tags within a group
//! - `Def` / `Def-expand` must refer to a registered definition with the
//!   right arity, and a `Def-expand` group must match the expansion
//! - `Definition` groups only at the top level of a sidecar string

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};

use super::{FileValidation, HedFile};
use crate::config::ValidatorConfig;
use crate::diagnostics::{Issue, IssueCode, IssueContext, IssueParameters};
use crate::parser::{ParsedGroup, ParsedHedString, ParsedTag, parse_hed_string};
use crate::schema::{HedSchema, attributes, special_tags};
use crate::semantic::{DefinitionManager, ValueClassMatcher, is_definition_group};

/// Per-string policy switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringOptions {
    /// Top-level `Definition` groups are declarations rather than errors
    pub definitions_allowed: bool,
    /// `#` placeholders are accepted
    pub placeholders_allowed: bool,
}

/// Result of validating one string
#[derive(Debug, Clone, Default)]
pub struct StringValidation {
    /// Parsed tree; `None` when the string could not be parsed at all
    pub parsed: Option<ParsedHedString>,
    pub issues: Vec<Issue>,
    /// Lower-cased names of referenced definitions
    pub referenced_definitions: BTreeSet<String>,
}

impl StringValidation {
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.is_warning())
    }

    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }
}

/// Validator for annotation strings against one schema and definition registry
pub struct HedStringValidator<'a> {
    schema: &'a dyn HedSchema,
    definitions: &'a DefinitionManager,
    config: ValidatorConfig,
    matcher: ValueClassMatcher<'a>,
}

impl<'a> HedStringValidator<'a> {
    pub fn new(
        schema: &'a dyn HedSchema,
        definitions: &'a DefinitionManager,
        config: ValidatorConfig,
    ) -> Self {
        Self {
            schema,
            definitions,
            config,
            matcher: ValueClassMatcher::new(schema),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a standalone string
    ///
    /// Definitions are not allowed; placeholders follow the configuration.
    pub fn validate(&self, text: &str, context: &IssueContext) -> StringValidation {
        let options = StringOptions {
            definitions_allowed: false,
            placeholders_allowed: self.config.allow_placeholders,
        };
        self.validate_with(text, context, options)
    }

    /// Validate a string under explicit options
    pub fn validate_with(
        &self,
        text: &str,
        context: &IssueContext,
        options: StringOptions,
    ) -> StringValidation {
        let mut validation = StringValidation::default();

        match parse_hed_string(text, self.schema) {
            Ok((parsed, issues)) => {
                validation.issues = issues;
                let mut walk = Walk {
                    options,
                    issues: &mut validation.issues,
                    referenced: &mut validation.referenced_definitions,
                };
                self.check_group(&parsed.root, true, &mut walk);
                self.check_unique(&parsed, &mut validation.issues);
                validation.parsed = Some(parsed);
            }
            Err(err) => validation.issues.push(err.into_issue()),
        }

        for issue in &mut validation.issues {
            issue.add_context(context);
        }
        trace!("Validated {:?}: {} issues", text, validation.issues.len());
        validation
    }

    /// Validate every annotation of a file
    pub fn validate_file(&self, file: &HedFile) -> FileValidation {
        let options = StringOptions {
            definitions_allowed: file.is_sidecar(),
            placeholders_allowed: self.config.allow_placeholders || file.is_sidecar(),
        };

        let mut result = FileValidation {
            path: file.path.clone(),
            ..Default::default()
        };
        for entry in &file.entries {
            let validation = self.validate_with(&entry.text, &file.context(entry), options);
            result.issues.extend(validation.issues);
            result
                .referenced_definitions
                .extend(validation.referenced_definitions);
        }

        debug!(
            "Validated {} ({} entries): {} issues",
            file.path,
            file.entries.len(),
            result.issues.len()
        );
        result
    }

    fn check_group(&self, group: &ParsedGroup, is_root: bool, walk: &mut Walk<'_>) {
        for inner in group.groups() {
            if is_definition_group(inner) {
                if is_root && walk.options.definitions_allowed {
                    self.check_definition_contents(inner, walk);
                } else if let Some(tag) = inner.find_tag(special_tags::DEFINITION) {
                    walk.issues.push(illegal_definition(tag));
                }
                continue;
            }
            self.check_group(inner, false, walk);
        }

        let mut seen = HashSet::new();
        for tag in group.tags() {
            if !seen.insert(tag.canonical_form.as_str()) {
                walk.issues.push(Issue::with_parameters(
                    IssueCode::DuplicateTag,
                    IssueParameters::new()
                        .with("tag", &tag.original_text)
                        .with_bounds(tag.bounds),
                ));
            }

            if tag.is_named(special_tags::DEFINITION) {
                walk.issues.push(illegal_definition(tag));
            } else if tag.is_named(special_tags::DEF) || tag.is_named(special_tags::DEF_EXPAND) {
                self.check_definition_use(tag, group, is_root, walk);
            } else {
                self.check_tag(tag, walk);
            }
        }
    }

    /// Check the tags of a declaration's template, where `#` stands for the argument
    fn check_definition_contents(&self, definition: &ParsedGroup, walk: &mut Walk<'_>) {
        let options = walk.options;
        walk.options.placeholders_allowed = true;
        for contents in definition.groups() {
            self.check_group(contents, false, walk);
        }
        walk.options = options;
    }

    fn check_tag(&self, tag: &ParsedTag, walk: &mut Walk<'_>) {
        if tag.is_placeholder() {
            if !walk.options.placeholders_allowed {
                walk.issues.push(tag_issue(IssueCode::InvalidPlaceholder, tag));
            }
            return;
        }

        if tag.value.is_none()
            && tag.extension.is_none()
            && tag.has_attribute(attributes::REQUIRE_CHILD)
        {
            walk.issues.push(tag_issue(IssueCode::ChildRequired, tag));
        }

        if let (Some(value), Some(value_node)) = (tag.value.as_deref(), tag.value_node()) {
            walk.issues.extend(
                self.matcher
                    .check(&value_node, value)
                    .into_issue(&tag.original_text, value, tag.bounds),
            );
        }
    }

    fn check_definition_use(
        &self,
        tag: &ParsedTag,
        group: &ParsedGroup,
        is_root: bool,
        walk: &mut Walk<'_>,
    ) {
        if tag.value.as_deref().is_some_and(|value| value.ends_with("/#"))
            && !walk.options.placeholders_allowed
        {
            walk.issues.push(tag_issue(IssueCode::InvalidPlaceholder, tag));
        }

        let evaluation =
            self.definitions
                .evaluate_with(tag, &self.matcher, self.config.validate_definition_values);
        if !evaluation.name.is_empty() {
            walk.referenced.insert(evaluation.name.to_lowercase());
        }
        walk.issues.extend(evaluation.errors);
        walk.issues.extend(evaluation.extra);

        if is_root || !tag.is_named(special_tags::DEF_EXPAND) {
            return;
        }
        let Some(expanded) = evaluation.expanded else {
            return;
        };

        let inner: Vec<&ParsedGroup> = group.groups().collect();
        let matches = match inner.as_slice() {
            [] => expanded.is_empty(),
            [contents] => contents.canonical_string() == expanded.canonical_string(),
            _ => false,
        };
        if !matches {
            walk.issues.push(Issue::with_parameters(
                IssueCode::DefExpandContentsInvalid,
                IssueParameters::new()
                    .with("definition", &evaluation.name)
                    .with("tag", &tag.original_text)
                    .with("expected", expected_text(&expanded))
                    .with_bounds(group.bounds),
            ));
        }
    }

    fn check_unique(&self, parsed: &ParsedHedString, issues: &mut Vec<Issue>) {
        let mut counts: HashMap<&str, Vec<&ParsedTag>> = HashMap::new();
        for tag in parsed.tags() {
            if tag.has_attribute(attributes::UNIQUE) {
                counts
                    .entry(tag.entry.long_formatted_tag.as_str())
                    .or_default()
                    .push(tag);
            }
        }

        let mut repeated: Vec<&ParsedTag> = counts
            .into_values()
            .filter(|tags| tags.len() > 1)
            .filter_map(|tags| tags.get(1).copied())
            .collect();
        repeated.sort_by_key(|tag| tag.bounds);
        for tag in repeated {
            issues.push(Issue::with_parameters(
                IssueCode::MultipleUniqueTags,
                IssueParameters::new()
                    .with("tag", &tag.entry.short_tag)
                    .with_bounds(tag.bounds),
            ));
        }
    }
}

/// Mutable state threaded through the tree walk
struct Walk<'w> {
    options: StringOptions,
    issues: &'w mut Vec<Issue>,
    referenced: &'w mut BTreeSet<String>,
}

fn tag_issue(code: IssueCode, tag: &ParsedTag) -> Issue {
    Issue::with_parameters(
        code,
        IssueParameters::new()
            .with("tag", &tag.original_text)
            .with_bounds(tag.bounds),
    )
}

fn illegal_definition(tag: &ParsedTag) -> Issue {
    let name = tag.value.as_deref().unwrap_or(tag.original_text.as_str());
    Issue::with_parameters(
        IssueCode::IllegalDefinitionContext,
        IssueParameters::new()
            .with("definition", name)
            .with("tag", &tag.original_text)
            .with_bounds(tag.bounds),
    )
}

fn expected_text(expanded: &ParsedGroup) -> String {
    expanded
        .all_tags()
        .iter()
        .map(|tag| tag.short_form.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
