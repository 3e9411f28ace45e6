//! Definition registry and `Def` / `Def-expand` evaluation
//!
//! A definition is a named tag-group template declared as
//! `(Definition/Name[/#], (contents))`. `Def/Name[/value]` refers to it and
//! `Def-expand/Name[/value]` spells its expansion out inline.
//!
//! # Lifecycle
//!
//! ```text
//! Empty --add_definition--> Collecting --finalize--> Frozen
//! ```
//!
//! Definitions are registered during a sidecar scan, then the registry is
//! frozen and shared read-only by every string validation of the dataset.
//! Names are case-insensitive; the first registration of a name wins.

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::diagnostics::{Bounds, Issue, IssueCode, IssueError, IssueParameters};
use crate::parser::{ParsedGroup, ParsedNode, ParsedTag, parse_hed_string};
use crate::schema::{HedSchema, special_tags};
use crate::semantic::value_class::ValueClassMatcher;

/// A registered definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Name as declared
    pub name: String,
    /// Contents group, if the definition has one
    pub template: Option<ParsedGroup>,
    /// Whether the definition was declared as `Definition/Name/#`
    pub has_placeholder: bool,
    /// Source text of the whole declaration group
    pub source_text: String,
    pub bounds: Bounds,
}

impl Definition {
    /// The tag in the contents that carries the `#` placeholder
    pub fn placeholder_tag(&self) -> Option<&ParsedTag> {
        self.template
            .as_ref()
            .and_then(|template| template.all_tags().into_iter().find(|tag| tag.is_placeholder()))
    }
}

/// Registry lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryState {
    #[default]
    Empty,
    Collecting,
    Frozen,
}

/// Result of evaluating one `Def` or `Def-expand` tag
#[derive(Debug, Clone, Default)]
pub struct DefinitionEvaluation {
    /// Referenced definition name as written
    pub name: String,
    /// Expanded contents; `None` when evaluation produced errors
    pub expanded: Option<ParsedGroup>,
    pub errors: Vec<Issue>,
    /// Advisory issues that do not block the expansion
    pub extra: Vec<Issue>,
}

/// Registry of definitions for one validation run
#[derive(Debug, Default)]
pub struct DefinitionManager {
    /// Keyed by lower-cased name
    definitions: IndexMap<String, Arc<Definition>>,
    state: RegistryState,
}

impl DefinitionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registered definitions in declaration order
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.values().map(Arc::as_ref)
    }

    /// Look up a definition, ignoring case
    pub fn get_definition(&self, name: &str) -> Option<&Definition> {
        self.definitions
            .get(&name.to_lowercase())
            .map(Arc::as_ref)
    }

    /// Name declared by a definition group, if it has a single well-formed `Definition` tag
    pub fn declared_name(group: &ParsedGroup) -> Option<String> {
        let mut tags = group.tags().filter(|tag| tag.is_named(special_tags::DEFINITION));
        let tag = tags.next()?;
        if tags.next().is_some() {
            return None;
        }
        split_definition_value(tag.value.as_deref()).map(|(name, _)| name.to_string())
    }

    /// Register the definition declared by `group`
    ///
    /// Malformed declarations and duplicate names are reported as issues and
    /// not registered. Registering into a frozen registry is an internal error.
    pub fn add_definition(&mut self, group: &ParsedGroup) -> Result<Vec<Issue>, IssueError> {
        if self.state == RegistryState::Frozen {
            return Err(IssueError::internal(format!(
                "Cannot add definition \"{}\" to a frozen definition registry",
                group.original_text
            )));
        }
        self.state = RegistryState::Collecting;

        let definition = match check_declaration(group) {
            Ok(definition) => definition,
            Err(issue) => return Ok(vec![issue]),
        };

        let key = definition.name.to_lowercase();
        if self.definitions.contains_key(&key) {
            debug!("Ignoring duplicate definition '{}'", definition.name);
            return Ok(vec![Issue::with_parameters(
                IssueCode::DuplicateDefinition,
                IssueParameters::new()
                    .with("definition", &definition.name)
                    .with_bounds(definition.bounds),
            )]);
        }

        debug!(
            "Registering definition '{}' (placeholder: {})",
            definition.name, definition.has_placeholder
        );
        self.definitions.insert(key, Arc::new(definition));
        Ok(Vec::new())
    }

    /// Freeze the registry; later registrations fail
    pub fn finalize(&mut self) {
        if self.state != RegistryState::Frozen {
            debug!("Freezing definition registry with {} definitions", self.definitions.len());
            self.state = RegistryState::Frozen;
        }
    }

    /// Evaluate a `Def` or `Def-expand` tag against the registry
    pub fn evaluate_definition(
        &self,
        use_tag: &ParsedTag,
        schema: &dyn HedSchema,
        validate_value: bool,
    ) -> DefinitionEvaluation {
        let matcher = ValueClassMatcher::new(schema);
        self.evaluate_with(use_tag, &matcher, validate_value)
    }

    /// [`evaluate_definition`](Self::evaluate_definition) with a shared matcher
    pub fn evaluate_with(
        &self,
        use_tag: &ParsedTag,
        matcher: &ValueClassMatcher<'_>,
        validate_value: bool,
    ) -> DefinitionEvaluation {
        let mut evaluation = DefinitionEvaluation::default();
        let is_expand = use_tag.is_named(special_tags::DEF_EXPAND);
        let bounds = use_tag.bounds;

        let Some(value) = use_tag.value.as_deref() else {
            evaluation.errors.push(Issue::with_parameters(
                IssueCode::ChildRequired,
                IssueParameters::new()
                    .with("tag", &use_tag.original_text)
                    .with_bounds(bounds),
            ));
            return evaluation;
        };
        let (name, argument) = match value.split_once('/') {
            Some((name, argument)) => (name.trim(), Some(argument.trim())),
            None => (value.trim(), None),
        };
        evaluation.name = name.to_string();

        let Some(definition) = self.get_definition(name) else {
            let code = if is_expand {
                IssueCode::MissingDefinitionForDefExpand
            } else {
                IssueCode::MissingDefinitionForDef
            };
            evaluation.errors.push(Issue::with_parameters(
                code,
                IssueParameters::new()
                    .with("definition", name)
                    .with("tag", &use_tag.original_text)
                    .with_bounds(bounds),
            ));
            return evaluation;
        };

        match (definition.has_placeholder, argument) {
            (false, Some(argument)) => evaluation.errors.push(Issue::with_parameters(
                IssueCode::UnexpectedDefinitionValue,
                IssueParameters::new()
                    .with("definition", &definition.name)
                    .with("tag", &use_tag.original_text)
                    .with("value", argument)
                    .with_bounds(bounds),
            )),
            (true, None) => evaluation.errors.push(Issue::with_parameters(
                IssueCode::MissingDefinitionValue,
                IssueParameters::new()
                    .with("definition", &definition.name)
                    .with("tag", &use_tag.original_text)
                    .with_bounds(bounds),
            )),
            _ => {}
        }
        if !evaluation.errors.is_empty() {
            return evaluation;
        }

        let argument = argument.filter(|argument| *argument != "#");
        if validate_value {
            if let (Some(argument), Some(slot)) = (argument, definition.placeholder_tag()) {
                let value_node = format!("{}/#", slot.entry.long_tag);
                if let Some(issue) = matcher
                    .check(&value_node, argument)
                    .into_issue(&use_tag.original_text, argument, bounds)
                {
                    evaluation.errors.push(issue);
                    return evaluation;
                }
            }
        }

        let expanded = match &definition.template {
            Some(template) => substitute(template, argument, bounds),
            None => {
                if is_expand {
                    evaluation.extra.push(Issue::with_parameters(
                        IssueCode::EmptyDefinitionExpansion,
                        IssueParameters::new()
                            .with("definition", &definition.name)
                            .with_bounds(bounds),
                    ));
                }
                ParsedGroup::new(use_tag.original_text.clone(), bounds)
            }
        };
        trace!("Expanded {} into {}", use_tag.original_text, expanded.canonical_string());
        evaluation.expanded = Some(expanded);
        evaluation
    }

    /// Re-check every stored definition against `schema`
    ///
    /// Used when definitions were collected under a different schema than
    /// the one the dataset is finally validated with. Issue bounds refer to
    /// each definition's own source text.
    pub fn validate_definitions(&self, schema: &dyn HedSchema) -> Vec<Issue> {
        let matcher = ValueClassMatcher::new(schema);
        let mut issues = Vec::new();

        for definition in self.definitions() {
            let (parsed, parse_issues) = match parse_hed_string(&definition.source_text, schema) {
                Ok(parsed) => parsed,
                Err(err) => {
                    issues.push(err.into_issue());
                    continue;
                }
            };
            issues.extend(parse_issues);

            for tag in parsed.tags() {
                if tag.is_placeholder() || special_tags::is_definition_related(&tag.entry) {
                    continue;
                }
                let (Some(value), Some(value_node)) = (tag.value.as_deref(), tag.value_node()) else {
                    continue;
                };
                issues.extend(
                    matcher
                        .check(&value_node, value)
                        .into_issue(&tag.original_text, value, tag.bounds),
                );
            }
        }

        if !issues.is_empty() {
            warn!(
                "Definitions produced {} issues under schema {}",
                issues.len(),
                schema.version()
            );
        }
        issues
    }
}

/// Split a `Definition` value into its name and whether it declares `#`
fn split_definition_value(value: Option<&str>) -> Option<(&str, bool)> {
    let value = value?.trim();
    let (name, has_placeholder) = match value.split_once('/') {
        None => (value, false),
        Some((name, "#")) => (name.trim(), true),
        Some(_) => return None,
    };
    if name.is_empty() || name == "#" {
        return None;
    }
    Some((name, has_placeholder))
}

/// Check the shape of a declaration group and build its definition
fn check_declaration(group: &ParsedGroup) -> Result<Definition, Issue> {
    let invalid = |name: &str, reason: &str| {
        Issue::with_parameters(
            IssueCode::InvalidDefinition,
            IssueParameters::new()
                .with("definition", name)
                .with("reason", reason)
                .with_bounds(group.bounds),
        )
    };

    let definition_tags: Vec<&ParsedTag> = group
        .tags()
        .filter(|tag| tag.is_named(special_tags::DEFINITION))
        .collect();
    let definition_tag = match definition_tags.as_slice() {
        [] => return Err(invalid(&group.original_text, "the group has no Definition tag")),
        [tag] => *tag,
        [tag, ..] => {
            return Err(invalid(
                &tag.original_text,
                "the group has more than one Definition tag",
            ));
        }
    };

    let Some((name, has_placeholder)) = split_definition_value(definition_tag.value.as_deref())
    else {
        return Err(invalid(
            &definition_tag.original_text,
            "the Definition tag does not name the definition",
        ));
    };

    if group.tags().count() > 1 {
        return Err(invalid(name, "the group has tags other than the Definition tag"));
    }
    let groups: Vec<&ParsedGroup> = group.groups().collect();
    if groups.len() > 1 {
        return Err(invalid(name, "the group has more than one inner group"));
    }
    let template = groups.first().map(|inner| (*inner).clone());

    let placeholders = match &template {
        Some(template) => {
            let tags = template.all_tags();
            if tags
                .iter()
                .any(|tag| special_tags::is_definition_related(&tag.entry))
            {
                return Err(invalid(
                    name,
                    "the contents contain Definition, Def or Def-expand tags",
                ));
            }
            tags.iter().filter(|tag| tag.is_placeholder()).count()
        }
        None => 0,
    };

    if placeholders > 1 {
        return Err(Issue::with_parameters(
            IssueCode::MultiplePlaceholdersInDefinition,
            IssueParameters::new()
                .with("definition", name)
                .with_bounds(group.bounds),
        ));
    }
    if has_placeholder && placeholders == 0 {
        return Err(invalid(name, "it is declared with # but its contents have no placeholder"));
    }
    if !has_placeholder && placeholders == 1 {
        return Err(invalid(name, "its contents have a placeholder but it is not declared with #"));
    }

    Ok(Definition {
        name: name.to_string(),
        template,
        has_placeholder,
        source_text: group.original_text.clone(),
        bounds: group.bounds,
    })
}

/// Copy `template` with the placeholder replaced and every node moved to `bounds`
fn substitute(template: &ParsedGroup, argument: Option<&str>, bounds: Bounds) -> ParsedGroup {
    let children = template
        .children
        .iter()
        .map(|child| match child {
            ParsedNode::Tag(tag) => match argument {
                Some(argument) if tag.is_placeholder() => {
                    ParsedNode::Tag(tag.with_value(argument, bounds))
                }
                _ => {
                    let mut tag = tag.clone();
                    tag.bounds = bounds;
                    ParsedNode::Tag(tag)
                }
            },
            ParsedNode::Group(group) => ParsedNode::Group(substitute(group, argument, bounds)),
        })
        .collect();

    ParsedGroup {
        original_text: template.original_text.clone(),
        bounds,
        children,
    }
}

/// Whether `group` declares a definition
pub fn is_definition_group(group: &ParsedGroup) -> bool {
    group.find_tag(special_tags::DEFINITION).is_some()
}
