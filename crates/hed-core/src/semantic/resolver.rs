//! Tag resolution against the schema
//!
//! Maps a slash-separated tag (short, long or intermediate form) to a schema
//! node. The path is scanned from its end for the deepest segment that names
//! a schema node; the segments before it must match that node's trailing
//! ancestors, and the segments after it become a value (below a `#` node) or
//! an extension (below an `extensionAllowed` node).
//!
//! ```text
//! Sensory-event            -> Event/Sensory-event
//! Man-made-object/Device   -> Item/Object/Man-made-object/Device
//! Nonsense/Device          -> invalidParentNode (parents must be the nearest ancestors)
//! Device/Red               -> ambiguousTag (the misplaced term's parent is ambiguous)
//! Label/Red                -> Label value "Red", with a valueIsSchemaTerm warning
//! ```

use std::collections::BTreeSet;
use tracing::trace;

use crate::diagnostics::{Bounds, Issue, IssueCode, IssueParameters};
use crate::parser::ParsedTag;
use crate::schema::{HedSchema, TagEntry, attributes, special_tags};

/// Result of resolving a single tag
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The resolved tag; `None` when resolution failed
    pub tag: Option<ParsedTag>,
    pub issues: Vec<Issue>,
}

enum Selection<'e> {
    Unique(&'e TagEntry),
    Ambiguous(Vec<&'e TagEntry>),
    Mismatch(Vec<&'e TagEntry>),
}

/// Schema-driven tag resolver
pub struct TagResolver<'s> {
    schema: &'s dyn HedSchema,
}

impl<'s> TagResolver<'s> {
    pub fn new(schema: &'s dyn HedSchema) -> Self {
        Self { schema }
    }

    /// Resolve `text` as a standalone tag spanning `[0, text.len())`
    pub fn resolve(&self, text: &str) -> Resolution {
        self.resolve_at(text, text, Bounds::new(0, text.len()))
    }

    /// Resolve the unescaped tag `text`, reporting issues at `bounds`
    ///
    /// `original_text` is the raw source slice, kept on the parsed tag.
    pub fn resolve_at(&self, text: &str, original_text: &str, bounds: Bounds) -> Resolution {
        let mut resolution = Resolution::default();
        let segments: Vec<&str> = text.split('/').map(str::trim).collect();

        if segments.iter().any(|segment| segment.is_empty()) {
            resolution.issues.push(tag_issue(IssueCode::ExtraSlash, original_text, bounds));
            return resolution;
        }

        let Some(anchor) = self.deepest_term(&segments, segments.len()) else {
            trace!("No schema node found for {}", text);
            resolution.issues.push(tag_issue(IssueCode::InvalidTag, original_text, bounds));
            return resolution;
        };

        let candidates = self.schema.candidates(segments[anchor]);
        match select(&candidates, &segments[..anchor]) {
            Selection::Unique(entry) => {
                self.complete(entry, &segments[anchor + 1..], original_text, bounds, &mut resolution);
            }
            Selection::Ambiguous(matches) => {
                resolution.issues.push(ambiguous_issue(&matches, original_text, bounds));
            }
            Selection::Mismatch(candidates) => {
                self.resolve_mismatch(&segments, anchor, &candidates, original_text, bounds, &mut resolution);
            }
        }
        resolution
    }

    /// Index of the last segment before `end` that names any schema node
    fn deepest_term(&self, segments: &[&str], end: usize) -> Option<usize> {
        (0..end)
            .rev()
            .find(|&index| !self.schema.candidates(segments[index]).is_empty())
    }

    /// The supplied parents do not match the deepest schema term.
    ///
    /// An earlier segment may still resolve: below a `#` node the rest of the
    /// path is a value that happens to be a schema term; anywhere else the
    /// schema term is an illegal extension. An ambiguous earlier segment is
    /// reported as such.
    fn resolve_mismatch(
        &self,
        segments: &[&str],
        anchor: usize,
        candidates: &[&TagEntry],
        original_text: &str,
        bounds: Bounds,
        resolution: &mut Resolution,
    ) {
        let mut end = anchor;
        while let Some(index) = self.deepest_term(segments, end) {
            let earlier = self.schema.candidates(segments[index]);
            let entry = match select(&earlier, &segments[..index]) {
                Selection::Unique(entry) => entry,
                Selection::Ambiguous(matches) => {
                    resolution.issues.push(ambiguous_issue(&matches, original_text, bounds));
                    return;
                }
                Selection::Mismatch(_) => {
                    end = index;
                    continue;
                }
            };

            let rest = &segments[index + 1..];
            if self.schema.value_node(&entry.long_tag).is_some() {
                if !special_tags::is_definition_related(entry) {
                    resolution.issues.push(Issue::with_parameters(
                        IssueCode::ValueIsSchemaTerm,
                        IssueParameters::new()
                            .with("tag", original_text)
                            .with("value", rest.join("/"))
                            .with_bounds(bounds),
                    ));
                }
                self.complete(entry, rest, original_text, bounds, resolution);
            } else {
                resolution.issues.push(Issue::with_parameters(
                    IssueCode::InvalidExtension,
                    IssueParameters::new()
                        .with("tag", original_text)
                        .with("extension", rest[0])
                        .with_bounds(bounds),
                ));
            }
            return;
        }

        let parents: Vec<&str> = candidates.iter().map(|entry| entry.long_tag.as_str()).collect();
        resolution.issues.push(Issue::with_parameters(
            IssueCode::InvalidParentNode,
            IssueParameters::new()
                .with("tag", original_text)
                .with("parentTag", parents.join(", "))
                .with_bounds(bounds),
        ));
    }

    /// Build the parsed tag for `entry` with the trailing segments `rest`
    fn complete(
        &self,
        entry: &TagEntry,
        rest: &[&str],
        original_text: &str,
        bounds: Bounds,
        resolution: &mut Resolution,
    ) {
        let mut attributes: BTreeSet<String> = attributes::TAG_ATTRIBUTES
            .iter()
            .filter(|attribute| self.schema.has_attribute(&entry.long_tag, attribute))
            .map(|attribute| attribute.to_string())
            .collect();

        let (value, extension) = if rest.is_empty() {
            (None, None)
        } else if let Some(value_node) = self.schema.value_node(&entry.long_tag) {
            attributes.extend(
                attributes::TAG_ATTRIBUTES
                    .iter()
                    .filter(|attribute| self.schema.has_attribute(&value_node.long_tag, attribute))
                    .map(|attribute| attribute.to_string()),
            );
            (Some(rest.join("/")), None)
        } else if rest.contains(&"#") {
            resolution.issues.push(tag_issue(IssueCode::InvalidPlaceholder, original_text, bounds));
            return;
        } else if self.schema.has_attribute(&entry.long_tag, attributes::EXTENSION_ALLOWED) {
            resolution.issues.push(tag_issue(IssueCode::Extension, original_text, bounds));
            (None, Some(rest.join("/")))
        } else {
            resolution.issues.push(Issue::with_parameters(
                IssueCode::InvalidExtension,
                IssueParameters::new()
                    .with("tag", original_text)
                    .with("extension", rest[0])
                    .with_bounds(bounds),
            ));
            return;
        };

        let tail = value.as_deref().or(extension.as_deref());
        let (short_form, long_form) = match tail {
            Some(tail) => (
                format!("{}/{}", entry.short_tag, tail),
                format!("{}/{}", entry.long_tag, tail),
            ),
            None => (entry.short_tag.clone(), entry.long_tag.clone()),
        };

        resolution.tag = Some(ParsedTag {
            original_text: original_text.to_string(),
            bounds,
            canonical_form: long_form.to_lowercase(),
            short_form,
            long_form,
            entry: entry.clone(),
            attributes,
            value,
            extension,
        });
    }
}

/// Pick the candidate whose trailing ancestors equal `parents`
fn select<'e>(candidates: &[&'e TagEntry], parents: &[&str]) -> Selection<'e> {
    let matches: Vec<&TagEntry> = candidates
        .iter()
        .copied()
        .filter(|entry| ancestors_end_with(entry, parents))
        .collect();

    match matches.len() {
        0 => Selection::Mismatch(candidates.to_vec()),
        1 => Selection::Unique(matches[0]),
        _ => Selection::Ambiguous(matches),
    }
}

fn ancestors_end_with(entry: &TagEntry, parents: &[&str]) -> bool {
    let ancestors: Vec<&str> = entry.segments().collect();
    let ancestors = &ancestors[..ancestors.len().saturating_sub(1)];
    if parents.len() > ancestors.len() {
        return false;
    }
    ancestors[ancestors.len() - parents.len()..]
        .iter()
        .zip(parents)
        .all(|(ancestor, parent)| ancestor.eq_ignore_ascii_case(parent))
}

fn ambiguous_issue(matches: &[&TagEntry], tag: &str, bounds: Bounds) -> Issue {
    let names: Vec<&str> = matches.iter().map(|entry| entry.long_tag.as_str()).collect();
    Issue::with_parameters(
        IssueCode::AmbiguousTag,
        IssueParameters::new()
            .with("tag", tag)
            .with("candidates", names.join(", "))
            .with_bounds(bounds),
    )
}

fn tag_issue(code: IssueCode, tag: &str, bounds: Bounds) -> Issue {
    Issue::with_parameters(code, IssueParameters::new().with("tag", tag).with_bounds(bounds))
}
