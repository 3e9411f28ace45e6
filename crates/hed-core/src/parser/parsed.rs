//! Parsed annotation tree
//!
//! Trees are built once by the parser and never mutated afterwards. Every node
//! keeps its [`Bounds`] into the original string; a group's bounds contain
//! the bounds of all of its descendants.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::diagnostics::Bounds;
use crate::schema::TagEntry;

/// A tag resolved against the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTag {
    /// Source text as written, escapes included
    pub original_text: String,
    pub bounds: Bounds,
    pub short_form: String,
    pub long_form: String,
    /// Lower-cased long form including any value or extension
    pub canonical_form: String,
    /// Deepest schema node the tag resolved to
    pub entry: TagEntry,
    /// Schema attributes of the resolved node
    pub attributes: BTreeSet<String>,
    /// Text below a value-taking node
    pub value: Option<String>,
    /// Text below a node that allows extension
    pub extension: Option<String>,
}

impl ParsedTag {
    /// Whether the tag carries the `#` placeholder as its value
    pub fn is_placeholder(&self) -> bool {
        self.value.as_deref().is_some_and(|value| value.trim() == "#")
    }

    /// Whether the resolved node has the short name `name`
    pub fn is_named(&self, name: &str) -> bool {
        self.entry.is_named(name)
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }

    /// Long form of the `#` value node, for tags that carry a value
    pub fn value_node(&self) -> Option<String> {
        self.value
            .as_ref()
            .map(|_| format!("{}/#", self.entry.long_tag))
    }

    /// Copy of the tag with its value replaced and its bounds moved
    pub(crate) fn with_value(&self, value: &str, bounds: Bounds) -> Self {
        let mut tag = self.clone();
        tag.bounds = bounds;
        tag.original_text = format!("{}/{}", self.entry.short_tag, value);
        tag.short_form = tag.original_text.clone();
        tag.long_form = format!("{}/{}", self.entry.long_tag, value);
        tag.canonical_form = tag.long_form.to_lowercase();
        tag.value = Some(value.to_string());
        tag
    }
}

impl fmt::Display for ParsedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original_text)
    }
}

/// A parenthesized group, or the implicit root group of a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedGroup {
    pub original_text: String,
    pub bounds: Bounds,
    pub children: Vec<ParsedNode>,
}

/// Child of a [`ParsedGroup`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParsedNode {
    Tag(ParsedTag),
    Group(ParsedGroup),
}

impl ParsedNode {
    pub fn bounds(&self) -> Bounds {
        match self {
            ParsedNode::Tag(tag) => tag.bounds,
            ParsedNode::Group(group) => group.bounds,
        }
    }
}

impl ParsedGroup {
    pub fn new(original_text: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            original_text: original_text.into(),
            bounds,
            children: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child tags
    pub fn tags(&self) -> impl Iterator<Item = &ParsedTag> {
        self.children.iter().filter_map(|child| match child {
            ParsedNode::Tag(tag) => Some(tag),
            ParsedNode::Group(_) => None,
        })
    }

    /// Direct child groups
    pub fn groups(&self) -> impl Iterator<Item = &ParsedGroup> {
        self.children.iter().filter_map(|child| match child {
            ParsedNode::Group(group) => Some(group),
            ParsedNode::Tag(_) => None,
        })
    }

    /// All tags at any depth, in source order
    pub fn all_tags(&self) -> Vec<&ParsedTag> {
        let mut tags = Vec::new();
        self.collect_tags(&mut tags);
        tags
    }

    fn collect_tags<'a>(&'a self, tags: &mut Vec<&'a ParsedTag>) {
        for child in &self.children {
            match child {
                ParsedNode::Tag(tag) => tags.push(tag),
                ParsedNode::Group(group) => group.collect_tags(tags),
            }
        }
    }

    /// First direct tag with the short name `name`
    pub fn find_tag(&self, name: &str) -> Option<&ParsedTag> {
        self.tags().find(|tag| tag.is_named(name))
    }

    /// Whether any tag at any depth has the short name `name`
    pub fn contains_tag(&self, name: &str) -> bool {
        self.all_tags().iter().any(|tag| tag.is_named(name))
    }

    /// Order-insensitive canonical rendering, used to compare groups
    pub fn canonical_string(&self) -> String {
        let mut parts: Vec<String> = self
            .children
            .iter()
            .map(|child| match child {
                ParsedNode::Tag(tag) => tag.canonical_form.clone(),
                ParsedNode::Group(group) => format!("({})", group.canonical_string()),
            })
            .collect();
        parts.sort();
        parts.join(",")
    }

    /// Whether every descendant lies within its parent's bounds
    pub fn bounds_are_nested(&self) -> bool {
        self.children.iter().all(|child| {
            self.bounds.contains(&child.bounds())
                && match child {
                    ParsedNode::Group(group) => group.bounds_are_nested(),
                    ParsedNode::Tag(_) => true,
                }
        })
    }
}

impl fmt::Display for ParsedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original_text)
    }
}

/// A fully parsed annotation string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedHedString {
    pub text: String,
    pub root: ParsedGroup,
}

impl ParsedHedString {
    /// All tags at any depth, in source order
    pub fn tags(&self) -> Vec<&ParsedTag> {
        self.root.all_tags()
    }

    /// Groups that are direct children of the root
    pub fn top_level_groups(&self) -> impl Iterator<Item = &ParsedGroup> {
        self.root.groups()
    }
}
