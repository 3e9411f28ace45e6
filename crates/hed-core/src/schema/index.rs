//! In-memory schema index
//!
//! The index keeps two maps built once at construction:
//! - long form (lower-cased) → node
//! - short form (lower-cased) → candidate long forms
//!
//! Ambiguity resolution over the short-form index is left to the
//! [`TagResolver`](crate::semantic::TagResolver); the index only answers lookups.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use super::entry::TagEntry;
use super::{HedSchema, attributes};
use crate::error::HedError;
use crate::result::Result;

/// Serializable description of a schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub version: String,
    #[serde(default)]
    pub tags: Vec<SchemaTagDocument>,
    /// Value class → character class names
    #[serde(default)]
    pub class_chars: IndexMap<String, Vec<String>>,
    /// Character class → regex fragment
    #[serde(default)]
    pub char_regex: IndexMap<String, String>,
    /// Unit class → units
    #[serde(default)]
    pub unit_classes: IndexMap<String, Vec<String>>,
}

/// One node of a [`SchemaDocument`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTagDocument {
    /// Full slash-separated path, e.g. `Event/Sensory-event`
    pub long: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub value_classes: Vec<String>,
    #[serde(default)]
    pub unit_classes: Vec<String>,
}

impl SchemaTagDocument {
    pub fn new(long: impl Into<String>) -> Self {
        Self {
            long: long.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_value_class(mut self, class_name: impl Into<String>) -> Self {
        self.value_classes.push(class_name.into());
        self
    }

    pub fn with_unit_class(mut self, class_name: impl Into<String>) -> Self {
        self.unit_classes.push(class_name.into());
        self
    }
}

#[derive(Debug, Clone)]
struct TagNode {
    entry: TagEntry,
    attributes: HashSet<String>,
    value_classes: Vec<String>,
    unit_classes: Vec<String>,
}

impl TagNode {
    fn new(long: &str) -> Self {
        Self {
            entry: TagEntry::from_long(long),
            attributes: HashSet::new(),
            value_classes: Vec::new(),
            unit_classes: Vec::new(),
        }
    }
}

/// Immutable in-memory schema
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    version: String,
    nodes: HashMap<String, TagNode>,
    short_index: HashMap<String, Vec<String>>,
    class_chars: HashMap<String, Vec<String>>,
    char_regex: HashMap<String, String>,
    unit_classes: HashMap<String, Vec<String>>,
}

impl SchemaIndex {
    /// Build an index from a schema document
    ///
    /// # Errors
    ///
    /// Returns [`HedError::SchemaError`] when a tag path has empty segments,
    /// a long form is declared twice, or a character class regex does not compile.
    pub fn from_document(document: SchemaDocument) -> Result<Self> {
        let mut nodes: HashMap<String, TagNode> = HashMap::new();
        let mut declared: HashSet<String> = HashSet::new();

        for tag in &document.tags {
            let long = tag.long.trim_matches('/');
            if long.is_empty() || long.split('/').any(|segment| segment.trim().is_empty()) {
                return Err(HedError::schema_error(format!(
                    "Invalid tag path '{}'",
                    tag.long
                )));
            }
            let key = long.to_lowercase();
            if !declared.insert(key.clone()) {
                return Err(HedError::schema_error(format!(
                    "Tag '{long}' is declared more than once"
                )));
            }

            // Ancestors that were not declared explicitly get plain nodes
            let mut prefix = String::new();
            for segment in long.split('/') {
                if !prefix.is_empty() {
                    prefix.push('/');
                }
                prefix.push_str(segment);
                nodes
                    .entry(prefix.to_lowercase())
                    .or_insert_with(|| TagNode::new(&prefix));
            }

            if let Some(node) = nodes.get_mut(&key) {
                node.entry = TagEntry::from_long(long);
                node.attributes.extend(tag.attributes.iter().cloned());
                node.value_classes = tag.value_classes.clone();
                node.unit_classes = tag.unit_classes.clone();
            }
        }

        let mut short_index: HashMap<String, Vec<String>> = HashMap::new();
        for (key, node) in nodes.iter_mut() {
            if node.entry.is_value_node() {
                node.attributes.insert(attributes::TAKES_VALUE.to_string());
                continue;
            }
            short_index
                .entry(node.entry.short_tag.to_lowercase())
                .or_default()
                .push(key.clone());
        }
        for candidates in short_index.values_mut() {
            candidates.sort();
        }

        for (name, fragment) in &document.char_regex {
            Regex::new(fragment).map_err(|e| {
                HedError::schema_error(format!("Invalid regex for character class '{name}': {e}"))
            })?;
        }

        debug!(
            "Built schema index {} with {} tags ({} short forms)",
            document.version,
            nodes.len(),
            short_index.len()
        );

        Ok(Self {
            version: document.version,
            nodes,
            short_index,
            class_chars: document.class_chars.into_iter().collect(),
            char_regex: document.char_regex.into_iter().collect(),
            unit_classes: document.unit_classes.into_iter().collect(),
        })
    }

    /// Build an index from the JSON form of a [`SchemaDocument`]
    pub fn from_json(json: &str) -> Result<Self> {
        let document: SchemaDocument = serde_json::from_str(json)
            .map_err(|e| HedError::schema_error(format!("Invalid schema document: {e}")))?;
        Self::from_document(document)
    }

    /// Number of nodes, including implicit ancestors and value nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, tag_path: &str) -> Option<&TagNode> {
        let key = tag_path.trim_matches('/').to_lowercase();
        if let Some(node) = self.nodes.get(&key) {
            return Some(node);
        }

        // A bare short form, or a short form followed by `/#`
        let (short, value_suffix) = match key.strip_suffix("/#") {
            Some(short) => (short, true),
            None => (key.as_str(), false),
        };
        if short.contains('/') {
            return None;
        }
        let candidates = self.short_index.get(short)?;
        if candidates.len() != 1 {
            trace!("Short form '{}' has {} candidates", short, candidates.len());
            return None;
        }
        if value_suffix {
            self.nodes.get(&format!("{}/#", candidates[0]))
        } else {
            self.nodes.get(&candidates[0])
        }
    }
}

impl HedSchema for SchemaIndex {
    fn version(&self) -> &str {
        &self.version
    }

    fn lookup(&self, tag_path: &str) -> Option<&TagEntry> {
        self.node(tag_path).map(|node| &node.entry)
    }

    fn candidates(&self, short_tag: &str) -> Vec<&TagEntry> {
        self.short_index
            .get(&short_tag.to_lowercase())
            .map(|keys| {
                keys.iter()
                    .filter_map(|key| self.nodes.get(key))
                    .map(|node| &node.entry)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn has_attribute(&self, tag_path: &str, attribute: &str) -> bool {
        let Some(node) = self.node(tag_path) else {
            return false;
        };
        if node.attributes.contains(attribute) {
            return true;
        }
        if !attributes::INHERITED.contains(&attribute) {
            return false;
        }

        let mut parent = node.entry.parent_long();
        while let Some(long) = parent {
            let Some(ancestor) = self.nodes.get(&long.to_lowercase()) else {
                break;
            };
            if ancestor.attributes.contains(attribute) {
                return true;
            }
            parent = ancestor.entry.parent_long();
        }
        false
    }

    fn value_classes(&self, tag_path: &str) -> &[String] {
        self.node(tag_path)
            .map(|node| node.value_classes.as_slice())
            .unwrap_or_default()
    }

    fn unit_classes(&self, tag_path: &str) -> &[String] {
        self.node(tag_path)
            .map(|node| node.unit_classes.as_slice())
            .unwrap_or_default()
    }

    fn units(&self, unit_class: &str) -> &[String] {
        self.unit_classes
            .get(unit_class)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn value_class_chars(&self, class_name: &str) -> Option<&[String]> {
        self.class_chars.get(class_name).map(Vec::as_slice)
    }

    fn char_class_regex(&self, char_class: &str) -> Option<&str> {
        self.char_regex.get(char_class).map(String::as_str)
    }
}
