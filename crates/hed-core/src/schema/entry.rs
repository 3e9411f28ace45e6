//! Tag dictionary entries

use serde::{Deserialize, Serialize};
use std::fmt;

/// Short, long and canonical (lower-cased long) forms of one schema node
///
/// Entries belong to the schema and are looked up, never mutated, by the
/// parser and resolver. Value nodes (`…/#`) use `Parent/#` as short form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagEntry {
    pub short_tag: String,
    pub long_tag: String,
    pub long_formatted_tag: String,
}

impl TagEntry {
    /// Derive an entry from a normalized long form such as `Event/Sensory-event`
    pub fn from_long(long_tag: &str) -> Self {
        let long_tag = long_tag.trim_matches('/');
        let mut segments = long_tag.rsplit('/');
        let last = segments.next().unwrap_or_default();
        let short_tag = if last == "#" {
            match segments.next() {
                Some(parent) => format!("{parent}/#"),
                None => "#".to_string(),
            }
        } else {
            last.to_string()
        };

        Self {
            short_tag,
            long_tag: long_tag.to_string(),
            long_formatted_tag: long_tag.to_lowercase(),
        }
    }

    /// Whether this entry is a `#` value node
    pub fn is_value_node(&self) -> bool {
        self.long_tag.ends_with("/#") || self.long_tag == "#"
    }

    /// Long form of the parent node, if any
    pub fn parent_long(&self) -> Option<&str> {
        self.long_tag.rsplit_once('/').map(|(parent, _)| parent)
    }

    /// Path segments of the long form
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.long_tag.split('/')
    }

    /// Number of segments in the long form
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Whether the short form equals `name`, ignoring case
    pub fn is_named(&self, name: &str) -> bool {
        self.short_tag.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for TagEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.long_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_long() {
        let entry = TagEntry::from_long("Event/Sensory-event");
        assert_eq!(entry.short_tag, "Sensory-event");
        assert_eq!(entry.long_tag, "Event/Sensory-event");
        assert_eq!(entry.long_formatted_tag, "event/sensory-event");
        assert_eq!(entry.parent_long(), Some("Event"));
        assert_eq!(entry.depth(), 2);
    }

    #[test]
    fn test_value_node_short_form() {
        let entry = TagEntry::from_long("Property/Informational-property/Label/#");
        assert_eq!(entry.short_tag, "Label/#");
        assert!(entry.is_value_node());
        assert!(!TagEntry::from_long("Event").is_value_node());
    }

    #[test]
    fn test_root_entry() {
        let entry = TagEntry::from_long("/Event/");
        assert_eq!(entry.short_tag, "Event");
        assert_eq!(entry.parent_long(), None);
        assert!(entry.is_named("event"));
    }
}
