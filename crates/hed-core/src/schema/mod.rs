//! Schema collaborator interface
//!
//! Loading schema artifacts is handled outside this crate. Validation only
//! needs the read-only operations of [`HedSchema`]; [`SchemaIndex`] is an
//! in-memory implementation built from a serde-friendly [`SchemaDocument`].
//!
//! A schema is constructed once and passed explicitly to every component
//! that needs it, so several schema versions can coexist in one process.

pub mod entry;
pub mod index;

pub use entry::TagEntry;
pub use index::{SchemaDocument, SchemaIndex, SchemaTagDocument};

/// Schema attribute names consulted by validation
pub mod attributes {
    /// Unknown children below this node (or a descendant) are accepted as extensions
    pub const EXTENSION_ALLOWED: &str = "extensionAllowed";
    /// The node may not be used without a child
    pub const REQUIRE_CHILD: &str = "requireChild";
    /// The node is a `#` value node
    pub const TAKES_VALUE: &str = "takesValue";
    /// The node may appear at most once per annotation
    pub const UNIQUE: &str = "unique";
    /// The node must appear in a top-level tag group
    pub const TOP_LEVEL_TAG_GROUP: &str = "topLevelTagGroup";

    /// Attributes recorded on parsed tags
    pub const TAG_ATTRIBUTES: [&str; 5] = [
        EXTENSION_ALLOWED,
        REQUIRE_CHILD,
        TAKES_VALUE,
        UNIQUE,
        TOP_LEVEL_TAG_GROUP,
    ];

    /// Attributes that descendants inherit from their ancestors
    pub const INHERITED: [&str; 1] = [EXTENSION_ALLOWED];
}

/// Short forms of the tags that drive definition handling
pub mod special_tags {
    use super::TagEntry;

    pub const DEFINITION: &str = "Definition";
    pub const DEF: &str = "Def";
    pub const DEF_EXPAND: &str = "Def-expand";

    /// Whether the node is `Definition`, `Def` or `Def-expand`
    pub fn is_definition_related(entry: &TagEntry) -> bool {
        [DEFINITION, DEF, DEF_EXPAND]
            .iter()
            .any(|name| entry.is_named(name))
    }
}

/// Read-only schema operations used by the parser, resolver and validators
pub trait HedSchema: Send + Sync {
    /// Schema version string
    fn version(&self) -> &str;

    /// Look up a node by long form, or by short form when that is unambiguous
    fn lookup(&self, tag_path: &str) -> Option<&TagEntry>;

    /// All nodes whose short form equals `short_tag` (case-insensitive)
    fn candidates(&self, short_tag: &str) -> Vec<&TagEntry>;

    /// Whether the node at `tag_path` carries `attribute`
    fn has_attribute(&self, tag_path: &str, attribute: &str) -> bool;

    /// Value classes declared on a `#` value node
    fn value_classes(&self, tag_path: &str) -> &[String];

    /// Unit classes declared on a `#` value node
    fn unit_classes(&self, tag_path: &str) -> &[String];

    /// Units belonging to a unit class
    fn units(&self, unit_class: &str) -> &[String];

    /// Character class names making up a value class
    fn value_class_chars(&self, class_name: &str) -> Option<&[String]>;

    /// Regex fragment for a character class
    fn char_class_regex(&self, char_class: &str) -> Option<&str>;

    /// The `#` child of the node with long form `long_tag`, if it takes a value
    fn value_node(&self, long_tag: &str) -> Option<&TagEntry> {
        self.lookup(&format!("{long_tag}/#"))
    }
}
