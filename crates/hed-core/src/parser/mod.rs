//! Annotation string parsing
//!
//! Parsing runs in two passes: the [`tokenizer`] builds a raw tree of tags and
//! groups, then every tag is resolved against the schema. Tags that fail to
//! resolve are reported and left out of the tree; the rest of the string is
//! still parsed.

pub mod parsed;
pub mod tokenizer;

pub use parsed::{ParsedGroup, ParsedHedString, ParsedNode, ParsedTag};
pub use tokenizer::{GroupToken, TagToken, Token, tokenize};

use tracing::debug;

use crate::diagnostics::{Issue, IssueError};
use crate::schema::HedSchema;
use crate::semantic::TagResolver;

/// Parse `text` into a resolved tree plus all recoverable issues
///
/// Fails only when the string is empty.
pub fn parse_hed_string(
    text: &str,
    schema: &dyn HedSchema,
) -> Result<(ParsedHedString, Vec<Issue>), IssueError> {
    let (root, mut issues) = tokenize(text)?;
    let resolver = TagResolver::new(schema);
    let root = build_group(&root, text, &resolver, &mut issues);

    debug!(
        "Parsed HED string with {} tags and {} issues",
        root.all_tags().len(),
        issues.len()
    );
    Ok((
        ParsedHedString {
            text: text.to_string(),
            root,
        },
        issues,
    ))
}

fn build_group(
    token: &GroupToken,
    source: &str,
    resolver: &TagResolver<'_>,
    issues: &mut Vec<Issue>,
) -> ParsedGroup {
    let original_text = token.bounds.slice(source).unwrap_or_default();
    let mut group = ParsedGroup::new(original_text, token.bounds);

    for child in &token.children {
        match child {
            Token::Tag(tag) => {
                if tag.malformed {
                    continue;
                }
                let original_text = tag.bounds.slice(source).unwrap_or(tag.text.as_str());
                let resolution = resolver.resolve_at(&tag.text, original_text, tag.bounds);
                issues.extend(resolution.issues);
                if let Some(tag) = resolution.tag {
                    group.children.push(ParsedNode::Tag(tag));
                }
            }
            Token::Group(inner) => {
                let inner = build_group(inner, source, resolver, issues);
                group.children.push(ParsedNode::Group(inner));
            }
        }
    }
    group
}
