//! Tokenizer and grouper for annotation strings
//!
//! Splits a string on top-level commas, tracks parenthesis depth, and builds a
//! tree of raw tag tokens and groups. Malformed input is reported as issues
//! and tokenizing continues; only an empty string is fatal.
//!
//! A backslash escapes `,`, `(`, `)` and `\`. The unescaped text is what the
//! resolver sees, while bounds always refer to the raw source.

use tracing::trace;

use crate::diagnostics::{Bounds, Issue, IssueCode, IssueError, IssueParameters};

/// Characters that are never valid in a tag
pub const INVALID_CHARACTERS: [char; 6] = ['[', ']', '{', '}', '~', '"'];

const ESCAPABLE: [char; 4] = [',', '(', ')', '\\'];

/// A raw tag before schema resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    /// Unescaped, trimmed tag text
    pub text: String,
    /// Bounds of the trimmed raw text
    pub bounds: Bounds,
    /// Whether the tag contains characters that were reported as invalid
    pub malformed: bool,
}

/// A raw group; the root group spans the whole string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupToken {
    pub bounds: Bounds,
    pub children: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Tag(TagToken),
    Group(GroupToken),
}

impl Token {
    pub fn bounds(&self) -> Bounds {
        match self {
            Token::Tag(tag) => tag.bounds,
            Token::Group(group) => group.bounds,
        }
    }
}

/// Tokenize `source` into a root group plus the issues found along the way
pub fn tokenize(source: &str) -> Result<(GroupToken, Vec<Issue>), IssueError> {
    if source.trim().is_empty() {
        return Err(IssueError::new(Issue::new(IssueCode::EmptyHedString)));
    }

    let mut tokenizer = Tokenizer::new(source);
    tokenizer.run();
    let (root, issues) = tokenizer.finish();
    trace!(
        "Tokenized {:?} into {} top-level nodes with {} issues",
        source,
        root.children.len(),
        issues.len()
    );
    Ok((root, issues))
}

/// What the tokenizer saw last, ignoring whitespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Start,
    Comma,
    Open,
    Close,
    Text,
}

#[derive(Debug, Default)]
struct TagBuffer {
    text: String,
    start: Option<usize>,
    end: usize,
    malformed: bool,
}

impl TagBuffer {
    /// Append `ch`, which occupies `[start, end)` in the source
    fn push(&mut self, start: usize, end: usize, ch: char, significant: bool) {
        if significant {
            self.start.get_or_insert(start);
            self.end = end;
        }
        if self.start.is_some() {
            self.text.push(ch);
        }
    }

    fn take(&mut self) -> Option<TagToken> {
        let buffer = std::mem::take(self);
        let start = buffer.start?;
        Some(TagToken {
            text: buffer.text.trim_end().to_string(),
            bounds: Bounds::new(start, buffer.end),
            malformed: buffer.malformed,
        })
    }
}

struct Frame {
    start: usize,
    children: Vec<Token>,
}

struct Tokenizer<'a> {
    source: &'a str,
    issues: Vec<Issue>,
    stack: Vec<Frame>,
    tag: TagBuffer,
    last: Last,
    last_comma: usize,
    /// Whether an empty tag before `last_comma` was already reported
    last_comma_reported: bool,
    last_bounds: Option<Bounds>,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            issues: Vec::new(),
            stack: vec![Frame {
                start: 0,
                children: Vec::new(),
            }],
            tag: TagBuffer::default(),
            last: Last::Start,
            last_comma: 0,
            last_comma_reported: false,
            last_bounds: None,
        }
    }

    fn run(&mut self) {
        let mut chars = self.source.char_indices().peekable();
        while let Some((index, ch)) = chars.next() {
            match ch {
                ',' => self.comma(index),
                '(' => self.open(index),
                ')' => self.close(index),
                '\\' => match chars.peek().copied() {
                    Some((next_index, next)) if ESCAPABLE.contains(&next) => {
                        chars.next();
                        self.text(index, next_index + next.len_utf8(), next);
                    }
                    _ => {
                        self.invalid_character(index, ch);
                        self.text(index, index + 1, ch);
                    }
                },
                _ if ch.is_whitespace() => {
                    self.tag.push(index, index + ch.len_utf8(), ch, false);
                }
                _ => {
                    if INVALID_CHARACTERS.contains(&ch) || ch.is_control() {
                        self.invalid_character(index, ch);
                    }
                    self.text(index, index + ch.len_utf8(), ch);
                }
            }
        }
    }

    fn finish(mut self) -> (GroupToken, Vec<Issue>) {
        let len = self.source.len();
        self.finish_tag();
        self.trailing_comma();

        if self.stack.len() > 1 {
            let innermost = self.stack.last().map(|frame| frame.start).unwrap_or_default();
            self.issues.push(Issue::with_parameters(
                IssueCode::UnclosedParenthesis,
                IssueParameters::new()
                    .with("index", innermost)
                    .with("string", self.source)
                    .with_bounds(Bounds::new(innermost, len)),
            ));
        }

        while self.stack.len() > 1 {
            if let Some(frame) = self.stack.pop() {
                if !frame.children.is_empty() {
                    self.push_child(Token::Group(GroupToken {
                        bounds: Bounds::new(frame.start, len),
                        children: frame.children,
                    }));
                }
            }
        }

        let children = self
            .stack
            .pop()
            .map(|frame| frame.children)
            .unwrap_or_default();
        let root = GroupToken {
            bounds: Bounds::new(0, len),
            children,
        };
        (root, self.issues)
    }

    fn text(&mut self, start: usize, end: usize, ch: char) {
        if self.last == Last::Close && self.tag.start.is_none() {
            self.comma_missing();
        }
        self.tag.push(start, end, ch, true);
        self.last = Last::Text;
    }

    fn comma(&mut self, index: usize) {
        self.finish_tag();
        let empty = matches!(self.last, Last::Start | Last::Comma | Last::Open);
        if empty {
            self.push_index_issue(IssueCode::EmptyTagFound, index);
        }
        self.last = Last::Comma;
        self.last_comma = index;
        self.last_comma_reported = empty;
    }

    /// Report a comma directly followed by `)` or the end of the string
    fn trailing_comma(&mut self) {
        if self.last == Last::Comma && !self.last_comma_reported {
            self.push_index_issue(IssueCode::EmptyTagFound, self.last_comma);
        }
    }

    fn open(&mut self, index: usize) {
        self.finish_tag();
        if matches!(self.last, Last::Text | Last::Close) {
            self.comma_missing();
        }
        self.stack.push(Frame {
            start: index,
            children: Vec::new(),
        });
        self.last = Last::Open;
    }

    fn close(&mut self, index: usize) {
        self.finish_tag();
        if self.stack.len() == 1 {
            self.push_index_issue(IssueCode::UnopenedParenthesis, index);
            return;
        }

        self.trailing_comma();

        let Some(frame) = self.stack.pop() else {
            return;
        };
        let bounds = Bounds::new(frame.start, index + 1);
        if frame.children.is_empty() {
            if self.last == Last::Open {
                self.issues.push(Issue::with_parameters(
                    IssueCode::EmptyTagGroup,
                    IssueParameters::new()
                        .with("index", frame.start)
                        .with("string", self.source)
                        .with_bounds(bounds),
                ));
            }
        } else {
            self.push_child(Token::Group(GroupToken {
                bounds,
                children: frame.children,
            }));
        }
        self.last_bounds = Some(bounds);
        self.last = Last::Close;
    }

    fn finish_tag(&mut self) {
        if let Some(token) = self.tag.take() {
            self.last_bounds = Some(token.bounds);
            self.push_child(Token::Tag(token));
        }
    }

    fn push_child(&mut self, token: Token) {
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(token);
        }
    }

    fn comma_missing(&mut self) {
        let Some(bounds) = self.last_bounds else {
            return;
        };
        let tag = bounds.slice(self.source).unwrap_or_default();
        self.issues.push(Issue::with_parameters(
            IssueCode::CommaMissing,
            IssueParameters::new().with("tag", tag).with_bounds(bounds),
        ));
    }

    fn invalid_character(&mut self, index: usize, ch: char) {
        self.tag.malformed = true;
        self.issues.push(Issue::with_parameters(
            IssueCode::InvalidCharacter,
            IssueParameters::new()
                .with("character", ch.escape_default())
                .with("index", index)
                .with("string", self.source)
                .with_bounds(Bounds::new(index, index + ch.len_utf8())),
        ));
    }

    fn push_index_issue(&mut self, code: IssueCode, index: usize) {
        self.issues.push(Issue::with_parameters(
            code,
            IssueParameters::new()
                .with("index", index)
                .with("string", self.source)
                .with_bounds(Bounds::at(index)),
        ));
    }
}
