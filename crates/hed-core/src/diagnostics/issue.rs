//! Issue types reported by every stage of HED validation
//!
//! An [`Issue`] is a value: its code, HED code and level are fixed at
//! construction and its message is derived from the code's template and the
//! parameters. Mutating a parameter through [`Issue::set_parameter`] leaves
//! the message stale until [`Issue::generate_message`] is called again.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use super::messages;

/// Half-open byte range `[start, end)` into the original annotation string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bounds {
    pub start: usize,
    pub end: usize,
}

impl Bounds {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Bounds covering a single byte position
    pub fn at(index: usize) -> Self {
        Self {
            start: index,
            end: index + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `other` lies entirely within these bounds
    pub fn contains(&self, other: &Bounds) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Slice of `text` covered by these bounds, if they are in range
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Severity of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    /// Advisory findings
    Warning,
    /// Findings that make the annotation invalid
    Error,
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueLevel::Warning => write!(f, "warning"),
            IssueLevel::Error => write!(f, "error"),
        }
    }
}

/// Internal issue codes
///
/// Each code owns its HED code, level and message template. Codes that are
/// not known to this crate are kept as [`IssueCode::Unknown`] and rendered
/// through the generic error template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IssueCode {
    EmptyHedString,
    EmptyTagFound,
    EmptyTagGroup,
    UnopenedParenthesis,
    UnclosedParenthesis,
    CommaMissing,
    InvalidCharacter,
    ExtraSlash,
    InvalidTag,
    AmbiguousTag,
    InvalidParentNode,
    InvalidExtension,
    Extension,
    ChildRequired,
    DuplicateTag,
    MultipleUniqueTags,
    InvalidValue,
    ValueIsSchemaTerm,
    InvalidUnit,
    InvalidPlaceholder,
    DuplicateDefinition,
    MultiplePlaceholdersInDefinition,
    InvalidDefinition,
    IllegalDefinitionContext,
    UnusedDefinition,
    MissingDefinitionForDef,
    MissingDefinitionForDefExpand,
    MissingDefinitionValue,
    UnexpectedDefinitionValue,
    DefExpandContentsInvalid,
    EmptyDefinitionExpansion,
    InternalError,
    GenericError,
    Unknown(String),
}

impl IssueCode {
    /// All known codes, in declaration order
    pub const KNOWN: [IssueCode; 33] = [
        IssueCode::EmptyHedString,
        IssueCode::EmptyTagFound,
        IssueCode::EmptyTagGroup,
        IssueCode::UnopenedParenthesis,
        IssueCode::UnclosedParenthesis,
        IssueCode::CommaMissing,
        IssueCode::InvalidCharacter,
        IssueCode::ExtraSlash,
        IssueCode::InvalidTag,
        IssueCode::AmbiguousTag,
        IssueCode::InvalidParentNode,
        IssueCode::InvalidExtension,
        IssueCode::Extension,
        IssueCode::ChildRequired,
        IssueCode::DuplicateTag,
        IssueCode::MultipleUniqueTags,
        IssueCode::InvalidValue,
        IssueCode::ValueIsSchemaTerm,
        IssueCode::InvalidUnit,
        IssueCode::InvalidPlaceholder,
        IssueCode::DuplicateDefinition,
        IssueCode::MultiplePlaceholdersInDefinition,
        IssueCode::InvalidDefinition,
        IssueCode::IllegalDefinitionContext,
        IssueCode::UnusedDefinition,
        IssueCode::MissingDefinitionForDef,
        IssueCode::MissingDefinitionForDefExpand,
        IssueCode::MissingDefinitionValue,
        IssueCode::UnexpectedDefinitionValue,
        IssueCode::DefExpandContentsInvalid,
        IssueCode::EmptyDefinitionExpansion,
        IssueCode::InternalError,
        IssueCode::GenericError,
    ];

    /// Internal code string (camelCase)
    pub fn as_str(&self) -> &str {
        match self {
            IssueCode::EmptyHedString => "emptyHedString",
            IssueCode::EmptyTagFound => "emptyTagFound",
            IssueCode::EmptyTagGroup => "emptyTagGroup",
            IssueCode::UnopenedParenthesis => "unopenedParenthesis",
            IssueCode::UnclosedParenthesis => "unclosedParenthesis",
            IssueCode::CommaMissing => "commaMissing",
            IssueCode::InvalidCharacter => "invalidCharacter",
            IssueCode::ExtraSlash => "extraSlash",
            IssueCode::InvalidTag => "invalidTag",
            IssueCode::AmbiguousTag => "ambiguousTag",
            IssueCode::InvalidParentNode => "invalidParentNode",
            IssueCode::InvalidExtension => "invalidExtension",
            IssueCode::Extension => "extension",
            IssueCode::ChildRequired => "childRequired",
            IssueCode::DuplicateTag => "duplicateTag",
            IssueCode::MultipleUniqueTags => "multipleUniqueTags",
            IssueCode::InvalidValue => "invalidValue",
            IssueCode::ValueIsSchemaTerm => "valueIsSchemaTerm",
            IssueCode::InvalidUnit => "invalidUnit",
            IssueCode::InvalidPlaceholder => "invalidPlaceholder",
            IssueCode::DuplicateDefinition => "duplicateDefinition",
            IssueCode::MultiplePlaceholdersInDefinition => "multiplePlaceholdersInDefinition",
            IssueCode::InvalidDefinition => "invalidDefinition",
            IssueCode::IllegalDefinitionContext => "illegalDefinitionContext",
            IssueCode::UnusedDefinition => "unusedDefinition",
            IssueCode::MissingDefinitionForDef => "missingDefinitionForDef",
            IssueCode::MissingDefinitionForDefExpand => "missingDefinitionForDefExpand",
            IssueCode::MissingDefinitionValue => "missingDefinitionValue",
            IssueCode::UnexpectedDefinitionValue => "unexpectedDefinitionValue",
            IssueCode::DefExpandContentsInvalid => "defExpandContentsInvalid",
            IssueCode::EmptyDefinitionExpansion => "emptyDefinitionExpansion",
            IssueCode::InternalError => "internalError",
            IssueCode::GenericError => "genericError",
            IssueCode::Unknown(code) => code,
        }
    }

    /// Parse an internal code string, keeping unknown codes as [`IssueCode::Unknown`]
    pub fn from_code(code: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|known| known.as_str() == code)
            .cloned()
            .unwrap_or_else(|| IssueCode::Unknown(code.to_string()))
    }

    /// HED specification error code
    pub fn hed_code(&self) -> &'static str {
        match self {
            IssueCode::EmptyHedString | IssueCode::EmptyTagFound | IssueCode::EmptyTagGroup => {
                "TAG_EMPTY"
            }
            IssueCode::UnopenedParenthesis | IssueCode::UnclosedParenthesis => {
                "PARENTHESES_MISMATCH"
            }
            IssueCode::CommaMissing => "COMMA_MISSING",
            IssueCode::InvalidCharacter => "CHARACTER_INVALID",
            IssueCode::ExtraSlash
            | IssueCode::InvalidTag
            | IssueCode::AmbiguousTag
            | IssueCode::InvalidParentNode => "TAG_INVALID",
            IssueCode::InvalidExtension => "TAG_EXTENSION_INVALID",
            IssueCode::Extension => "TAG_EXTENDED",
            IssueCode::ChildRequired => "TAG_REQUIRES_CHILD",
            IssueCode::DuplicateTag => "TAG_EXPRESSION_REPEATED",
            IssueCode::MultipleUniqueTags => "TAG_NOT_UNIQUE",
            IssueCode::InvalidValue | IssueCode::ValueIsSchemaTerm => "VALUE_INVALID",
            IssueCode::InvalidUnit => "UNITS_INVALID",
            IssueCode::InvalidPlaceholder => "PLACEHOLDER_INVALID",
            IssueCode::DuplicateDefinition
            | IssueCode::MultiplePlaceholdersInDefinition
            | IssueCode::InvalidDefinition
            | IssueCode::IllegalDefinitionContext
            | IssueCode::UnusedDefinition => "DEFINITION_INVALID",
            IssueCode::MissingDefinitionForDef
            | IssueCode::MissingDefinitionValue
            | IssueCode::UnexpectedDefinitionValue => "DEF_INVALID",
            IssueCode::MissingDefinitionForDefExpand
            | IssueCode::DefExpandContentsInvalid
            | IssueCode::EmptyDefinitionExpansion => "DEF_EXPAND_INVALID",
            IssueCode::InternalError => "INTERNAL_ERROR",
            IssueCode::GenericError | IssueCode::Unknown(_) => "GENERIC_ERROR",
        }
    }

    /// Severity level of issues with this code
    pub fn level(&self) -> IssueLevel {
        match self {
            IssueCode::Extension
            | IssueCode::ValueIsSchemaTerm
            | IssueCode::UnusedDefinition
            | IssueCode::EmptyDefinitionExpansion => IssueLevel::Warning,
            _ => IssueLevel::Error,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IssueCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IssueCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(IssueCode::from_code(&code))
    }
}

/// Issue parameters
///
/// `bounds` is kept as a structured range; every other parameter is coerced
/// to its string form when it is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(flatten)]
    values: IndexMap<String, String>,
}

impl IssueParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style parameter insertion
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style bounds insertion
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parameter value for templating, `"null"` when absent
    pub fn get_or_null(&self, key: &str) -> &str {
        self.get(key).unwrap_or("null")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over the string parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none() && self.values.is_empty()
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    internal_code: IssueCode,
    hed_code: String,
    level: IssueLevel,
    parameters: IssueParameters,
    message: String,
}

impl Issue {
    /// Create an issue without parameters
    pub fn new(code: IssueCode) -> Self {
        Self::with_parameters(code, IssueParameters::new())
    }

    /// Create an issue, generating its message immediately
    pub fn with_parameters(code: IssueCode, parameters: IssueParameters) -> Self {
        let mut issue = Self {
            hed_code: code.hed_code().to_string(),
            level: code.level(),
            internal_code: code,
            parameters,
            message: String::new(),
        };
        issue.generate_message();
        issue
    }

    /// Create an issue from an internal code string
    ///
    /// Unknown codes are preserved and rendered through the generic template.
    pub fn from_code(code: &str, parameters: IssueParameters) -> Self {
        Self::with_parameters(IssueCode::from_code(code), parameters)
    }

    pub fn code(&self) -> &IssueCode {
        &self.internal_code
    }

    pub fn internal_code(&self) -> &str {
        self.internal_code.as_str()
    }

    pub fn hed_code(&self) -> &str {
        &self.hed_code
    }

    pub fn level(&self) -> IssueLevel {
        self.level
    }

    pub fn is_error(&self) -> bool {
        self.level == IssueLevel::Error
    }

    pub fn is_warning(&self) -> bool {
        self.level == IssueLevel::Warning
    }

    pub fn parameters(&self) -> &IssueParameters {
        &self.parameters
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.parameters.bounds
    }

    /// Change a parameter; the message is stale until [`Issue::generate_message`] runs
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.parameters.set(key, value);
    }

    /// Regenerate the message from the current parameters
    pub fn generate_message(&mut self) {
        self.message = messages::render(&self.internal_code, self.level, &self.parameters);
    }

    /// Attach file/sidecar/line/string context and regenerate the message
    pub fn add_context(&mut self, context: &IssueContext) {
        context.apply(&mut self.parameters);
        self.generate_message();
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Location context appended to issues produced for one annotation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueContext {
    pub file_path: Option<String>,
    pub sidecar_key: Option<String>,
    pub tsv_line: Option<usize>,
    pub hed_string: Option<String>,
}

impl IssueContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_sidecar_key(mut self, key: impl Into<String>) -> Self {
        self.sidecar_key = Some(key.into());
        self
    }

    pub fn with_tsv_line(mut self, line: usize) -> Self {
        self.tsv_line = Some(line);
        self
    }

    pub fn with_hed_string(mut self, hed_string: impl Into<String>) -> Self {
        self.hed_string = Some(hed_string.into());
        self
    }

    fn apply(&self, parameters: &mut IssueParameters) {
        if let Some(path) = &self.file_path {
            parameters.set(messages::FILE_PATH, path);
        }
        if let Some(key) = &self.sidecar_key {
            parameters.set(messages::SIDECAR_KEY, key);
        }
        if let Some(line) = self.tsv_line {
            parameters.set(messages::TSV_LINE, line);
        }
        if let Some(hed_string) = &self.hed_string {
            parameters.set(messages::HED_STRING, hed_string);
        }
    }
}

/// Carrier for a single fatal issue
///
/// Only used to unwind out of a parse or registry call that cannot continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{issue}")]
pub struct IssueError {
    issue: Box<Issue>,
}

impl IssueError {
    pub fn new(issue: Issue) -> Self {
        Self {
            issue: Box::new(issue),
        }
    }

    /// Wrap an internal error message
    pub fn internal(message: impl fmt::Display) -> Self {
        Self::new(Issue::with_parameters(
            IssueCode::InternalError,
            IssueParameters::new().with("message", message),
        ))
    }

    pub fn issue(&self) -> &Issue {
        &self.issue
    }

    pub fn into_issue(self) -> Issue {
        *self.issue
    }
}

impl From<IssueError> for Issue {
    fn from(err: IssueError) -> Self {
        err.into_issue()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_strings_round_trip() {
        for code in IssueCode::KNOWN.iter() {
            assert_eq!(&IssueCode::from_code(code.as_str()), code);
        }
        assert_eq!(
            IssueCode::from_code("notACode"),
            IssueCode::Unknown("notACode".to_string())
        );
    }

    #[test]
    fn test_levels_and_hed_codes() {
        assert_eq!(IssueCode::Extension.level(), IssueLevel::Warning);
        assert_eq!(IssueCode::InvalidTag.level(), IssueLevel::Error);
        assert_eq!(IssueCode::InvalidValue.hed_code(), "VALUE_INVALID");
        assert_eq!(
            IssueCode::Unknown("x".to_string()).hed_code(),
            "GENERIC_ERROR"
        );
    }

    #[test]
    fn test_parameters_are_coerced_to_strings() {
        let params = IssueParameters::new()
            .with("index", 5)
            .with("tag", "Event")
            .with_bounds(Bounds::new(1, 4));
        assert_eq!(params.get("index"), Some("5"));
        assert_eq!(params.get_or_null("missing"), "null");
        assert_eq!(params.bounds, Some(Bounds::new(1, 4)));
    }

    #[test]
    fn test_message_regeneration_is_idempotent() {
        let mut issue = Issue::with_parameters(
            IssueCode::InvalidTag,
            IssueParameters::new().with("tag", "Foo"),
        );
        let first = issue.message().to_string();
        issue.generate_message();
        assert_eq!(issue.message(), first);

        issue.set_parameter("tag", "Bar");
        assert_eq!(issue.message(), first);
        issue.generate_message();
        assert!(issue.message().contains("\"Bar\""));
    }

    #[test]
    fn test_issue_error_wraps_one_issue() {
        let err = IssueError::new(Issue::new(IssueCode::EmptyHedString));
        assert_eq!(err.issue().internal_code(), "emptyHedString");
        assert_eq!(err.to_string(), err.issue().message());
        let issue: Issue = err.into();
        assert_eq!(issue.hed_code(), "TAG_EMPTY");
    }

    #[test]
    fn test_issue_serializes_with_camel_case_fields() {
        let issue = Issue::with_parameters(
            IssueCode::CommaMissing,
            IssueParameters::new().with("tag", "Event"),
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["internalCode"], "commaMissing");
        assert_eq!(json["hedCode"], "COMMA_MISSING");
        assert_eq!(json["level"], "error");
        assert_eq!(json["parameters"]["tag"], "Event");

        let back: Issue = serde_json::from_value(json).unwrap();
        assert_eq!(back, issue);
    }

    #[test]
    fn test_bounds_helpers() {
        let outer = Bounds::new(0, 10);
        assert!(outer.contains(&Bounds::new(2, 5)));
        assert!(!outer.contains(&Bounds::new(8, 12)));
        assert_eq!(Bounds::at(3), Bounds::new(3, 4));
        assert_eq!(Bounds::new(1, 4).slice("abcdef"), Some("bcd"));
    }
}
