//! Message templates for issue codes

use super::issue::{IssueCode, IssueLevel, IssueParameters};

/// Context parameter naming the file an issue came from
pub const FILE_PATH: &str = "filePath";
/// Context parameter naming the sidecar key an annotation came from
pub const SIDECAR_KEY: &str = "sidecarKey";
/// Context parameter holding the TSV line number
pub const TSV_LINE: &str = "tsvLine";
/// Context parameter holding the full annotation string
pub const HED_STRING: &str = "hedString";

const SPEC_APPENDIX_URL: &str = "https://hed-specification.readthedocs.io/en/latest/Appendix_B.html";

/// Render the full message for an issue
///
/// Template text first, then the sidecar key, TSV line and HED string
/// suffixes (in that order, when present), then the documentation link.
pub(crate) fn render(code: &IssueCode, level: IssueLevel, params: &IssueParameters) -> String {
    let mut message = template(code, params);

    if let Some(key) = params.get(SIDECAR_KEY) {
        message.push_str(&format!(" Sidecar key: \"{key}\"."));
    }
    if let Some(line) = params.get(TSV_LINE) {
        message.push_str(&format!(" TSV line: {line}."));
    }
    if let Some(hed_string) = params.get(HED_STRING) {
        message.push_str(&format!(" HED string: \"{hed_string}\"."));
    }

    format!(
        "{message} For more information on this HED {level}, see {}",
        documentation_link(code.hed_code())
    )
}

/// Link to the documentation anchor of a HED code
pub fn documentation_link(hed_code: &str) -> String {
    let anchor = hed_code.to_lowercase().replace('_', "-");
    format!("{SPEC_APPENDIX_URL}#{anchor}")
}

fn template(code: &IssueCode, p: &IssueParameters) -> String {
    let v = |key: &'static str| p.get_or_null(key);
    match code {
        IssueCode::EmptyHedString => "The HED string is empty.".to_string(),
        IssueCode::EmptyTagFound => format!(
            "Empty tag at index {} of string \"{}\".",
            v("index"),
            v("string")
        ),
        IssueCode::EmptyTagGroup => format!(
            "Empty tag group at index {} of string \"{}\".",
            v("index"),
            v("string")
        ),
        IssueCode::UnopenedParenthesis => format!(
            "Closing parenthesis at index {} of string \"{}\" does not have a corresponding opening parenthesis.",
            v("index"),
            v("string")
        ),
        IssueCode::UnclosedParenthesis => format!(
            "Opening parenthesis at index {} of string \"{}\" does not have a corresponding closing parenthesis.",
            v("index"),
            v("string")
        ),
        IssueCode::CommaMissing => format!("Comma missing after - \"{}\".", v("tag")),
        IssueCode::InvalidCharacter => format!(
            "Invalid character \"{}\" at index {} of string \"{}\".",
            v("character"),
            v("index"),
            v("string")
        ),
        IssueCode::ExtraSlash => format!(
            "Tag \"{}\" has a leading, trailing, or repeated slash.",
            v("tag")
        ),
        IssueCode::InvalidTag => format!("Invalid tag - \"{}\".", v("tag")),
        IssueCode::AmbiguousTag => format!(
            "Short tag \"{}\" is ambiguous - it matches \"{}\". Add parent nodes to disambiguate.",
            v("tag"),
            v("candidates")
        ),
        IssueCode::InvalidParentNode => format!(
            "Tag \"{}\" has parent nodes that do not match its schema path \"{}\".",
            v("tag"),
            v("parentTag")
        ),
        IssueCode::InvalidExtension => format!(
            "Tag extension \"{}\" of \"{}\" is not allowed.",
            v("extension"),
            v("tag")
        ),
        IssueCode::Extension => format!("Tag extension found - \"{}\".", v("tag")),
        IssueCode::ChildRequired => format!("Descendant tag required - \"{}\".", v("tag")),
        IssueCode::DuplicateTag => format!("Duplicate tag - \"{}\".", v("tag")),
        IssueCode::MultipleUniqueTags => {
            format!("Multiple unique tags with prefix - \"{}\".", v("tag"))
        }
        IssueCode::InvalidValue => format!(
            "Value \"{}\" of tag \"{}\" is not allowed by value class \"{}\".",
            v("value"),
            v("tag"),
            v("valueClass")
        ),
        IssueCode::ValueIsSchemaTerm => format!(
            "Value \"{}\" of tag \"{}\" is also a schema tag and was treated as a value.",
            v("value"),
            v("tag")
        ),
        IssueCode::InvalidUnit => format!(
            "Unit \"{}\" of tag \"{}\" is not allowed - valid units are \"{}\".",
            v("unit"),
            v("tag"),
            v("units")
        ),
        IssueCode::InvalidPlaceholder => format!("Invalid placeholder in tag \"{}\".", v("tag")),
        IssueCode::DuplicateDefinition => format!(
            "Definition \"{}\" is declared multiple times. This instance's definition will be ignored.",
            v("definition")
        ),
        IssueCode::MultiplePlaceholdersInDefinition => format!(
            "Definition \"{}\" has multiple placeholders.",
            v("definition")
        ),
        IssueCode::InvalidDefinition => format!(
            "Definition \"{}\" is malformed - {}.",
            v("definition"),
            v("reason")
        ),
        IssueCode::IllegalDefinitionContext => format!(
            "Definition \"{}\" may only appear in a sidecar definition context.",
            v("definition")
        ),
        IssueCode::UnusedDefinition => format!(
            "Definition \"{}\" is declared but never used.",
            v("definition")
        ),
        IssueCode::MissingDefinitionForDef => format!(
            "Def tag found for definition \"{}\", which does not exist.",
            v("definition")
        ),
        IssueCode::MissingDefinitionForDefExpand => format!(
            "Def-expand tag found for definition \"{}\", which does not exist.",
            v("definition")
        ),
        IssueCode::MissingDefinitionValue => format!(
            "Definition \"{}\" requires a placeholder value, but \"{}\" does not supply one.",
            v("definition"),
            v("tag")
        ),
        IssueCode::UnexpectedDefinitionValue => format!(
            "Definition \"{}\" has no placeholder, but \"{}\" supplies the value \"{}\".",
            v("definition"),
            v("tag"),
            v("value")
        ),
        IssueCode::DefExpandContentsInvalid => format!(
            "Contents of the Def-expand group for definition \"{}\" do not match the definition - expected \"{}\".",
            v("definition"),
            v("expected")
        ),
        IssueCode::EmptyDefinitionExpansion => format!(
            "Def-expand of definition \"{}\" has no contents to expand. Use \"Def/{}\" instead.",
            v("definition"),
            v("definition")
        ),
        IssueCode::InternalError => format!("Internal error - \"{}\".", v("message")),
        IssueCode::GenericError => format!(
            "Unknown HED error \"{}\" - parameters: \"{}\".",
            v("internalCode"),
            v("parameters")
        ),
        IssueCode::Unknown(internal_code) => {
            let raw: serde_json::Map<String, serde_json::Value> = p
                .iter()
                .map(|(k, val)| (k.to_string(), serde_json::Value::String(val.to_string())))
                .collect();
            format!(
                "Unknown HED error \"{}\" - parameters: \"{}\".",
                internal_code,
                serde_json::Value::Object(raw)
            )
        }
    }
}
