//! Validator configuration structure
//!
//! ## Example Configuration (hed.yaml)
//!
//! ```yaml
//! checkWarnings: true
//! limitErrors: false
//! validateDefinitionValues: true
//! allowPlaceholders: false
//! reportUnusedDefinitions: true
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::HedError;
use crate::result::Result;

/// Options for string, file and dataset validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorConfig {
    /// Report warnings as well as errors
    pub check_warnings: bool,

    /// Collapse dataset issues to one per HED code
    pub limit_errors: bool,

    /// Check values substituted into definition placeholders against their value class
    pub validate_definition_values: bool,

    /// Accept `#` placeholders in annotation strings (sidecar value columns)
    pub allow_placeholders: bool,

    /// Warn about definitions that are declared but never referenced
    pub report_unused_definitions: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            check_warnings: true,
            limit_errors: false,
            validate_definition_values: true,
            allow_placeholders: false,
            report_unused_definitions: true,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from file
    ///
    /// The format is chosen from the extension: `.json`, `.toml`, `.yaml` or `.yml`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| HedError::io_error(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::parse(&content, ext)
    }

    /// Parse configuration text in the given format
    pub fn parse(content: &str, format: &str) -> Result<Self> {
        match format {
            "json" => serde_json::from_str(content)
                .map_err(|e| HedError::config_error(format!("Invalid JSON: {e}"))),
            "toml" => toml::from_str(content)
                .map_err(|e| HedError::config_error(format!("Invalid TOML: {e}"))),
            "yaml" | "yml" => serde_yaml::from_str(content)
                .map_err(|e| HedError::config_error(format!("Invalid YAML: {e}"))),
            other => Err(HedError::config_error(format!(
                "Unsupported configuration format '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ValidatorConfig::default();
        assert!(config.check_warnings);
        assert!(!config.limit_errors);
        assert!(config.validate_definition_values);
        assert!(!config.allow_placeholders);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ValidatorConfig::parse(r#"{"limitErrors": true}"#, "json").unwrap();
        assert!(config.limit_errors);
        assert!(config.check_warnings);
    }

    #[test]
    fn test_toml_and_yaml() {
        let toml_config = ValidatorConfig::parse("checkWarnings = false", "toml").unwrap();
        assert!(!toml_config.check_warnings);

        let yaml_config = ValidatorConfig::parse("allowPlaceholders: true\n", "yaml").unwrap();
        assert!(yaml_config.allow_placeholders);
    }

    #[test]
    fn test_unsupported_format() {
        let err = ValidatorConfig::parse("", "ini").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
