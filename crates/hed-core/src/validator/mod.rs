//! Validation orchestrators
//!
//! [`HedStringValidator`] validates single annotation strings and the
//! annotations of one file; [`DatasetValidator`] collects definitions from
//! sidecars, validates every file in parallel and reports dataset-level
//! findings such as unused definitions.

pub mod dataset;
pub mod string;

pub use dataset::{DatasetValidation, DatasetValidator};
pub use string::{HedStringValidator, StringOptions, StringValidation};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::diagnostics::{Issue, IssueContext};

/// Kind of file an annotation comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HedFileKind {
    /// JSON sidecar; may declare definitions and use `#` placeholders
    Sidecar,
    /// Event or other tabular file
    Tabular,
}

/// One annotation string with its location inside a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HedEntry {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsv_line: Option<usize>,
}

impl HedEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sidecar_key: None,
            tsv_line: None,
        }
    }

    pub fn with_sidecar_key(mut self, key: impl Into<String>) -> Self {
        self.sidecar_key = Some(key.into());
        self
    }

    pub fn with_tsv_line(mut self, line: usize) -> Self {
        self.tsv_line = Some(line);
        self
    }
}

/// Annotation strings extracted from one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HedFile {
    pub path: String,
    pub kind: HedFileKind,
    #[serde(default)]
    pub entries: Vec<HedEntry>,
}

impl HedFile {
    pub fn sidecar(path: impl Into<String>, entries: Vec<HedEntry>) -> Self {
        Self {
            path: path.into(),
            kind: HedFileKind::Sidecar,
            entries,
        }
    }

    pub fn tabular(path: impl Into<String>, entries: Vec<HedEntry>) -> Self {
        Self {
            path: path.into(),
            kind: HedFileKind::Tabular,
            entries,
        }
    }

    pub fn is_sidecar(&self) -> bool {
        self.kind == HedFileKind::Sidecar
    }

    /// Issue context for one of this file's entries
    pub fn context(&self, entry: &HedEntry) -> IssueContext {
        let mut context = IssueContext::new()
            .with_file_path(&self.path)
            .with_hed_string(&entry.text);
        if let Some(key) = &entry.sidecar_key {
            context = context.with_sidecar_key(key);
        }
        if let Some(line) = entry.tsv_line {
            context = context.with_tsv_line(line);
        }
        context
    }
}

/// Issues found in one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileValidation {
    pub path: String,
    pub issues: Vec<Issue>,
    /// Lower-cased names of the definitions the file refers to
    pub referenced_definitions: BTreeSet<String>,
}

impl FileValidation {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }
}
