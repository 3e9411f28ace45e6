//! Dataset validation
//!
//! 1. Collect definitions from every sidecar string, merging identical
//!    redeclarations across sidecars
//! 2. Freeze the registry (and re-check it when definitions were collected
//!    under a different schema)
//! 3. Validate every file in parallel against the frozen registry
//! 4. Report definitions that no file refers to

use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::time::Instant;
use tracing::{debug, info};

use super::{FileValidation, HedFile, HedStringValidator};
use crate::config::ValidatorConfig;
use crate::diagnostics::{
    DatasetIssue, Issue, IssueCode, IssueContext, IssueFilter, IssueParameters, filter_issues,
    process_dataset_issues,
};
use crate::error::HedError;
use crate::parser::{ParsedGroup, parse_hed_string};
use crate::result::ResultExt;
use crate::schema::HedSchema;
use crate::semantic::{DefinitionManager, is_definition_group};
use crate::util::filter_non_equal_duplicates;

/// Outcome of a dataset validation
#[derive(Debug)]
pub struct DatasetValidation {
    /// All issues after warning filtering, in file order
    pub issues: Vec<Issue>,
    pub files: Vec<FileValidation>,
    /// The frozen registry the files were validated against
    pub definitions: DefinitionManager,
    filter: IssueFilter,
}

impl DatasetValidation {
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|issue| issue.is_warning())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Issues in dataset boundary form, reduced per HED code when `limitErrors` is set
    pub fn dataset_issues(&self) -> Vec<DatasetIssue> {
        process_dataset_issues(&self.issues, &self.filter)
    }
}

/// A definition declaration found in a sidecar
struct Declaration {
    group: ParsedGroup,
    context: IssueContext,
}

/// Validator for a set of files sharing one definition registry
pub struct DatasetValidator<'a> {
    schema: &'a dyn HedSchema,
    definition_schema: Option<&'a dyn HedSchema>,
    config: ValidatorConfig,
}

impl<'a> DatasetValidator<'a> {
    pub fn new(schema: &'a dyn HedSchema, config: ValidatorConfig) -> Self {
        Self {
            schema,
            definition_schema: None,
            config,
        }
    }

    /// Collect definitions under `schema` and re-check them against the main schema
    pub fn with_definition_schema(mut self, schema: &'a dyn HedSchema) -> Self {
        self.definition_schema = Some(schema);
        self
    }

    pub fn validate(&self, files: &[HedFile]) -> DatasetValidation {
        let start = Instant::now();
        info!(
            "Validating {} files against HED schema {}",
            files.len(),
            self.schema.version()
        );

        let (definitions, mut issues) = self.collect_definitions(files);

        let file_results: Vec<FileValidation> = {
            let validator = HedStringValidator::new(self.schema, &definitions, self.config.clone());
            files
                .par_iter()
                .map(|file| validator.validate_file(file))
                .collect()
        };

        for result in &file_results {
            issues.extend(result.issues.iter().cloned());
        }

        if self.config.report_unused_definitions {
            let referenced: BTreeSet<&str> = file_results
                .iter()
                .flat_map(|result| result.referenced_definitions.iter().map(String::as_str))
                .collect();
            issues.extend(unused_definitions(&definitions, &referenced));
        }

        let filter = IssueFilter::from(&self.config);
        let issues = filter_issues(issues, &filter);
        info!(
            "Completed dataset validation of {} files in {:?}: {} issues",
            files.len(),
            start.elapsed(),
            issues.len()
        );

        DatasetValidation {
            issues,
            files: file_results,
            definitions,
            filter,
        }
    }

    /// Build and freeze the definition registry from the sidecar files
    pub fn collect_definitions(&self, files: &[HedFile]) -> (DefinitionManager, Vec<Issue>) {
        let schema = self.definition_schema.unwrap_or(self.schema);
        let mut manager = DefinitionManager::new();
        let mut issues = Vec::new();

        let declarations = collect_declarations(files, schema);
        let (_, conflicting) = filter_non_equal_duplicates(
            declarations
                .iter()
                .filter_map(|declaration| {
                    DefinitionManager::declared_name(&declaration.group)
                        .map(|name| (name.to_lowercase(), declaration.group.canonical_string()))
                }),
        );
        let conflicting: HashSet<String> = conflicting.into_iter().map(|(name, _)| name).collect();

        let mut merged = HashSet::new();
        for declaration in &declarations {
            if let Some(name) = DefinitionManager::declared_name(&declaration.group) {
                let key = name.to_lowercase();
                if !conflicting.contains(&key) && !merged.insert(key) {
                    debug!("Merging identical redeclaration of definition '{}'", name);
                    continue;
                }
            }

            match manager.add_definition(&declaration.group) {
                Ok(found) => issues.extend(found.into_iter().map(|mut issue| {
                    issue.add_context(&declaration.context);
                    issue
                })),
                Err(err) => issues.push(err.into_issue()),
            }
        }
        manager.finalize();

        if let Some(definition_schema) = self.definition_schema {
            if definition_schema.version() != self.schema.version() {
                debug!(
                    "Re-checking definitions from schema {} against {}",
                    definition_schema.version(),
                    self.schema.version()
                );
                issues.extend(manager.validate_definitions(self.schema));
            }
        }

        info!("Collected {} definitions", manager.len());
        (manager, issues)
    }
}

/// Top-level definition groups of every sidecar string, in file order
fn collect_declarations(files: &[HedFile], schema: &dyn HedSchema) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    for file in files.iter().filter(|file| file.is_sidecar()) {
        for entry in &file.entries {
            // Strings that fail to parse are reported by file validation
            let Some((parsed, _)) = parse_hed_string(&entry.text, schema)
                .map_err(HedError::from)
                .log_and_continue()
            else {
                continue;
            };
            declarations.extend(
                parsed
                    .root
                    .groups()
                    .filter(|group| is_definition_group(group))
                    .map(|group| Declaration {
                        group: group.clone(),
                        context: file.context(entry),
                    }),
            );
        }
    }
    declarations
}

fn unused_definitions(definitions: &DefinitionManager, referenced: &BTreeSet<&str>) -> Vec<Issue> {
    definitions
        .definitions()
        .filter(|definition| !referenced.contains(definition.name.to_lowercase().as_str()))
        .map(|definition| {
            Issue::with_parameters(
                IssueCode::UnusedDefinition,
                IssueParameters::new().with("definition", &definition.name),
            )
        })
        .collect()
}
