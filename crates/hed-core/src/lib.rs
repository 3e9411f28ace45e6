//! HED Core
//!
//! Parsing and validation engine for HED (Hierarchical Event Descriptor)
//! annotation strings. This crate provides the annotation parser, schema-driven
//! tag resolution and value checking, definition expansion, and the issue
//! model every stage reports through.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod parser;
pub mod result;
pub mod schema;
pub mod semantic;
pub mod util;
pub mod validator;

pub use config::{ConfigLoader, ValidatorConfig};
pub use diagnostics::{
    Bounds, DatasetIssue, Issue, IssueCode, IssueContext, IssueError, IssueFilter, IssueLevel,
    IssueParameters,
};
pub use error::{ErrorKind, HedError};
pub use parser::{ParsedGroup, ParsedHedString, ParsedNode, ParsedTag, parse_hed_string};
pub use result::Result;
pub use schema::{HedSchema, SchemaDocument, SchemaIndex, TagEntry};
pub use semantic::{
    Definition, DefinitionEvaluation, DefinitionManager, TagResolver, ValueClassMatcher,
};
pub use validator::{
    DatasetValidation, DatasetValidator, FileValidation, HedEntry, HedFile, HedFileKind,
    HedStringValidator, StringValidation,
};

/// Initialize tracing/logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hed_core=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
