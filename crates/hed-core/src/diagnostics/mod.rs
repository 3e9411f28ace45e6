//! Diagnostics for HED validation
//!
//! This module provides the issue model every other component reports through:
//! - Typed issue codes with HED codes, levels and message templates
//! - Offset-preserving bounds into the original annotation string
//! - Severity split, categorization, filtering and per-code reduction
//! - The dataset boundary form ([`DatasetIssue`])

pub mod collect;
pub mod issue;
pub mod messages;

pub use collect::{
    DatasetIssue, IssueFilter, categorize_by_code, filter_issues, process_dataset_issues,
    reduce_dataset_issues, split_by_severity,
};
pub use issue::{
    Bounds, Issue, IssueCode, IssueContext, IssueError, IssueLevel, IssueParameters,
};
pub use messages::documentation_link;
