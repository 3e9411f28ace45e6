//! Issue list utilities: severity split, categorization, filtering and reduction

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::issue::{Issue, IssueLevel};
use super::messages;
use crate::config::ValidatorConfig;

/// Split issues into `(errors, warnings)`, preserving order
pub fn split_by_severity(issues: impl IntoIterator<Item = Issue>) -> (Vec<Issue>, Vec<Issue>) {
    issues.into_iter().partition(Issue::is_error)
}

/// Group issues by HED code, in order of first appearance
pub fn categorize_by_code(issues: impl IntoIterator<Item = Issue>) -> IndexMap<String, Vec<Issue>> {
    let mut categories: IndexMap<String, Vec<Issue>> = IndexMap::new();
    for issue in issues {
        categories
            .entry(issue.hed_code().to_string())
            .or_default()
            .push(issue);
    }
    categories
}

/// Options controlling which issues are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueFilter {
    /// Keep warnings
    pub check_warnings: bool,
    /// Collapse issues to one per HED code
    pub limit_errors: bool,
}

impl Default for IssueFilter {
    fn default() -> Self {
        Self {
            check_warnings: true,
            limit_errors: false,
        }
    }
}

impl From<&ValidatorConfig> for IssueFilter {
    fn from(config: &ValidatorConfig) -> Self {
        Self {
            check_warnings: config.check_warnings,
            limit_errors: config.limit_errors,
        }
    }
}

/// Drop warnings unless the filter asks for them
pub fn filter_issues(issues: Vec<Issue>, filter: &IssueFilter) -> Vec<Issue> {
    if filter.check_warnings {
        issues
    } else {
        issues.into_iter().filter(Issue::is_error).collect()
    }
}

/// Boundary form of an issue consumed by dataset-level tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetIssue {
    /// `HED_ERROR` or `HED_WARNING`
    pub code: String,
    /// HED code of the underlying issue
    pub sub_code: String,
    pub severity: IssueLevel,
    pub issue_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl DatasetIssue {
    pub fn from_issue(issue: &Issue) -> Self {
        let code = match issue.level() {
            IssueLevel::Error => "HED_ERROR",
            IssueLevel::Warning => "HED_WARNING",
        };
        let params = issue.parameters();
        Self {
            code: code.to_string(),
            sub_code: issue.hed_code().to_string(),
            severity: issue.level(),
            issue_message: issue.message().to_string(),
            line: params
                .get(messages::TSV_LINE)
                .and_then(|line| line.parse().ok()),
            location: params.get(messages::FILE_PATH).map(str::to_string),
        }
    }
}

impl From<&Issue> for DatasetIssue {
    fn from(issue: &Issue) -> Self {
        Self::from_issue(issue)
    }
}

/// Keep the first issue per HED code and append an aggregate count
///
/// Lossy: only the first instance keeps its location context.
pub fn reduce_dataset_issues(issues: &[DatasetIssue]) -> Vec<DatasetIssue> {
    struct Group<'a> {
        first: &'a DatasetIssue,
        count: usize,
        files: IndexSet<Option<&'a str>>,
    }

    let mut groups: IndexMap<&str, Group<'_>> = IndexMap::new();
    for issue in issues {
        let group = groups.entry(issue.sub_code.as_str()).or_insert(Group {
            first: issue,
            count: 0,
            files: IndexSet::new(),
        });
        group.count += 1;
        group.files.insert(issue.location.as_deref());
    }

    groups
        .into_values()
        .map(|group| {
            let mut reduced = group.first.clone();
            reduced.issue_message.push_str(&format!(
                " There are {} total {} {}s in {} files.",
                group.count,
                reduced.sub_code,
                reduced.severity,
                group.files.len()
            ));
            reduced
        })
        .collect()
}

/// Convert issues to the dataset boundary form, applying the filter options
pub fn process_dataset_issues(issues: &[Issue], filter: &IssueFilter) -> Vec<DatasetIssue> {
    let converted: Vec<DatasetIssue> = issues
        .iter()
        .filter(|issue| filter.check_warnings || issue.is_error())
        .map(DatasetIssue::from_issue)
        .collect();

    if filter.limit_errors {
        reduce_dataset_issues(&converted)
    } else {
        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{IssueCode, IssueContext, IssueParameters};

    fn issue_in(code: IssueCode, file: &str) -> Issue {
        let mut issue =
            Issue::with_parameters(code, IssueParameters::new().with("tag", "Event"));
        issue.add_context(&IssueContext::new().with_file_path(file).with_tsv_line(2));
        issue
    }

    #[test]
    fn test_split_by_severity() {
        let issues = vec![
            Issue::new(IssueCode::InvalidTag),
            Issue::new(IssueCode::Extension),
            Issue::new(IssueCode::CommaMissing),
        ];
        let (errors, warnings) = split_by_severity(issues);
        assert_eq!(errors.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].internal_code(), "extension");
    }

    #[test]
    fn test_categorize_by_code_keeps_first_appearance_order() {
        let issues = vec![
            Issue::new(IssueCode::InvalidTag),
            Issue::new(IssueCode::CommaMissing),
            Issue::new(IssueCode::AmbiguousTag),
        ];
        let categories = categorize_by_code(issues);
        let keys: Vec<_> = categories.keys().cloned().collect();
        assert_eq!(keys, vec!["TAG_INVALID", "COMMA_MISSING"]);
        assert_eq!(categories["TAG_INVALID"].len(), 2);
    }

    #[test]
    fn test_filter_drops_warnings() {
        let issues = vec![
            Issue::new(IssueCode::InvalidTag),
            Issue::new(IssueCode::Extension),
        ];
        let filter = IssueFilter {
            check_warnings: false,
            limit_errors: false,
        };
        assert_eq!(filter_issues(issues, &filter).len(), 1);
    }

    #[test]
    fn test_dataset_issue_adapter() {
        let issue = issue_in(IssueCode::Extension, "sub-01_events.tsv");
        let adapted = DatasetIssue::from_issue(&issue);
        assert_eq!(adapted.code, "HED_WARNING");
        assert_eq!(adapted.sub_code, "TAG_EXTENDED");
        assert_eq!(adapted.line, Some(2));
        assert_eq!(adapted.location.as_deref(), Some("sub-01_events.tsv"));

        let json = serde_json::to_value(&adapted).unwrap();
        assert_eq!(json["subCode"], "TAG_EXTENDED");
        assert_eq!(json["severity"], "warning");
        assert!(json.get("issueMessage").is_some());
    }

    #[test]
    fn test_reduce_keeps_first_and_counts_files() {
        let issues: Vec<DatasetIssue> = vec![
            issue_in(IssueCode::InvalidTag, "a.tsv"),
            issue_in(IssueCode::InvalidTag, "b.tsv"),
            issue_in(IssueCode::InvalidTag, "a.tsv"),
            issue_in(IssueCode::CommaMissing, "c.tsv"),
        ]
        .iter()
        .map(DatasetIssue::from_issue)
        .collect();

        let reduced = reduce_dataset_issues(&issues);
        assert_eq!(reduced.len(), 2);
        assert_eq!(reduced[0].location.as_deref(), Some("a.tsv"));
        assert!(
            reduced[0]
                .issue_message
                .ends_with(" There are 3 total TAG_INVALID errors in 2 files.")
        );
        assert!(
            reduced[1]
                .issue_message
                .ends_with(" There are 1 total COMMA_MISSING errors in 1 files.")
        );
    }

    #[test]
    fn test_process_applies_both_options() {
        let issues = vec![
            issue_in(IssueCode::InvalidTag, "a.tsv"),
            issue_in(IssueCode::Extension, "a.tsv"),
            issue_in(IssueCode::InvalidTag, "b.tsv"),
        ];
        let all = process_dataset_issues(&issues, &IssueFilter::default());
        assert_eq!(all.len(), 3);

        let limited = process_dataset_issues(
            &issues,
            &IssueFilter {
                check_warnings: false,
                limit_errors: true,
            },
        );
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].sub_code, "TAG_INVALID");
    }
}
