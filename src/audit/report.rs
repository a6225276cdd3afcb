// src/audit/report.rs

//! Builds persisted audit results from raw remote findings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::audit::remote::RemoteIssue;
use crate::models::{AuditResult, Issue, IssueSeverity};
use crate::utils::time::humanize_secs;

const UNGROUPED_TOPIC: &str = "general";

/// Group raw findings by report topic, preserving remote order within each.
pub fn group_issues(issues: Vec<RemoteIssue>) -> BTreeMap<String, Vec<Issue>> {
    let mut grouped: BTreeMap<String, Vec<Issue>> = BTreeMap::new();
    for issue in issues {
        let topic = if issue.topic.is_empty() {
            UNGROUPED_TOPIC.to_string()
        } else {
            issue.topic
        };
        grouped.entry(topic).or_default().push(Issue {
            id: issue.id,
            severity: issue.severity,
            title: issue.title,
            url: issue.url,
        });
    }
    grouped
}

/// Build the result for a run the remote service finished.
pub fn completed_result(
    issues: Vec<RemoteIssue>,
    started_at: Option<DateTime<Utc>>,
    ended_at: DateTime<Utc>,
) -> AuditResult {
    AuditResult {
        issues_by_type: group_issues(issues),
        progress_percent: 100,
        started_at,
        ended_at: Some(ended_at),
        timed_out: false,
        message: None,
    }
}

/// Synthesize the result for a run that outlived the staleness window.
///
/// Treated as a normal completion everywhere downstream; only the flag and
/// message mark it as forced.
pub fn timeout_result(
    started_at: Option<DateTime<Utc>>,
    ended_at: DateTime<Utc>,
    progress_percent: u8,
    stale_after_secs: u64,
) -> AuditResult {
    AuditResult {
        issues_by_type: BTreeMap::new(),
        progress_percent,
        started_at,
        ended_at: Some(ended_at),
        timed_out: true,
        message: Some(format!(
            "The audit did not report back within {} and was marked as timed out.",
            humanize_secs(stale_after_secs)
        )),
    }
}

/// One-line-per-topic summary with severity counts, for operator output.
pub fn summary_lines(result: &AuditResult) -> Vec<String> {
    let mut lines = vec![format!(
        "{} issues ({} critical, {} warnings)",
        result.issue_count(),
        result.count_at(IssueSeverity::Critical),
        result.count_at(IssueSeverity::Warning),
    )];
    for (topic, issues) in &result.issues_by_type {
        lines.push(format!("  {}: {}", topic, issues.len()));
    }
    lines
}
