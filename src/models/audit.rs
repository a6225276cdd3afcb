// src/models/audit.rs

//! Audit job and result data structures.
//!
//! The audit itself runs out-of-process in the remote service; these types
//! track its lifecycle locally and survive restarts via the settings store.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted state of the current (or most recent) audit run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditJob {
    /// Whether a run has ever been started
    #[serde(default)]
    pub started: bool,

    /// Whether a run is currently tracked as executing remotely.
    /// Implies `started`.
    #[serde(default)]
    pub in_progress: bool,

    /// Remote-reported progress, 0..=100
    #[serde(default)]
    pub progress_percent: u8,

    /// When the tracked run was started
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// When a run last finished (or a cooldown was recorded)
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,

    /// Cooldown window in seconds, counted from `last_run_at`
    #[serde(default)]
    pub cooldown_secs: u64,

    /// Result of the most recently completed run
    #[serde(default)]
    pub result: Option<AuditResult>,
}

impl AuditJob {
    /// Derive the externally visible lifecycle state.
    pub fn state(&self) -> JobState {
        if self.in_progress {
            JobState::InProgress
        } else if let Some(result) = &self.result {
            if result.timed_out {
                JobState::TimedOut
            } else {
                JobState::Completed
            }
        } else {
            JobState::Idle
        }
    }

    /// Seconds left of the cooldown window, if one is active.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<u64> {
        let last_run = self.last_run_at?;
        if self.cooldown_secs == 0 {
            return None;
        }
        let elapsed = (now - last_run).num_seconds().max(0) as u64;
        let remaining = self.cooldown_secs.saturating_sub(elapsed);
        (remaining > 0).then_some(remaining)
    }

    /// Whether an in-progress run has outlived the staleness window.
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after_secs: u64) -> bool {
        if !self.in_progress {
            return false;
        }
        match self.started_at {
            Some(started_at) => {
                (now - started_at).num_seconds().max(0) as u64 > stale_after_secs
            }
            // In progress with no start timestamp is already inconsistent;
            // treat it as stale so the job cannot stay stuck.
            None => true,
        }
    }
}

/// Lifecycle state of the audit job, derived from persisted flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    InProgress,
    Completed,
    TimedOut,
}

/// What caused an audit to be considered done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTrigger {
    /// The remote service reported completion
    Remote,
    /// The staleness window elapsed with no completion signal
    Timeout,
}

/// Result of one completed audit run, superseded wholesale by each new run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditResult {
    /// Issues grouped by report topic
    #[serde(default)]
    pub issues_by_type: BTreeMap<String, Vec<Issue>>,

    /// Progress at completion (100 unless the run was cut short)
    #[serde(default)]
    pub progress_percent: u8,

    /// When the run started
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// When the run ended (or was forced to end)
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,

    /// Whether this result was synthesized by the staleness timeout
    #[serde(default)]
    pub timed_out: bool,

    /// Operator-facing note, e.g. the timeout explanation
    #[serde(default)]
    pub message: Option<String>,
}

impl AuditResult {
    /// Total number of issues across all topics.
    pub fn issue_count(&self) -> usize {
        self.issues_by_type.values().map(Vec::len).sum()
    }

    /// Number of issues at the given severity.
    pub fn count_at(&self, severity: IssueSeverity) -> usize {
        self.issues_by_type
            .values()
            .flatten()
            .filter(|issue| issue.severity == severity)
            .count()
    }
}

/// A single finding reported by the audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    /// Stable identifier, also used by the ignore registry
    pub id: String,

    /// How serious the finding is
    #[serde(default)]
    pub severity: IssueSeverity,

    /// Short human-readable description
    pub title: String,

    /// Affected URL, when the finding is page-specific
    #[serde(default)]
    pub url: Option<String>,
}

/// Severity of an audit finding.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl FromStr for IssueSeverity {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            _ => Err(()),
        }
    }
}
