//! Reconciliation report types
//!
//! Per-operation outcomes collected while a batch of intents is applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::naming::Container;

/// Result of a single directory operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    /// The entry was written.
    Created,
    /// The entry already existed; nothing was written.
    AlreadyPresent,
    /// An existing entry was changed.
    Modified,
    /// The entry was already in the requested state.
    NoOp,
    /// The primary target of the operation does not exist.
    NotFound(String),
    /// The operation failed.
    Failed(String),
}

impl Outcome {
    /// Whether the outcome should count against the batch.
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::NotFound(_) | Outcome::Failed(_))
    }

    /// Whether the entity exists after the operation.
    pub fn is_present(&self) -> bool {
        matches!(self, Outcome::Created | Outcome::AlreadyPresent)
    }

    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Outcome::Failed(reason.to_string())
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::AlreadyPresent => write!(f, "already-present"),
            Outcome::Modified => write!(f, "modified"),
            Outcome::NoOp => write!(f, "no-op"),
            Outcome::NotFound(reason) => write!(f, "not-found: {}", reason),
            Outcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// The operation a report entry describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    EnsureContainer { container: Container },
    AddUser { uid: String },
    AddGroup { identifier: String },
    AddUserToGroup { uid: String, group: String },
    RemoveUserFromGroup { uid: String, group: String },
    ModifyUserGroups { uid: String },
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::EnsureContainer { container } => write!(f, "ensure container '{}'", container),
            Operation::AddUser { uid } => write!(f, "add user '{}'", uid),
            Operation::AddGroup { identifier } => write!(f, "add group '{}'", identifier),
            Operation::AddUserToGroup { uid, group } => {
                write!(f, "add '{}' to group '{}'", uid, group)
            }
            Operation::RemoveUserFromGroup { uid, group } => {
                write!(f, "remove '{}' from group '{}'", uid, group)
            }
            Operation::ModifyUserGroups { uid } => write!(f, "modify groups of '{}'", uid),
        }
    }
}

/// An operation together with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub operation: Operation,
    pub outcome: Outcome,
}

impl Step {
    pub fn new(operation: Operation, outcome: Outcome) -> Self {
        Self { operation, outcome }
    }
}

/// Result of a batch membership change: the aggregate plus every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipChange {
    pub outcome: Outcome,
    pub steps: Vec<Step>,
}

/// One line of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Position of the originating intent (0-based).
    pub intent: usize,
    #[serde(flatten)]
    pub step: Step,
}

/// Outcome counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub created: usize,
    pub already_present: usize,
    pub modified: usize,
    pub no_op: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl ReportSummary {
    fn count(&mut self, outcome: &Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::AlreadyPresent => self.already_present += 1,
            Outcome::Modified => self.modified += 1,
            Outcome::NoOp => self.no_op += 1,
            Outcome::NotFound(_) => self.not_found += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Complete report of one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Run ID.
    pub id: Uuid,
    /// Number of intents submitted.
    pub intents: usize,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub summary: ReportSummary,
    pub entries: Vec<ReportEntry>,
}

impl ReconciliationReport {
    /// Start an empty report.
    pub fn new(intents: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            intents,
            started_at: Utc::now(),
            completed_at: None,
            summary: ReportSummary::default(),
            entries: Vec::new(),
        }
    }

    /// Record an outcome for the intent at `intent`.
    pub fn record(&mut self, intent: usize, operation: Operation, outcome: Outcome) {
        self.push(intent, Step::new(operation, outcome));
    }

    pub fn push(&mut self, intent: usize, step: Step) {
        self.summary.count(&step.outcome);
        self.entries.push(ReportEntry { intent, step });
    }

    /// Mark the run as finished.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Check if any operation failed or missed its target.
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0 || self.summary.not_found > 0
    }

    /// Get only the unsuccessful entries.
    pub fn failed_entries(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| e.step.outcome.is_error())
    }

    /// Entries produced by the intent at `intent`.
    pub fn entries_for(&self, intent: usize) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.intent == intent)
    }

    /// Run duration, once completed.
    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}
