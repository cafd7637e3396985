use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ImportError;

/// Shown when the backend reports a failure without explaining it.
pub const GENERIC_FAILURE_DETAIL: &str = "import failed without a reported reason";

/// Backend-issued job identifier. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Target entity collection of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Properties,
    Auctions,
}

impl ImportKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Properties => "properties",
            Self::Auctions => "auctions",
        }
    }

    pub const fn upload_path(self) -> &'static str {
        match self {
            Self::Properties => "admin/import-properties",
            Self::Auctions => "admin/import-auctions",
        }
    }
}

impl FromStr for ImportKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "properties" | "property" => Ok(Self::Properties),
            "auctions" | "auction" => Ok(Self::Auctions),
            other => Err(format!(
                "unknown import kind '{other}' (expected properties or auctions)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Submitted,
    Running,
    Succeeded,
    Failed,
    /// No terminal state confirmed and the latest response was not recognizable.
    Unknown,
}

impl JobState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }

    /// Lifecycle position; `Unknown` carries no progress information.
    const fn rank(self) -> Option<u8> {
        match self {
            Self::Submitted => Some(0),
            Self::Running => Some(1),
            Self::Succeeded | Self::Failed => Some(2),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Server status string mapped onto the closed local vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    Submitted,
    Running,
    Succeeded { summary: Option<String> },
    Failed { detail: Option<String> },
    Unrecognized(String),
}

impl ServerStatus {
    /// Accepts bare words (`pending`, `processing`) and the backend's `word: message` form
    /// (`success: 120 rows processed`, `error: missing parcel_id column`).
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (head, message) = match trimmed.split_once(':') {
            Some((head, tail)) => {
                let tail = tail.trim();
                (head.trim(), (!tail.is_empty()).then(|| tail.to_string()))
            }
            None => (trimmed, None),
        };

        match head.to_ascii_lowercase().as_str() {
            "pending" | "queued" | "submitted" => Self::Submitted,
            "processing" | "running" | "in_progress" | "in progress" => Self::Running,
            "success" | "succeeded" | "completed" | "complete" | "done" => {
                Self::Succeeded { summary: message }
            }
            "error" | "failed" | "failure" => Self::Failed { detail: message },
            _ => Self::Unrecognized(trimmed.to_string()),
        }
    }

    pub fn state(&self) -> JobState {
        match self {
            Self::Submitted => JobState::Submitted,
            Self::Running => JobState::Running,
            Self::Succeeded { .. } => JobState::Succeeded,
            Self::Failed { .. } => JobState::Failed,
            Self::Unrecognized(_) => JobState::Unknown,
        }
    }
}

/// A status read stamped with the instant its request was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusObservation {
    pub status: ServerStatus,
    pub requested_at: DateTime<Utc>,
}

impl StatusObservation {
    pub fn new(status: ServerStatus, requested_at: DateTime<Utc>) -> Self {
        Self {
            status,
            requested_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Issued before the last applied observation.
    Stale,
    /// Would move the job back to an earlier lifecycle stage.
    Regression,
    AlreadyTerminal,
}

/// Client-side projection of a backend import job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportJob {
    job_id: JobId,
    kind: ImportKind,
    state: JobState,
    submitted_at: DateTime<Utc>,
    last_observed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip)]
    high_water: u8,
}

impl ImportJob {
    pub fn submitted(job_id: JobId, kind: ImportKind, at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            kind,
            state: JobState::Submitted,
            submitted_at: at,
            last_observed_at: at,
            error_detail: None,
            summary: None,
            high_water: 0,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn kind(&self) -> ImportKind {
        self.kind
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn last_observed_at(&self) -> DateTime<Utc> {
        self.last_observed_at
    }

    /// Present only once the job has failed.
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Apply a status read.
    ///
    /// Terminal states are final and the lifecycle never moves backwards. A read issued
    /// before `last_observed_at` is discarded unless it proves the job got further than
    /// currently known; it never moves `last_observed_at` back.
    pub fn apply(&mut self, observation: StatusObservation) -> ApplyOutcome {
        if self.state.is_terminal() {
            return ApplyOutcome::AlreadyTerminal;
        }

        let stale = observation.requested_at < self.last_observed_at;
        let next = observation.status.state();
        match next.rank() {
            Some(rank) if rank < self.high_water => return ApplyOutcome::Regression,
            Some(rank) if stale && rank == self.high_water => return ApplyOutcome::Stale,
            None if stale => return ApplyOutcome::Stale,
            Some(rank) => self.high_water = rank,
            None => {}
        }

        self.state = next;
        if !stale {
            self.last_observed_at = observation.requested_at;
        }
        match observation.status {
            ServerStatus::Failed { detail } => {
                self.error_detail =
                    Some(detail.unwrap_or_else(|| GENERIC_FAILURE_DETAIL.to_string()));
            }
            ServerStatus::Succeeded { summary } => self.summary = summary,
            _ => {}
        }

        ApplyOutcome::Applied
    }

    /// Merge another projection of the same job, e.g. from a concurrent poll.
    pub fn reconcile(&mut self, other: &ImportJob) -> ApplyOutcome {
        if other.job_id != self.job_id {
            return ApplyOutcome::Stale;
        }
        if self.state.is_terminal() {
            return ApplyOutcome::AlreadyTerminal;
        }
        if other.high_water < self.high_water {
            return ApplyOutcome::Regression;
        }
        if other.last_observed_at < self.last_observed_at && other.high_water == self.high_water
        {
            return ApplyOutcome::Stale;
        }

        let last_observed_at = self.last_observed_at.max(other.last_observed_at);
        *self = other.clone();
        self.last_observed_at = last_observed_at;
        ApplyOutcome::Applied
    }

    /// Convert a terminal failure into [`ImportError::JobFailed`].
    pub fn into_result(self) -> Result<Self, ImportError> {
        if self.state == JobState::Failed {
            let detail = self
                .error_detail
                .unwrap_or_else(|| GENERIC_FAILURE_DETAIL.to_string());
            return Err(ImportError::JobFailed {
                job_id: self.job_id,
                detail,
            });
        }
        Ok(self)
    }
}
