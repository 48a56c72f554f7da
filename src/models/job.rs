use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Job status as reported by the pipeline service.
///
/// The service is not consistent about the status it returns on submission
/// (`queued`, `submitted`, `pending` all appear), so every non-terminal value
/// is accepted and unrecognised strings fall into `Unknown`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Submitted,
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Client state this wire status moves an accepted job into.
    pub fn client_state(self) -> JobState {
        match self {
            JobStatus::Completed => JobState::Completed,
            JobStatus::Failed => JobState::Failed,
            _ => JobState::Processing,
        }
    }
}

/// Lifecycle state of the locally tracked job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobState {
    #[default]
    Idle,
    Submitted,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    /// `Submitted` or `Processing`: a job is in flight and blocks re-submission.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Submitted | JobState::Processing)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// An externally executed extraction job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub result: Option<serde_json::Value>,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            result: None,
            submitted_at: Utc::now(),
        }
    }
}

/// Point-in-time view of the tracker, handed to observers.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct JobSnapshot {
    pub state: JobState,
    pub job: Option<Job>,
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn job_id(&self) -> Option<&str> {
        self.job.as_ref().map(|j| j.id.as_str())
    }

    pub fn result(&self) -> Option<&serde_json::Value> {
        self.job.as_ref().and_then(|j| j.result.as_ref())
    }
}

/// Response from `POST /v1/ocr/schema`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// Response from `GET /v1/ocr/results/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResultResponse {
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}
