use std::time::Duration;

use super::domain::{ImportJob, JobId};
use crate::api::TransportError;

/// Pre-flight rejection of an upload. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no file name was provided for the upload")]
    MissingFileName,
    #[error("{file_name} is empty")]
    EmptyFile { file_name: String },
    #[error("{file_name} is not an accepted import file (accepted extensions: {})", .accepted.join(", "))]
    UnsupportedExtension {
        file_name: String,
        accepted: Vec<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("import job {job_id} failed: {detail}")]
    JobFailed { job_id: JobId, detail: String },
    /// The client stopped waiting; the backend may still be processing.
    #[error("stopped waiting for import job {} after {:?}; last observed state {}", .job.job_id(), .waited, .job.state())]
    Timeout { job: Box<ImportJob>, waited: Duration },
    #[error("wait for import job {} was cancelled", .job.job_id())]
    Cancelled { job: Box<ImportJob> },
}

impl ImportError {
    /// Last known projection of the job, for errors raised after submission.
    pub fn last_known_job(&self) -> Option<&ImportJob> {
        match self {
            ImportError::Timeout { job, .. } | ImportError::Cancelled { job } => Some(job),
            _ => None,
        }
    }
}
