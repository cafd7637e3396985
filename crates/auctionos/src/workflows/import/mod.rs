//! Bulk CSV import jobs: pre-flight validation, upload, and status tracking until the
//! backend worker reports a terminal outcome.

pub mod domain;
mod error;
pub mod gateway;
mod manager;
mod scheduler;
mod upload;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplyOutcome, ImportJob, ImportKind, JobId, JobState, ServerStatus, StatusObservation,
    GENERIC_FAILURE_DETAIL,
};
pub use error::{ImportError, ValidationError};
pub use gateway::{HttpImportGateway, ImportGateway, StatusReport, SubmitReceipt};
pub use manager::{ImportJobManager, WaitOptions};
pub use scheduler::{Scheduler, TokioScheduler};
pub use upload::{ImportFile, UploadPolicy};
