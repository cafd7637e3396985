use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::domain::{
    ApplyOutcome, ImportJob, ImportKind, JobId, ServerStatus, StatusObservation,
};
use super::error::ImportError;
use super::gateway::{HttpImportGateway, ImportGateway};
use super::scheduler::{elapsed_since, Scheduler, TokioScheduler};
use super::upload::{ImportFile, UploadPolicy};
use crate::api::{ApiClient, TransportError};

/// Cadence and budget for [`ImportJobManager::await_terminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl WaitOptions {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    pub fn from_millis(poll_interval_ms: u64, timeout_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(poll_interval_ms),
            Duration::from_millis(timeout_ms),
        )
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::from_millis(2_000, 600_000)
    }
}

/// Floor applied to the poll interval so a zero interval cannot spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

enum PollStep {
    Cancelled,
    Deadline,
    Observed(Result<StatusObservation, TransportError>),
}

/// Submits import files and tracks the resulting backend jobs.
///
/// Each call works on the job value it is handed; nothing is shared between jobs, so
/// independent waits can run concurrently.
pub struct ImportJobManager<G> {
    gateway: Arc<G>,
    scheduler: Arc<dyn Scheduler>,
    policy: UploadPolicy,
}

impl ImportJobManager<HttpImportGateway> {
    pub fn over_http(api: ApiClient, policy: UploadPolicy) -> Self {
        Self::new(
            Arc::new(HttpImportGateway::new(api)),
            Arc::new(TokioScheduler),
            policy,
        )
    }
}

impl<G> ImportJobManager<G>
where
    G: ImportGateway + 'static,
{
    pub fn new(gateway: Arc<G>, scheduler: Arc<dyn Scheduler>, policy: UploadPolicy) -> Self {
        Self {
            gateway,
            scheduler,
            policy,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validate and upload `file`; the job exists only if this returns `Ok`.
    pub async fn submit(
        &self,
        file: ImportFile,
        kind: ImportKind,
    ) -> Result<ImportJob, ImportError> {
        self.policy.validate(&file)?;

        info!(
            file = file.file_name(),
            bytes = file.len(),
            kind = kind.label(),
            "uploading import file"
        );
        let receipt = self.gateway.upload(kind, file).await?;
        let job = ImportJob::submitted(receipt.job_id, kind, self.scheduler.now());
        info!(
            job_id = %job.job_id(),
            kind = kind.label(),
            status = %receipt.status,
            "import job submitted"
        );

        Ok(job)
    }

    /// Start tracking a job submitted elsewhere, such as by an earlier run.
    pub fn track(&self, job_id: JobId, kind: ImportKind) -> ImportJob {
        ImportJob::submitted(job_id, kind, self.scheduler.now())
    }

    /// Read the job's current status, surfacing transport failures.
    pub async fn try_poll(&self, job: &ImportJob) -> Result<ImportJob, TransportError> {
        let observation = self.observe(job).await?;
        let mut next = job.clone();
        let outcome = next.apply(observation);
        if outcome != ApplyOutcome::Applied {
            debug!(job_id = %job.job_id(), ?outcome, "discarded status observation");
        }
        Ok(next)
    }

    /// Read the job's current status. Transport failures leave the job as it was.
    pub async fn poll(&self, job: &ImportJob) -> ImportJob {
        match self.try_poll(job).await {
            Ok(next) => next,
            Err(err) => {
                warn!(
                    job_id = %job.job_id(),
                    state = %job.state(),
                    error = %err,
                    "status poll failed; keeping last known state"
                );
                job.clone()
            }
        }
    }

    /// Poll until the job is terminal, the timeout elapses, or `cancel` fires.
    ///
    /// Both `Succeeded` and `Failed` return `Ok`; use [`ImportJob::into_result`] to turn a
    /// failure into an error. Timeout and cancellation carry the last applied job and do
    /// not imply the backend job failed.
    pub async fn await_terminal(
        &self,
        job: ImportJob,
        options: WaitOptions,
        cancel: &CancellationToken,
    ) -> Result<ImportJob, ImportError> {
        let started = self.scheduler.now();
        let mut job = job;
        let mut attempts: u32 = 0;

        loop {
            if job.state().is_terminal() {
                info!(
                    job_id = %job.job_id(),
                    state = %job.state(),
                    attempts,
                    "import job reached a terminal state"
                );
                return Ok(job);
            }
            if cancel.is_cancelled() {
                return Err(cancelled(job));
            }

            let elapsed = elapsed_since(self.scheduler.as_ref(), started);
            let remaining = options.timeout.saturating_sub(elapsed);
            if remaining.is_zero() {
                return Err(timed_out(job, elapsed));
            }

            attempts += 1;
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => PollStep::Cancelled,
                observed = self.observe(&job) => PollStep::Observed(observed),
                _ = self.scheduler.sleep(remaining) => PollStep::Deadline,
            };

            match step {
                PollStep::Cancelled => return Err(cancelled(job)),
                PollStep::Deadline => {
                    let waited = elapsed_since(self.scheduler.as_ref(), started);
                    return Err(timed_out(job, waited));
                }
                PollStep::Observed(_) if cancel.is_cancelled() => return Err(cancelled(job)),
                PollStep::Observed(Ok(observation)) => {
                    let outcome = job.apply(observation);
                    debug!(
                        job_id = %job.job_id(),
                        state = %job.state(),
                        ?outcome,
                        attempt = attempts,
                        "applied status observation"
                    );
                }
                PollStep::Observed(Err(err)) => {
                    warn!(
                        job_id = %job.job_id(),
                        error = %err,
                        attempt = attempts,
                        "status poll failed; retrying on next interval"
                    );
                }
            }

            if job.state().is_terminal() {
                continue;
            }

            let elapsed = elapsed_since(self.scheduler.as_ref(), started);
            let pause = options
                .poll_interval
                .max(MIN_POLL_INTERVAL)
                .min(options.timeout.saturating_sub(elapsed));
            if pause.is_zero() {
                continue;
            }

            let interrupted = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                _ = self.scheduler.sleep(pause) => false,
            };
            if interrupted {
                return Err(cancelled(job));
            }
        }
    }

    async fn observe(&self, job: &ImportJob) -> Result<StatusObservation, TransportError> {
        let requested_at = self.scheduler.now();
        let report = self.gateway.status(job.job_id()).await?;
        debug!(job_id = %job.job_id(), status = %report.status, "received import status");
        Ok(StatusObservation::new(
            ServerStatus::parse(&report.status),
            requested_at,
        ))
    }
}

fn cancelled(job: ImportJob) -> ImportError {
    info!(job_id = %job.job_id(), state = %job.state(), "stopped waiting for import job");
    ImportError::Cancelled { job: Box::new(job) }
}

fn timed_out(job: ImportJob, waited: Duration) -> ImportError {
    warn!(
        job_id = %job.job_id(),
        state = %job.state(),
        waited_ms = waited.as_millis() as u64,
        "import job still not terminal when the wait budget ran out"
    );
    ImportError::Timeout {
        job: Box::new(job),
        waited,
    }
}
