use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::api::TransportError;
use crate::workflows::import::{
    ImportFile, ImportGateway, ImportJob, ImportJobManager, ImportKind, JobId, Scheduler,
    StatusReport, SubmitReceipt, UploadPolicy,
};

pub(super) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

/// Virtual clock: `sleep` advances time instead of waiting.
#[derive(Debug)]
pub(super) struct ManualScheduler {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualScheduler {
    pub(super) fn new() -> Self {
        Self {
            now: Mutex::new(epoch()),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().expect("clock mutex");
        *now += chrono::Duration::from_std(duration).expect("duration in range");
    }

    pub(super) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleep mutex").clone()
    }
}

#[async_trait]
impl Scheduler for ManualScheduler {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex")
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        self.sleeps.lock().expect("sleep mutex").push(duration);
        tokio::task::yield_now().await;
    }
}

#[derive(Debug, Clone)]
pub(super) enum Scripted {
    Status(&'static str),
    HttpFailure(u16),
    Hang,
}

/// Gateway replaying per-job status scripts; the last scripted status repeats.
#[derive(Default)]
pub(super) struct ScriptedGateway {
    next_job_id: Mutex<VecDeque<&'static str>>,
    upload_failure: Mutex<Option<u16>>,
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    sticky: Mutex<HashMap<String, Scripted>>,
    pub(super) uploads: Mutex<Vec<(ImportKind, String, usize)>>,
    pub(super) status_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub(super) fn with_job_ids(ids: &[&'static str]) -> Self {
        let gateway = Self::default();
        gateway
            .next_job_id
            .lock()
            .expect("id mutex")
            .extend(ids.iter().copied());
        gateway
    }

    pub(super) fn fail_uploads_with(&self, status: u16) {
        *self.upload_failure.lock().expect("upload mutex") = Some(status);
    }

    pub(super) fn script(&self, job_id: &str, steps: Vec<Scripted>) {
        self.scripts
            .lock()
            .expect("script mutex")
            .insert(job_id.to_string(), steps.into());
    }

    pub(super) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn next_step(&self, job_id: &str) -> Scripted {
        let mut scripts = self.scripts.lock().expect("script mutex");
        let mut sticky = self.sticky.lock().expect("sticky mutex");
        match scripts.get_mut(job_id).and_then(VecDeque::pop_front) {
            Some(step) => {
                sticky.insert(job_id.to_string(), step.clone());
                step
            }
            None => sticky
                .get(job_id)
                .cloned()
                .unwrap_or(Scripted::HttpFailure(404)),
        }
    }
}

#[async_trait]
impl ImportGateway for ScriptedGateway {
    async fn upload(
        &self,
        kind: ImportKind,
        file: ImportFile,
    ) -> Result<SubmitReceipt, TransportError> {
        self.uploads.lock().expect("upload mutex").push((
            kind,
            file.file_name().to_string(),
            file.len(),
        ));

        if let Some(status) = *self.upload_failure.lock().expect("upload mutex") {
            return Err(TransportError::Status {
                url: format!("fake://{}", kind.upload_path()),
                status,
                detail: Some("Must be a CSV file".to_string()),
            });
        }

        let id = self
            .next_job_id
            .lock()
            .expect("id mutex")
            .pop_front()
            .unwrap_or("job-default");
        Ok(SubmitReceipt {
            job_id: JobId::parse(id).expect("scripted id"),
            status: "processing".to_string(),
        })
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusReport, TransportError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step(job_id.as_str()) {
            Scripted::Status(status) => Ok(StatusReport {
                status: status.to_string(),
            }),
            Scripted::HttpFailure(status) => Err(TransportError::Status {
                url: format!("fake://admin/import-status/{job_id}"),
                status,
                detail: None,
            }),
            Scripted::Hang => std::future::pending().await,
        }
    }
}

pub(super) fn manager(
    gateway: Arc<ScriptedGateway>,
    scheduler: Arc<ManualScheduler>,
) -> ImportJobManager<ScriptedGateway> {
    ImportJobManager::new(gateway, scheduler, UploadPolicy::default())
}

pub(super) fn csv_file() -> ImportFile {
    ImportFile::new(
        "fl_miami_dade_2025.csv",
        b"parcel_id,county,state_code,amount_due\n01-3125-000-0010,Miami-Dade,FL,1520.44\n"
            .to_vec(),
    )
}

pub(super) fn submitted_job(id: &str) -> ImportJob {
    ImportJob::submitted(
        JobId::parse(id).expect("valid id"),
        ImportKind::Properties,
        epoch(),
    )
}
