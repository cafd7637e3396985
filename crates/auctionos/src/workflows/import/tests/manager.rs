use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::common::{
    csv_file, epoch, manager, submitted_job, ManualScheduler, Scripted, ScriptedGateway,
};
use crate::workflows::import::{
    ImportError, ImportFile, ImportKind, JobState, ValidationError, WaitOptions,
};

fn wait(interval_secs: u64, timeout_secs: u64) -> WaitOptions {
    WaitOptions::new(
        Duration::from_secs(interval_secs),
        Duration::from_secs(timeout_secs),
    )
}

#[tokio::test]
async fn submit_returns_submitted_job_with_server_id() {
    let gateway = Arc::new(ScriptedGateway::with_job_ids(&["7f9c2b"]));
    let scheduler = Arc::new(ManualScheduler::new());
    let manager = manager(gateway.clone(), scheduler.clone());

    let job = manager
        .submit(csv_file(), ImportKind::Properties)
        .await
        .expect("upload accepted");

    assert_eq!(job.job_id().as_str(), "7f9c2b");
    assert_eq!(job.kind(), ImportKind::Properties);
    assert_eq!(job.state(), JobState::Submitted);
    assert_eq!(job.submitted_at(), epoch());
    assert!(job.error_detail().is_none());

    let uploads = gateway.uploads.lock().expect("upload mutex");
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, ImportKind::Properties);
    assert_eq!(uploads[0].1, "fl_miami_dade_2025.csv");
}

#[tokio::test]
async fn submit_rejects_invalid_files_before_upload() {
    let gateway = Arc::new(ScriptedGateway::default());
    let manager = manager(gateway.clone(), Arc::new(ManualScheduler::new()));

    let empty = manager
        .submit(ImportFile::new("auctions.csv", Vec::new()), ImportKind::Auctions)
        .await
        .expect_err("empty file rejected");
    assert!(matches!(
        empty,
        ImportError::Validation(ValidationError::EmptyFile { .. })
    ));

    let spreadsheet = manager
        .submit(
            ImportFile::new("auctions.xlsx", b"PK\x03\x04".to_vec()),
            ImportKind::Auctions,
        )
        .await
        .expect_err("extension rejected");
    assert!(matches!(
        spreadsheet,
        ImportError::Validation(ValidationError::UnsupportedExtension { .. })
    ));

    assert!(gateway.uploads.lock().expect("upload mutex").is_empty());
}

#[tokio::test]
async fn submit_surfaces_transport_errors_without_creating_a_job() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.fail_uploads_with(400);
    let manager = manager(gateway, Arc::new(ManualScheduler::new()));

    let error = manager
        .submit(csv_file(), ImportKind::Auctions)
        .await
        .expect_err("upload rejected");

    match error {
        ImportError::Transport(transport) => {
            assert_eq!(transport.status(), Some(400));
            assert_eq!(transport.detail(), Some("Must be a CSV file"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn poll_maps_server_status_and_is_idempotent() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script("job-1", vec![Scripted::Status("processing")]);
    let manager = manager(gateway.clone(), Arc::new(ManualScheduler::new()));
    let job = submitted_job("job-1");

    let first = manager.poll(&job).await;
    let second = manager.poll(&first).await;

    assert_eq!(first.state(), JobState::Running);
    assert_eq!(second.state(), first.state());
    assert_eq!(gateway.status_calls(), 2);
    assert_eq!(job.state(), JobState::Submitted);
}

#[tokio::test]
async fn poll_keeps_last_known_state_on_transport_failure() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script(
        "job-1",
        vec![Scripted::Status("processing"), Scripted::HttpFailure(503)],
    );
    let manager = manager(gateway, Arc::new(ManualScheduler::new()));

    let running = manager.poll(&submitted_job("job-1")).await;
    let after_outage = manager.poll(&running).await;

    assert_eq!(after_outage.state(), JobState::Running);
    assert!(after_outage.error_detail().is_none());
    assert_eq!(after_outage, running);
}

#[tokio::test]
async fn try_poll_reports_transport_failure() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script("job-1", vec![Scripted::HttpFailure(404)]);
    let manager = manager(gateway, Arc::new(ManualScheduler::new()));

    let error = manager
        .try_poll(&submitted_job("job-1"))
        .await
        .expect_err("status unavailable");
    assert_eq!(error.status(), Some(404));
}

#[tokio::test]
async fn await_terminal_follows_job_to_success() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script(
        "job-1",
        vec![
            Scripted::Status("pending"),
            Scripted::Status("processing"),
            Scripted::Status("success: 2 rows processed"),
        ],
    );
    let scheduler = Arc::new(ManualScheduler::new());
    let manager = manager(gateway.clone(), scheduler.clone());

    let job = manager
        .await_terminal(submitted_job("job-1"), wait(2, 60), &CancellationToken::new())
        .await
        .expect("job finishes");

    assert_eq!(job.state(), JobState::Succeeded);
    assert_eq!(job.summary(), Some("2 rows processed"));
    assert_eq!(gateway.status_calls(), 3);
    assert_eq!(
        scheduler.sleeps(),
        vec![Duration::from_secs(2), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn await_terminal_retries_through_transport_errors() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script(
        "job-1",
        vec![
            Scripted::HttpFailure(502),
            Scripted::HttpFailure(502),
            Scripted::Status("success: 10 rows processed"),
        ],
    );
    let manager = manager(gateway.clone(), Arc::new(ManualScheduler::new()));

    let job = manager
        .await_terminal(submitted_job("job-1"), wait(2, 60), &CancellationToken::new())
        .await
        .expect("transient failures are retried");

    assert_eq!(job.state(), JobState::Succeeded);
    assert_eq!(gateway.status_calls(), 3);
}

#[tokio::test]
async fn await_terminal_returns_failed_jobs_with_backend_detail() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script(
        "job-1",
        vec![
            Scripted::Status("processing"),
            Scripted::Status("error: 'parcel_id' column is required"),
        ],
    );
    let manager = manager(gateway, Arc::new(ManualScheduler::new()));

    let job = manager
        .await_terminal(submitted_job("job-1"), wait(2, 60), &CancellationToken::new())
        .await
        .expect("terminal state reached");

    assert_eq!(job.state(), JobState::Failed);
    assert_eq!(job.error_detail(), Some("'parcel_id' column is required"));
    match job.into_result() {
        Err(ImportError::JobFailed { detail, .. }) => {
            assert_eq!(detail, "'parcel_id' column is required")
        }
        other => panic!("expected job failure, got {other:?}"),
    }
}

#[tokio::test]
async fn zero_timeout_returns_immediately_without_failing_the_job() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script("job-1", vec![Scripted::Hang]);
    let scheduler = Arc::new(ManualScheduler::new());
    let manager = manager(gateway, scheduler.clone());

    let error = manager
        .await_terminal(submitted_job("job-1"), wait(2, 0), &CancellationToken::new())
        .await
        .expect_err("budget exhausted");

    match error {
        ImportError::Timeout { job, waited } => {
            assert_eq!(job.state(), JobState::Submitted);
            assert!(job.error_detail().is_none());
            assert!(waited <= Duration::from_secs(2));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn unresponsive_backend_times_out_at_the_deadline() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script("job-1", vec![Scripted::Hang]);
    let manager = manager(gateway.clone(), Arc::new(ManualScheduler::new()));

    let error = manager
        .await_terminal(submitted_job("job-1"), wait(2, 5), &CancellationToken::new())
        .await
        .expect_err("budget exhausted");

    match error {
        ImportError::Timeout { job, waited } => {
            assert_eq!(waited, Duration::from_secs(5));
            assert_eq!(job.state(), JobState::Submitted);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(gateway.status_calls(), 1);
}

#[tokio::test]
async fn long_running_job_times_out_in_last_observed_state() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script("job-1", vec![Scripted::Status("processing")]);
    let scheduler = Arc::new(ManualScheduler::new());
    let manager = manager(gateway.clone(), scheduler.clone());

    let error = manager
        .await_terminal(submitted_job("job-1"), wait(2, 5), &CancellationToken::new())
        .await
        .expect_err("budget exhausted");

    let job = error.last_known_job().expect("job carried").clone();
    assert_eq!(job.state(), JobState::Running);
    assert!(matches!(error, ImportError::Timeout { .. }));
    assert_eq!(gateway.status_calls(), 3);
    assert_eq!(
        scheduler.sleeps(),
        vec![
            Duration::from_secs(2),
            Duration::from_secs(2),
            Duration::from_secs(1)
        ]
    );
}

#[tokio::test]
async fn cancelled_wait_never_polls() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script("job-1", vec![Scripted::Status("processing")]);
    let manager = manager(gateway.clone(), Arc::new(ManualScheduler::new()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let error = manager
        .await_terminal(submitted_job("job-1"), wait(2, 60), &cancel)
        .await
        .expect_err("cancelled");

    assert!(matches!(error, ImportError::Cancelled { .. }));
    assert_eq!(gateway.status_calls(), 0);
}

#[tokio::test]
async fn independent_jobs_wait_concurrently() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script(
        "properties-job",
        vec![
            Scripted::Status("processing"),
            Scripted::Status("success: 400 rows processed"),
        ],
    );
    gateway.script(
        "auctions-job",
        vec![Scripted::Status("error: auction_date is not a date")],
    );
    let manager = manager(gateway, Arc::new(ManualScheduler::new()));
    let cancel = CancellationToken::new();

    let (properties, auctions) = tokio::join!(
        manager.await_terminal(submitted_job("properties-job"), wait(1, 30), &cancel),
        manager.await_terminal(submitted_job("auctions-job"), wait(1, 30), &cancel),
    );

    assert_eq!(
        properties.expect("properties finish").state(),
        JobState::Succeeded
    );
    let auctions = auctions.expect("auctions finish");
    assert_eq!(auctions.state(), JobState::Failed);
    assert_eq!(auctions.error_detail(), Some("auction_date is not a date"));
}

/// Cancels the wait from inside the status request, then reports success.
struct CancellingGateway {
    cancel: CancellationToken,
}

#[async_trait::async_trait]
impl crate::workflows::import::ImportGateway for CancellingGateway {
    async fn upload(
        &self,
        kind: ImportKind,
        _file: ImportFile,
    ) -> Result<crate::workflows::import::SubmitReceipt, crate::api::TransportError> {
        Err(crate::api::TransportError::Decode {
            url: kind.upload_path().to_string(),
            message: "uploads are not scripted".to_string(),
        })
    }

    async fn status(
        &self,
        _job_id: &crate::workflows::import::JobId,
    ) -> Result<crate::workflows::import::StatusReport, crate::api::TransportError> {
        self.cancel.cancel();
        Ok(crate::workflows::import::StatusReport {
            status: "success: 12 rows processed".to_string(),
        })
    }
}

#[tokio::test]
async fn observation_arriving_after_cancel_is_not_applied() {
    let cancel = CancellationToken::new();
    let gateway = Arc::new(CancellingGateway {
        cancel: cancel.clone(),
    });
    let manager = crate::workflows::import::ImportJobManager::new(
        gateway,
        Arc::new(ManualScheduler::new()),
        crate::workflows::import::UploadPolicy::default(),
    );

    let error = manager
        .await_terminal(submitted_job("job-1"), wait(2, 60), &cancel)
        .await
        .expect_err("cancelled mid-request");

    match error {
        ImportError::Cancelled { job } => {
            assert_eq!(job.state(), JobState::Submitted);
            assert!(job.summary().is_none());
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
}

#[tokio::test]
async fn tracked_job_can_be_polled_like_a_submitted_one() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.script("from-earlier-run", vec![Scripted::Status("success: 5 rows processed")]);
    let scheduler = Arc::new(ManualScheduler::new());
    scheduler.advance(Duration::from_secs(30));
    let manager = manager(gateway, scheduler);

    let job = manager.track(
        crate::workflows::import::JobId::parse("from-earlier-run").expect("valid id"),
        ImportKind::Auctions,
    );
    assert_eq!(job.submitted_at(), epoch() + chrono::Duration::seconds(30));

    let polled = manager.poll(&job).await;
    assert_eq!(polled.state(), JobState::Succeeded);
    assert_eq!(polled.kind(), ImportKind::Auctions);
}
