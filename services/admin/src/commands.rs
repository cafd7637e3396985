use std::fs::File;

use auctionos::config::AppConfig;
use auctionos::error::AppError;
use auctionos::telemetry;
use auctionos::workflows::import::{
    ImportError, ImportFile, ImportJob, ImportJobManager, JobId, JobState, WaitOptions,
};
use auctionos::workflows::regions::{read_aggregates_csv, BoundaryCatalog, ScopeHint};
use tokio_util::sync::CancellationToken;

use crate::cli::{ImportArgs, RegionsArgs, StatusArgs};
use crate::infra::{cancel_on_ctrl_c, RegionsReport};

pub(crate) async fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let manager = ImportJobManager::over_http(config.api.client()?, config.import.upload_policy());
    let file = ImportFile::from_path(&args.file)?;
    let job = manager.submit(file, args.kind).await?;
    println!("Submitted {} import as job {}", job.kind().label(), job.job_id());

    if !args.wait {
        return Ok(());
    }

    let defaults = config.import.wait_options();
    let options = WaitOptions::new(
        args.interval_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(defaults.poll_interval),
        args.timeout_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(defaults.timeout),
    );
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let outcome = manager.await_terminal(job, options, &cancel).await;
    cancel.cancel();
    match outcome {
        Ok(job) => {
            print_job(&job);
            job.into_result()?;
            Ok(())
        }
        Err(err) => {
            if let Some(job) = err.last_known_job() {
                print_job(job);
            }
            if matches!(
                err,
                ImportError::Timeout { .. } | ImportError::Cancelled { .. }
            ) {
                println!("The backend may still be processing; check again with `status`.");
            }
            Err(err.into())
        }
    }
}

pub(crate) async fn run_status(args: StatusArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let job_id = JobId::parse(&args.job_id)
        .ok_or_else(|| AppError::InvalidRequest("job id must not be blank".to_string()))?;
    let manager = ImportJobManager::over_http(config.api.client()?, config.import.upload_policy());
    let job = manager.track(job_id, args.kind);
    let job = manager.try_poll(&job).await?;
    print_job(&job);
    Ok(())
}

fn print_job(job: &ImportJob) {
    println!("Job {} ({}): {}", job.job_id(), job.kind().label(), job.state());
    match job.state() {
        JobState::Succeeded => {
            if let Some(summary) = job.summary() {
                println!("  {summary}");
            }
        }
        JobState::Failed => {
            if let Some(detail) = job.error_detail() {
                println!("  {detail}");
            }
        }
        JobState::Submitted | JobState::Running | JobState::Unknown => {}
    }
}

pub(crate) async fn run_regions(args: RegionsArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if args.buckets == 0 {
        return Err(AppError::InvalidRequest(
            "--buckets must be at least 1".to_string(),
        ));
    }

    let aggregates = read_aggregates_csv(File::open(&args.aggregates)?)?;
    let location = args
        .boundaries
        .as_deref()
        .unwrap_or(&config.map.boundary_source);
    let catalog = BoundaryCatalog::from_location(location, config.api.request_timeout)?;
    let boundaries = catalog.features().await?;

    let hint = ScopeHint::new(&args.scope);
    let report = RegionsReport::build(&aggregates, &boundaries, Some(&hint), args.buckets);

    if args.json {
        let rendered = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        render_regions(&report);
    }
    Ok(())
}

fn render_regions(report: &RegionsReport) {
    println!(
        "Resolved {} boundaries: {} exact, {} ambiguous, {} without data",
        report.regions.len(),
        report.summary.exact,
        report.summary.ambiguous,
        report.summary.unmatched
    );

    let mut matched = report
        .regions
        .iter()
        .filter(|region| region.matched_aggregate.is_some())
        .peekable();
    if matched.peek().is_none() {
        println!("\nNo boundary matched the aggregates.");
        return;
    }

    println!("\nMatched regions");
    for region in matched {
        let state = region
            .matched_aggregate
            .as_ref()
            .map(|aggregate| aggregate.state.as_str())
            .unwrap_or("--");
        println!(
            "- {} [{}] {} ({})",
            region.boundary_id, state, region.label, region.match_confidence
        );
    }
}
