//! The orchestrator (C6): runs every stage once in pipeline order, or loops
//! doing so no more often than once per configured minimum interval.

use std::time::{Duration, Instant};
use tracing::info;

use crate::config::Settings;
use crate::ct::{self, CtConfig};
use crate::pipeline::run_process_step;
use crate::stages;

/// Runs CT ingest, then both GitLab and Jenkins pipelines end to end, once.
/// `num_certs` bounds this iteration's CT ingest to that many certificates;
/// `None` runs it to exhaustion.
pub async fn run_once(settings: &Settings, num_certs: Option<i64>) {
    info!("running ct ingest");
    ct::import_certificates(
        CtConfig {
            url: settings.ct_log_url.clone(),
            get_entries_batch_size: settings.ct_get_entries_batch_size,
            get_entries_retries: settings.ct_get_entries_retries,
            num_certs,
            workers: settings.ct_workers,
        },
        settings.db_path.clone(),
    )
    .await;

    info!("running gitlab pipeline");
    run_step(
        stages::GitlabFilterStep,
        settings.db_path.clone(),
        settings.gitlab_filter_workers,
    )
    .await;
    run_step(
        stages::RepoEnumeratorStep,
        settings.db_path.clone(),
        settings.enumerator_workers,
    )
    .await;
    run_step(
        stages::GitScannerStep,
        settings.db_path.clone(),
        settings.secret_scanner_workers,
    )
    .await;
    run_step(
        stages::GitlabAwsValidatorStep,
        settings.db_path.clone(),
        settings.aws_validator_workers,
    )
    .await;

    info!("running jenkins pipeline");
    run_step(
        stages::JenkinsFilterStep,
        settings.db_path.clone(),
        settings.jenkins_filter_workers,
    )
    .await;
    run_step(
        stages::JobsEnumeratorStep,
        settings.db_path.clone(),
        settings.enumerator_workers,
    )
    .await;
    run_step(
        stages::JenkinsScannerStep,
        settings.db_path.clone(),
        settings.secret_scanner_workers,
    )
    .await;
    run_step(
        stages::JenkinsAwsValidatorStep,
        settings.db_path.clone(),
        settings.aws_validator_workers,
    )
    .await;
}

async fn run_step<S: crate::pipeline::ProcessStep>(
    step: S,
    db_path: std::path::PathBuf,
    workers: usize,
) {
    if let Err(e) = run_process_step(step, db_path, workers).await {
        tracing::error!(error = %e, "stage failed");
    }
}

/// Runs [`run_once`] in a loop, each iteration taking at least
/// `settings.daemon_min_interval_secs` wall-clock time — a short iteration
/// sleeps out the remainder rather than immediately hammering the targets
/// again. `num_certs` bounds every iteration's CT ingest the same way it
/// bounds a single [`run_once`] call.
pub async fn run_daemon(settings: &Settings, num_certs: Option<i64>) {
    let min_interval = Duration::from_secs(settings.daemon_min_interval_secs);
    loop {
        let start = Instant::now();
        run_once(settings, num_certs).await;
        let elapsed = start.elapsed();
        if elapsed < min_interval {
            let remaining = min_interval - elapsed;
            info!(?remaining, "iteration finished early, waiting out minimum interval");
            tokio::time::sleep(remaining).await;
        }
    }
}
