//! Command-line interface: one subcommand per stage, plus `full` for the
//! end-to-end orchestrator.

use clap::{Parser, Subcommand};
use console::style;

use crate::config::Settings;
use crate::orchestrator;
use crate::pipeline::run_process_step;
use crate::stages;

/// Scans raw `std::env::args()` for `-v`/`--verbose` before clap parses
/// anything, because logging needs to be initialized before a clap parse
/// error would otherwise be the first thing printed.
pub fn is_verbose() -> bool {
    std::env::args().any(|a| a == "-v" || a == "--verbose")
}

#[derive(Parser)]
#[command(name = "scanct", about = "CT-log-driven GitLab/Jenkins recon pipeline")]
struct Cli {
    /// Enable verbose (info-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine a CT log for candidate instance hostnames.
    Ct {
        /// Stop after this many certificates (default: run to exhaustion).
        #[arg(long)]
        num_certs: Option<i64>,
    },
    /// GitLab-specific stages.
    Gitlab {
        #[command(subcommand)]
        command: GitlabCommands,
    },
    /// Jenkins-specific stages.
    Jenkins {
        #[command(subcommand)]
        command: JenkinsCommands,
    },
    /// Run every stage, once or as a daemon.
    Full {
        /// Loop forever, never iterating more than once per
        /// `daemon_min_interval_secs`.
        #[arg(long)]
        daemon: bool,
        /// Bounds per-iteration CT ingestion to this many certificates
        /// (default: run each iteration's CT ingest to exhaustion).
        #[arg(long)]
        num_certs: Option<i64>,
    },
}

#[derive(Subcommand)]
enum GitlabCommands {
    /// Probe candidate instances for a GitLab sign-in page.
    Filter,
    /// Enumerate repositories on confirmed GitLab instances.
    Repositories,
    /// Clone and scan repositories for leaked secrets.
    Secrets,
    /// Validate AWS credentials found in GitLab secret findings.
    Aws,
}

#[derive(Subcommand)]
enum JenkinsCommands {
    /// Probe candidate instances for a Jenkins controller.
    Filter,
    /// Enumerate jobs on confirmed Jenkins controllers.
    Jobs,
    /// Download and scan job workspaces for leaked secrets.
    Secrets,
    /// Validate AWS credentials found in Jenkins secret findings.
    Aws,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load();

    match cli.command {
        Commands::Ct { num_certs } => {
            println!("{} running ct ingest", style("→").cyan());
            crate::ct::import_certificates(
                crate::ct::CtConfig {
                    url: settings.ct_log_url.clone(),
                    get_entries_batch_size: settings.ct_get_entries_batch_size,
                    get_entries_retries: settings.ct_get_entries_retries,
                    num_certs,
                    workers: settings.ct_workers,
                },
                settings.db_path.clone(),
            )
            .await;
            println!("{} ct ingest done", style("✓").green());
        }
        Commands::Gitlab { command } => match command {
            GitlabCommands::Filter => {
                run_named_step(
                    "gitlab filter",
                    stages::GitlabFilterStep,
                    settings.db_path.clone(),
                    settings.gitlab_filter_workers,
                )
                .await?
            }
            GitlabCommands::Repositories => {
                run_named_step(
                    "gitlab repositories",
                    stages::RepoEnumeratorStep,
                    settings.db_path.clone(),
                    settings.enumerator_workers,
                )
                .await?
            }
            GitlabCommands::Secrets => {
                run_named_step(
                    "gitlab secrets",
                    stages::GitScannerStep,
                    settings.db_path.clone(),
                    settings.secret_scanner_workers,
                )
                .await?
            }
            GitlabCommands::Aws => {
                run_named_step(
                    "gitlab aws",
                    stages::GitlabAwsValidatorStep,
                    settings.db_path.clone(),
                    settings.aws_validator_workers,
                )
                .await?
            }
        },
        Commands::Jenkins { command } => match command {
            JenkinsCommands::Filter => {
                run_named_step(
                    "jenkins filter",
                    stages::JenkinsFilterStep,
                    settings.db_path.clone(),
                    settings.jenkins_filter_workers,
                )
                .await?
            }
            JenkinsCommands::Jobs => {
                run_named_step(
                    "jenkins jobs",
                    stages::JobsEnumeratorStep,
                    settings.db_path.clone(),
                    settings.enumerator_workers,
                )
                .await?
            }
            JenkinsCommands::Secrets => {
                run_named_step(
                    "jenkins secrets",
                    stages::JenkinsScannerStep,
                    settings.db_path.clone(),
                    settings.secret_scanner_workers,
                )
                .await?
            }
            JenkinsCommands::Aws => {
                run_named_step(
                    "jenkins aws",
                    stages::JenkinsAwsValidatorStep,
                    settings.db_path.clone(),
                    settings.aws_validator_workers,
                )
                .await?
            }
        },
        Commands::Full { daemon, num_certs } => {
            if daemon {
                println!("{} running full pipeline as a daemon", style("→").cyan());
                orchestrator::run_daemon(&settings, num_certs).await;
            } else {
                println!("{} running full pipeline", style("→").cyan());
                orchestrator::run_once(&settings, num_certs).await;
                println!("{} full pipeline done", style("✓").green());
            }
        }
    }

    Ok(())
}

async fn run_named_step<S: crate::pipeline::ProcessStep>(
    label: &str,
    step: S,
    db_path: std::path::PathBuf,
    workers: usize,
) -> anyhow::Result<()> {
    println!("{} running {label}", style("→").cyan());
    run_process_step(step, db_path, workers).await?;
    println!("{} {label} done", style("✓").green());
    Ok(())
}
