//! Runtime configuration, loaded from environment variables (with `.env`
//! support) and falling back to the literal defaults named by the spec.

use std::path::PathBuf;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub ct_log_url: String,
    pub ct_get_entries_batch_size: i64,
    pub ct_get_entries_retries: u32,
    pub ct_workers: usize,
    pub gitlab_filter_workers: usize,
    pub jenkins_filter_workers: usize,
    pub enumerator_workers: usize,
    pub secret_scanner_workers: usize,
    pub aws_validator_workers: usize,
    pub gitlab_api_token: Option<String>,
    pub daemon_min_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: std::env::var("SCANCT_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./instances.db")),
            ct_log_url: std::env::var("SCANCT_CT_LOG_URL")
                .unwrap_or_else(|_| "https://oak.ct.letsencrypt.org/2023/".to_string()),
            ct_get_entries_batch_size: env_or("SCANCT_CT_BATCH_SIZE", 256),
            ct_get_entries_retries: env_or("SCANCT_CT_RETRIES", 5),
            ct_workers: env_or("SCANCT_CT_WORKERS", 30),
            gitlab_filter_workers: env_or("SCANCT_GITLAB_FILTER_WORKERS", 50),
            jenkins_filter_workers: env_or("SCANCT_JENKINS_FILTER_WORKERS", 5),
            enumerator_workers: env_or("SCANCT_ENUMERATOR_WORKERS", 5),
            secret_scanner_workers: env_or("SCANCT_SECRET_SCANNER_WORKERS", num_cpus()),
            aws_validator_workers: env_or("SCANCT_AWS_VALIDATOR_WORKERS", 5),
            gitlab_api_token: std::env::var("SCANCT_GITLAB_API_TOKEN").ok(),
            daemon_min_interval_secs: env_or("SCANCT_DAEMON_MIN_INTERVAL_SECS", 300),
        }
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Settings {
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Settings::default()
    }
}
