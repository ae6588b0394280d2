//! The CT follower (C4): walks a log forward from where it left off to
//! catch up to the current tree head, then walks backward from the oldest
//! index already stored to backfill history, storing certificates as it
//! goes.

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::ct::client::LogClient;
use crate::ct::leaf::decode_merkle_leaf;
use crate::store::models::Certificate;
use crate::store::Store;

pub struct CtConfig {
    pub url: String,
    pub get_entries_batch_size: i64,
    pub get_entries_retries: u32,
    /// Caps the total number of certificates fetched in one run; `None`
    /// means run until the catch-up and backfill loops exhaust themselves.
    pub num_certs: Option<i64>,
    pub workers: usize,
}

const RETRY_DELAY: Duration = Duration::from_millis(250);

async fn process_worker(config: &CtConfig, start: i64) -> Vec<Certificate> {
    let client = match LogClient::connect(&config.url) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "could not connect to ct log");
            return Vec::new();
        }
    };

    let end = start + config.get_entries_batch_size + 1;
    let mut last_err = None;
    let mut entries = None;
    for _ in 0..config.get_entries_retries {
        match client.get_entries(start, end).await {
            Ok(e) => {
                entries = Some(e);
                break;
            }
            Err(e) => {
                last_err = Some(e);
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }

    let entries = match entries {
        Some(e) => e,
        None => {
            if let Some(e) = last_err {
                warn!(error = %e, start, "error in get-entries");
            }
            return Vec::new();
        }
    };

    let mut certs = Vec::with_capacity(entries.len());
    for entry in entries {
        match decode_merkle_leaf(&entry.leaf_input) {
            Ok(decoded) => certs.push(Certificate {
                subjects: decoded.subjects,
                index: entry.index,
            }),
            Err(e) => {
                error!(error = %e, index = entry.index, "could not decode leaf");
            }
        }
    }
    certs
}

/// Runs the CT follower to completion: fans out index ranges to
/// `config.workers` concurrent fetchers, and persists results as they
/// arrive. `db_path` is opened independently by the input cursor logic and
/// by the output writer.
pub async fn import_certificates(config: CtConfig, db_path: PathBuf) {
    let workers = config.workers;
    let batch_size = config.get_entries_batch_size;
    let num_certs_limit = config.num_certs.unwrap_or(i64::MAX);
    let ct_url = config.url.clone();
    let retries = config.get_entries_retries;

    let input_db_path = db_path.clone();
    let input_worker = move |tx: mpsc::Sender<i64>| {
        let db_path = input_db_path;
        let ct_url = ct_url.clone();
        async move {
            let store = match Store::open(&db_path) {
                Ok(s) => s,
                Err(e) => {
                    error!(error = %e, "could not open store");
                    return;
                }
            };
            let (min_index, max_index) = match store.index_range() {
                Ok(r) => r,
                Err(e) => {
                    error!(error = %e, "could not get index range");
                    return;
                }
            };
            drop(store);

            let client = match LogClient::connect(&ct_url) {
                Ok(c) => c,
                Err(e) => {
                    error!(error = %e, "could not connect to ct log");
                    return;
                }
            };
            let tree_size = match client.get_sth().await {
                Ok(s) => s,
                Err(e) => {
                    error!(error = %e, "could not get sth");
                    return;
                }
            };
            let max_log_index = tree_size as i64 - 1;
            let mut num_certs = 0i64;

            // catch up to the current tree head
            let mut index = max_index + 1;
            info!(certs = max_log_index - index + 1, "catching up to sth");
            while index <= max_log_index - batch_size {
                if tx.send(index).await.is_err() {
                    return;
                }
                index += batch_size;
                num_certs += batch_size;
                if num_certs >= num_certs_limit {
                    return;
                }
            }
            info!("done catching up");

            // backfill history behind what's already stored
            let mut index = max_log_index - (max_log_index % batch_size) - batch_size;
            if min_index < max_log_index {
                index = min_index - 256;
            }
            while index >= 0 {
                if tx.send(index).await.is_err() {
                    return;
                }
                index -= batch_size;
                num_certs += batch_size;
                if num_certs >= num_certs_limit {
                    return;
                }
            }
        }
    };

    let config_for_process = std::sync::Arc::new(CtConfig {
        url: config.url.clone(),
        get_entries_batch_size: batch_size,
        get_entries_retries: retries,
        num_certs: config.num_certs,
        workers,
    });
    let process_worker = move |start: i64| {
        let config = std::sync::Arc::clone(&config_for_process);
        async move { process_worker(&config, start).await }
    };

    let output_db_path = db_path.clone();
    let output_worker = move |mut rx: mpsc::Receiver<Vec<Certificate>>| {
        let db_path = output_db_path;
        async move {
            let mut store = match Store::open(&db_path) {
                Ok(s) => s,
                Err(e) => {
                    error!(error = %e, "could not open store");
                    return;
                }
            };
            let mut total = 0usize;
            while let Some(certs) = rx.recv().await {
                if certs.len() as i64 != batch_size {
                    warn!(
                        expected = batch_size,
                        received = certs.len(),
                        "not exactly batch_size certificates arrived"
                    );
                }
                total += certs.len();
                if let Err(e) = store.store_certificates(&certs) {
                    error!(error = %e, "could not store certificates");
                    return;
                }
                debug!(certs = total, "processed certs");
            }
        }
    };

    crate::pipeline::executor::run(workers, 100, 100, input_worker, process_worker, output_worker)
        .await;
}
