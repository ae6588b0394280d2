//! The process-step driver (C3): a generic four-operation contract that
//! every stage implements, plus the runner that wires it to the fan
//! executor.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::store::Store;

/// A single stage of the pipeline: discover unprocessed inputs, process
/// each independently, persist whatever output was produced, and mark the
/// input processed regardless of outcome.
#[async_trait]
pub trait ProcessStep: Send + Sync + 'static {
    type Input: Clone + Send + Sync + 'static;
    type Output: Send + 'static;

    fn name(&self) -> &'static str;

    async fn unprocessed_inputs(&self, store: &Store) -> Result<Vec<Self::Input>>;

    /// Transient failures (bad host, non-200, missing magic string) are
    /// reported as `Ok(vec![])` with a `warn!` at the call site, not as
    /// `Err` — `Err` here means something unrecoverable happened for this
    /// one input and is logged, then the input is still marked processed.
    async fn process(&self, input: &Self::Input) -> Result<Vec<Self::Output>>;

    async fn save_result(&self, store: &mut Store, outputs: &[Self::Output]) -> Result<()>;

    async fn set_processed(&self, store: &Store, input: &Self::Input) -> Result<()>;
}

struct ProcessResult<I, O> {
    input: I,
    output: Vec<O>,
    error: Option<String>,
}

/// Runs `step` to completion: fetches unprocessed inputs, shuffles them
/// (politeness towards the hosts being probed — not a correctness
/// requirement), fans them out across `workers` concurrent tasks, and
/// drains results sequentially through a single store connection.
pub async fn run_process_step<S: ProcessStep>(
    step: S,
    db_path: PathBuf,
    workers: usize,
) -> Result<()> {
    let step = Arc::new(step);

    let input_step = Arc::clone(&step);
    let input_db_path = db_path.clone();
    let input_worker = move |tx: tokio::sync::mpsc::Sender<S::Input>| {
        let step = input_step;
        let db_path = input_db_path;
        async move {
            let store = match Store::open(&db_path) {
                Ok(s) => s,
                Err(e) => {
                    error!(stage = step.name(), error = %e, "could not open store");
                    return;
                }
            };
            let mut inputs = match step.unprocessed_inputs(&store).await {
                Ok(i) => i,
                Err(e) => {
                    error!(stage = step.name(), error = %e, "could not fetch unprocessed inputs");
                    return;
                }
            };
            drop(store);
            info!(stage = step.name(), count = inputs.len(), "unprocessed inputs");
            inputs.shuffle(&mut rand::thread_rng());
            for input in inputs {
                if tx.send(input).await.is_err() {
                    break;
                }
            }
        }
    };

    let process_step = Arc::clone(&step);
    let process_worker = move |input: S::Input| {
        let step = Arc::clone(&process_step);
        async move {
            let result = step.process(&input).await;
            match result {
                Ok(output) => ProcessResult {
                    input,
                    output,
                    error: None,
                },
                Err(e) => ProcessResult {
                    input,
                    output: Vec::new(),
                    error: Some(e.to_string()),
                },
            }
        }
    };

    // Store errors from `save_result`/`set_processed` are fatal: they mean we
    // can no longer trust that outputs and the `Processed` flag stay in sync
    // for this stage, so the consumer aborts rather than pressing on. The
    // fatal error is carried out of the consumer task over this oneshot and
    // turned into `run_process_step`'s `Err` once the executor has wound
    // down.
    let (fatal_tx, fatal_rx) = oneshot::channel::<Error>();
    let mut fatal_tx = Some(fatal_tx);

    let output_step = Arc::clone(&step);
    let output_db_path = db_path.clone();
    let output_worker = move |mut rx: tokio::sync::mpsc::Receiver<ProcessResult<S::Input, S::Output>>| {
        let step = output_step;
        let db_path = output_db_path;
        async move {
            let mut store = match Store::open(&db_path) {
                Ok(s) => s,
                Err(e) => {
                    error!(stage = step.name(), error = %e, "could not open store");
                    let _ = fatal_tx.take().expect("single fatal send").send(e);
                    return;
                }
            };
            while let Some(result) = rx.recv().await {
                if let Some(err) = &result.error {
                    warn!(stage = step.name(), error = %err, "process step failed for input");
                } else if !result.output.is_empty() {
                    if let Err(e) = step.save_result(&mut store, &result.output).await {
                        error!(stage = step.name(), error = %e, "could not save result, aborting stage");
                        let _ = fatal_tx.take().expect("single fatal send").send(e);
                        return;
                    }
                }
                // Only reached if save_result succeeded (or produced no
                // output to save) — never mark an input processed while its
                // output may not have been committed.
                if let Err(e) = step.set_processed(&store, &result.input).await {
                    error!(stage = step.name(), error = %e, "could not mark input processed, aborting stage");
                    let _ = fatal_tx.take().expect("single fatal send").send(e);
                    return;
                }
            }
        }
    };

    crate::pipeline::executor::run(workers, 100, 100, input_worker, process_worker, output_worker)
        .await;

    match fatal_rx.try_recv() {
        Ok(e) => Err(e),
        Err(_) => Ok(()),
    }
}
