//! The fan executor (C2): one producer, N workers, one consumer over bounded
//! channels.
//!
//! The shutdown ordering here is load-bearing: the producer's sender is
//! dropped as soon as it finishes (closing the input channel), each worker
//! exits once the input channel is drained, and only once every worker has
//! exited (dropping its clone of the output sender) does the output channel
//! close and let the consumer finish. Awaiting in any other order can hang
//! the consumer forever or drop output the workers haven't sent yet.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Runs a producer, `workers` parallel processors, and a consumer, wired
/// together by bounded channels of capacity `input_buffer`/`output_buffer`.
pub async fn run<I, O, InputWorker, InputFut, ProcessWorker, ProcessFut, OutputWorker, OutputFut>(
    workers: usize,
    input_buffer: usize,
    output_buffer: usize,
    input_worker: InputWorker,
    process_worker: ProcessWorker,
    output_worker: OutputWorker,
) where
    I: Send + 'static,
    O: Send + 'static,
    InputWorker: FnOnce(mpsc::Sender<I>) -> InputFut + Send + 'static,
    InputFut: Future<Output = ()> + Send + 'static,
    ProcessWorker: Fn(I) -> ProcessFut + Send + Sync + 'static,
    ProcessFut: Future<Output = O> + Send + 'static,
    OutputWorker: FnOnce(mpsc::Receiver<O>) -> OutputFut + Send + 'static,
    OutputFut: Future<Output = ()> + Send + 'static,
{
    let (input_tx, input_rx) = mpsc::channel::<I>(input_buffer);
    let (output_tx, output_rx) = mpsc::channel::<O>(output_buffer);
    let input_rx = Arc::new(Mutex::new(input_rx));
    let process_worker = Arc::new(process_worker);

    let producer = tokio::spawn(async move {
        input_worker(input_tx).await;
    });

    let mut worker_handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let input_rx = Arc::clone(&input_rx);
        let output_tx = output_tx.clone();
        let process_worker = Arc::clone(&process_worker);
        worker_handles.push(tokio::spawn(async move {
            loop {
                let item = {
                    let mut rx = input_rx.lock().await;
                    rx.recv().await
                };
                let Some(item) = item else { break };
                let out = process_worker(item).await;
                if output_tx.send(out).await.is_err() {
                    break;
                }
            }
        }));
    }
    // Drop our own sender so only the workers' clones keep the channel
    // alive; once every worker task exits, the channel closes.
    drop(output_tx);

    let consumer = tokio::spawn(async move {
        output_worker(output_rx).await;
    });

    let _ = producer.await;
    for handle in worker_handles {
        let _ = handle.await;
    }
    let _ = consumer.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn fans_out_and_collects_all_items() {
        let received = Arc::new(AtomicUsize::new(0));
        let received_clone = Arc::clone(&received);

        run(
            4,
            10,
            10,
            |tx: mpsc::Sender<i32>| async move {
                for i in 0..50 {
                    tx.send(i).await.ok();
                }
            },
            |i: i32| async move { i * 2 },
            move |mut rx: mpsc::Receiver<i32>| async move {
                let mut sum = 0i64;
                while let Some(v) = rx.recv().await {
                    sum += v as i64;
                    received_clone.fetch_add(1, Ordering::SeqCst);
                }
                assert_eq!(sum, (0..50).map(|i| i * 2).sum::<i32>() as i64);
            },
        )
        .await;

        assert_eq!(received.load(Ordering::SeqCst), 50);
    }
}
