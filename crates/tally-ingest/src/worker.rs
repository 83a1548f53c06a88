//! Worker channel: an actor hosting the chunked executor
//!
//! The worker runs as its own tokio task and shares nothing with the caller.
//! Requests go in through a bounded inbox, responses come out through a
//! bounded outbox, and every value crossing the boundary is moved.
//!
//! One parse may be in flight per channel. The outbox receiver sits behind an
//! async mutex so a second caller waits for the first parse's terminal
//! message instead of interleaving with it.
//!
//! [`WorkerChannel::terminate`] aborts the task at its next await point (the
//! worker awaits after every chunk). Whatever the aborted chunk computed is
//! dropped.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, Instrument};

use crate::error::{IngestError, Result};
use crate::executor::ChunkedExecutor;
use crate::protocol::{ParsePayload, WorkerRequest, WorkerResponse};

const INBOX_CAPACITY: usize = 4;
const OUTBOX_CAPACITY: usize = 64;

/// Handle to a running worker task.
#[derive(Debug)]
pub struct WorkerChannel {
    inbox: mpsc::Sender<WorkerRequest>,
    outbox: Arc<Mutex<mpsc::Receiver<WorkerResponse>>>,
    pub(crate) task: JoinHandle<()>,
    terminated: CancellationToken,
}

impl WorkerChannel {
    /// Spawn a worker on the current tokio runtime.
    ///
    /// Fails with [`IngestError::WorkerInit`] when called outside a runtime.
    pub fn spawn() -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| IngestError::WorkerInit(e.to_string()))?;

        let (inbox, requests) = mpsc::channel(INBOX_CAPACITY);
        let (responses, outbox) = mpsc::channel(OUTBOX_CAPACITY);

        let task = runtime.spawn(run(requests, responses).instrument(info_span!("ingest_worker")));

        Ok(Self {
            inbox,
            outbox: Arc::new(Mutex::new(outbox)),
            task,
            terminated: CancellationToken::new(),
        })
    }

    /// Deliver a request to the worker.
    pub async fn send(&self, request: WorkerRequest) -> Result<()> {
        self.inbox
            .send(request)
            .await
            .map_err(|_| IngestError::WorkerCrashed)
    }

    /// Exclusive access to the response stream for the duration of one parse.
    pub async fn responses(&self) -> MutexGuard<'_, mpsc::Receiver<WorkerResponse>> {
        self.outbox.lock().await
    }

    /// Resolves once [`terminate`](Self::terminate) has been called.
    pub async fn terminated(&self) {
        self.terminated.cancelled().await
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.is_cancelled()
    }

    /// Abort the worker immediately. No drain, no flush.
    pub fn terminate(&self) {
        self.terminated.cancel();
        self.task.abort();
    }
}

impl Drop for WorkerChannel {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Worker main loop: serve requests until the inbox closes.
async fn run(mut requests: mpsc::Receiver<WorkerRequest>, responses: mpsc::Sender<WorkerResponse>) {
    while let Some(request) = requests.recv().await {
        match request {
            WorkerRequest::Parse { payload } => {
                if handle_parse(payload, &responses).await.is_err() {
                    debug!("Response receiver dropped, stopping worker");
                    return;
                }
            },
        }
    }
    debug!("Inbox closed, worker exiting");
}

async fn handle_parse(
    payload: ParsePayload,
    responses: &mpsc::Sender<WorkerResponse>,
) -> std::result::Result<(), mpsc::error::SendError<WorkerResponse>> {
    let options = payload.options();

    let mut executor = match ChunkedExecutor::new(&payload.text, options) {
        Ok(executor) => executor,
        Err(message) => return responses.send(WorkerResponse::Error { error: message }).await,
    };
    // The payload text is no longer needed once tokenized.
    drop(payload);

    while let Some(progress) = executor.next_chunk() {
        responses.send(WorkerResponse::Progress { progress }).await?;
        tokio::task::yield_now().await;
    }

    let data = executor.finish();
    if let Err(e) = responses.send(WorkerResponse::Complete { data }).await {
        error!("Parse finished but nobody is listening for the result");
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::executor::ParseOptions;

    const SAMPLE: &str = "date,description,amount\n2024-01-01,Coffee,4.50\n2024-01-02,Tea,3\n";

    async fn collect(worker: &WorkerChannel) -> Vec<WorkerResponse> {
        let mut rx = worker.responses().await;
        let mut out = Vec::new();
        while let Some(msg) = rx.recv().await {
            let terminal = msg.is_terminal();
            out.push(msg);
            if terminal {
                break;
            }
        }
        out
    }

    #[test]
    fn test_spawn_outside_runtime_is_init_error() {
        let err = WorkerChannel::spawn().unwrap_err();
        assert!(matches!(err, IngestError::WorkerInit(_)));
    }

    #[tokio::test]
    async fn test_progress_then_complete() {
        let worker = WorkerChannel::spawn().unwrap();
        worker
            .send(WorkerRequest::parse(SAMPLE.to_string(), ParseOptions::with_chunk_size(1)))
            .await
            .unwrap();

        let messages = collect(&worker).await;

        assert_eq!(
            messages[..2],
            [
                WorkerResponse::Progress { progress: 50 },
                WorkerResponse::Progress { progress: 99 },
            ]
        );
        match messages.last().unwrap() {
            WorkerResponse::Complete { data } => assert_eq!(data.stats.valid_rows, 2),
            other => panic!("expected complete, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_data_is_error_message() {
        let worker = WorkerChannel::spawn().unwrap();
        worker
            .send(WorkerRequest::parse("date,amount".to_string(), ParseOptions::default()))
            .await
            .unwrap();

        let messages = collect(&worker).await;
        assert_eq!(
            messages,
            vec![WorkerResponse::Error {
                error: "No data found".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_channel_serves_sequential_parses() {
        let worker = WorkerChannel::spawn().unwrap();

        for _ in 0..2 {
            worker
                .send(WorkerRequest::parse(SAMPLE.to_string(), ParseOptions::default()))
                .await
                .unwrap();
            let messages = collect(&worker).await;
            assert!(matches!(messages.last(), Some(WorkerResponse::Complete { .. })));
        }
    }

    #[tokio::test]
    async fn test_terminate_closes_outbox() {
        let worker = WorkerChannel::spawn().unwrap();
        worker.terminate();
        assert!(worker.is_terminated());

        let mut rx = worker.responses().await;
        assert!(rx.recv().await.is_none());
    }
}
