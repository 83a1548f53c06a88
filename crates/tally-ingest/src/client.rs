//! Ingestion client: the caller-facing facade over one worker
//!
//! The client creates its worker lazily on first use and reuses it afterwards.
//! Parse state (`progress`, `is_processing`, `error`) is published through a
//! watch channel so UI code can render it without polling the client.
//!
//! All failures of a parse call (unreadable file, worker-reported error,
//! crashed worker, cancellation) come back through the same `Result`.
//!
//! [`IngestionClient::cancel`] covers the whole call, not only the worker:
//! a parse still reading its file, or not yet holding a worker, resolves with
//! [`IngestError::Cancelled`] as well.

use std::path::Path;
use std::sync::Arc;
use tally_common::types::IngestionResult;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::{IngestError, Result};
use crate::executor::ParseOptions;
use crate::protocol::{WorkerRequest, WorkerResponse};
use crate::worker::WorkerChannel;

/// Observable state of the client's current parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionState {
    pub progress: u8,
    pub is_processing: bool,
    pub error: Option<String>,
}

pub struct IngestionClient {
    options: ParseOptions,
    worker: Mutex<Option<Arc<WorkerChannel>>>,
    /// Shared by every parse started since the last cancel.
    cancel: Mutex<CancellationToken>,
    state: watch::Sender<IngestionState>,
}

impl IngestionClient {
    pub fn new(options: ParseOptions) -> Self {
        let (state, _) = watch::channel(IngestionState::default());
        Self {
            options,
            worker: Mutex::new(None),
            cancel: Mutex::new(CancellationToken::new()),
            state,
        }
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<IngestionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> IngestionState {
        self.state.borrow().clone()
    }

    /// Whether a worker is currently held.
    pub async fn has_worker(&self) -> bool {
        self.worker.lock().await.is_some()
    }

    /// Read `path` and parse it on the worker.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn parse_file(&self, path: impl AsRef<Path>) -> Result<IngestionResult> {
        let path = path.as_ref();
        let token = self.begin().await;

        let read = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(IngestError::Cancelled),
            read = tokio::fs::read_to_string(path) => read,
        };

        let text = match read {
            Ok(text) => text,
            Err(source) => {
                return Err(self.fail(IngestError::FileRead {
                    path: path.to_path_buf(),
                    source,
                }))
            },
        };

        self.run(text, &token).await
    }

    /// Parse text the caller already holds.
    pub async fn parse_text(&self, text: impl Into<String>) -> Result<IngestionResult> {
        let token = self.begin().await;
        self.run(text.into(), &token).await
    }

    /// Cancel every parse in flight, terminate the worker, and reset progress.
    ///
    /// Pending calls resolve with [`IngestError::Cancelled`]; the next parse
    /// creates a fresh worker.
    pub async fn cancel(&self) {
        self.cancel.lock().await.cancel();

        if let Some(worker) = self.worker.lock().await.take() {
            info!("Cancelling parse, terminating worker");
            worker.terminate();
        }

        self.state.send_modify(|s| {
            s.is_processing = false;
            s.progress = 0;
        });
    }

    /// Tear the client down, terminating its worker.
    pub async fn dispose(self) {
        self.cancel().await;
    }

    /// Mark a parse as started and hand out the token it must observe.
    ///
    /// The state is published under the token lock so a concurrent cancel
    /// always resets it afterwards.
    async fn begin(&self) -> CancellationToken {
        let mut current = self.cancel.lock().await;
        if current.is_cancelled() {
            *current = CancellationToken::new();
        }

        self.state.send_replace(IngestionState {
            progress: 0,
            is_processing: true,
            error: None,
        });
        current.clone()
    }

    /// Record a fatal error in the state and hand it back for returning.
    fn fail(&self, err: IngestError) -> IngestError {
        warn!(error = %err, "Parse failed");
        self.state.send_modify(|s| {
            s.is_processing = false;
            s.error = Some(err.to_string());
        });
        err
    }

    async fn acquire_worker(&self) -> Result<Arc<WorkerChannel>> {
        let mut slot = self.worker.lock().await;

        if let Some(worker) = slot.as_ref() {
            return Ok(Arc::clone(worker));
        }

        let worker = Arc::new(WorkerChannel::spawn()?);
        *slot = Some(Arc::clone(&worker));
        Ok(worker)
    }

    /// Forget `worker` if it is still the held one.
    async fn discard_worker(&self, worker: &Arc<WorkerChannel>) {
        let mut slot = self.worker.lock().await;
        if slot.as_ref().is_some_and(|held| Arc::ptr_eq(held, worker)) {
            *slot = None;
        }
    }

    /// Stop a worker that may still be computing a cancelled request.
    async fn abandon(&self, worker: &Arc<WorkerChannel>) -> IngestError {
        self.discard_worker(worker).await;
        worker.terminate();
        IngestError::Cancelled
    }

    async fn run(&self, text: String, token: &CancellationToken) -> Result<IngestionResult> {
        if token.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let worker = match self.acquire_worker().await {
            Ok(worker) => worker,
            Err(e) => return Err(self.fail(e)),
        };

        let mut responses = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(IngestError::Cancelled),
            _ = worker.terminated() => return Err(IngestError::Cancelled),
            guard = worker.responses() => guard,
        };

        if let Err(e) = worker.send(WorkerRequest::parse(text, self.options)).await {
            self.discard_worker(&worker).await;
            return Err(self.fail(e));
        }

        loop {
            let message = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(self.abandon(&worker).await),
                _ = worker.terminated() => return Err(IngestError::Cancelled),
                message = responses.recv() => message,
            };

            match message {
                Some(WorkerResponse::Progress { progress }) => {
                    self.state
                        .send_if_modified(|s| merge_progress(s, progress, token.is_cancelled()));
                },
                Some(WorkerResponse::Complete { data }) => {
                    let mut accepted = false;
                    self.state.send_if_modified(|s| {
                        if token.is_cancelled() {
                            return false;
                        }
                        *s = IngestionState {
                            progress: 100,
                            is_processing: false,
                            error: None,
                        };
                        accepted = true;
                        true
                    });

                    return if accepted {
                        Ok(data)
                    } else {
                        Err(IngestError::Cancelled)
                    };
                },
                Some(WorkerResponse::Error { error }) => {
                    if token.is_cancelled() {
                        return Err(IngestError::Cancelled);
                    }
                    return Err(self.fail(IngestError::Worker(error)));
                },
                None => {
                    error!("Worker channel closed without a terminal message");
                    drop(responses);
                    self.discard_worker(&worker).await;
                    return Err(self.fail(IngestError::WorkerCrashed));
                },
            }
        }
    }
}

/// Fold a progress report into `state`. Reports that land after the parse
/// stopped (a cancel raced the message) are dropped, and progress never
/// moves backwards. Returns whether the state changed.
fn merge_progress(state: &mut IngestionState, progress: u8, cancelled: bool) -> bool {
    if cancelled || !state.is_processing || progress <= state.progress {
        return false;
    }
    state.progress = progress;
    true
}

impl Default for IngestionClient {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}
