use crate::error::SinkError;
use crate::logger::Inner;
use crate::record::Level;
use crate::sink::{IngestRequest, IngestResponse, IngestSink};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Options for [`EdgeLogger::flush`](crate::logger::EdgeLogger::flush).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOptions {
    /// Return immediately, without waiting, if a flush is already running.
    pub skip_if_in_progress: bool,
}

impl FlushOptions {
    pub fn skip_if_in_progress() -> Self {
        Self {
            skip_if_in_progress: true,
        }
    }
}

pub(crate) type FlushHandle = Shared<BoxFuture<'static, ()>>;

/// Single-flight guard: at most one delivery exists at a time.
pub(crate) enum FlushState {
    Idle,
    Flushing { id: u64, handle: FlushHandle },
}

impl FlushState {
    pub(crate) fn is_flushing(&self) -> bool {
        matches!(self, FlushState::Flushing { .. })
    }

    fn handle(&self) -> Option<FlushHandle> {
        match self {
            FlushState::Idle => None,
            FlushState::Flushing { handle, .. } => Some(handle.clone()),
        }
    }
}

struct PreparedBatch {
    count: usize,
    request: IngestRequest,
    sink: Arc<dyn IngestSink>,
}

/// Run one flush. Without `skip_if_in_progress` this first waits for any
/// running flush, so executions never interleave.
pub(crate) async fn flush(inner: &Arc<Inner>, options: FlushOptions) {
    let ours = loop {
        let running = {
            let mut state = inner.lock();
            match state.flush.handle() {
                Some(_) if options.skip_if_in_progress => {
                    debug!("flush already in progress, skipping");
                    return;
                }
                Some(handle) => handle,
                None => {
                    let id = state.next_flush_id;
                    state.next_flush_id += 1;
                    let handle = run(Arc::downgrade(inner), id).boxed().shared();
                    state.flush = FlushState::Flushing {
                        id,
                        handle: handle.clone(),
                    };
                    break handle;
                }
            }
        };
        running.await;
    };

    ours.await;
}

// Holds the engine weakly: the in-flight handle lives inside the engine, so
// a strong reference here would keep an abandoned engine alive.
async fn run(engine: Weak<Inner>, id: u64) {
    let prepared = match engine.upgrade() {
        Some(inner) => inner.prepare_batch(),
        None => return,
    };

    let outcome = match prepared {
        Some(batch) => Some((batch.count, batch.sink.send(batch.request).await)),
        None => None,
    };

    let Some(inner) = engine.upgrade() else {
        return;
    };
    if let Some((count, outcome)) = outcome {
        inner.reconcile(count, outcome);
    }
    inner.finish_flush(id);
}

impl Inner {
    /// Snapshot and serialize the current buffer. `None` when there is
    /// nothing to send.
    fn prepare_batch(&self) -> Option<PreparedBatch> {
        let serialized = {
            let state = self.lock();
            if state.buffer.is_empty() {
                return None;
            }
            let count = state.buffer.len();
            serde_json::to_vec(state.buffer.drain_prefix(count)).map(|body| (count, body))
        };

        match serialized {
            Ok((count, body)) => Some(PreparedBatch {
                count,
                request: IngestRequest {
                    url: self.ingest_url.clone(),
                    api_key: self.api_key.clone(),
                    body,
                },
                sink: Arc::clone(&self.sink),
            }),
            Err(e) => {
                self.fallback
                    .write(Level::Error, &format!("Failed to serialize logs: {}", e));
                None
            }
        }
    }

    /// Apply a delivery outcome to the buffer. Only a successful delivery
    /// discards records, and then only the `count` that were sent.
    fn reconcile(&self, count: usize, outcome: Result<IngestResponse, SinkError>) {
        match outcome {
            Ok(response) if response.is_success() => {
                self.lock().buffer.remove_prefix(count);
                debug!(count, status = response.status, "delivered log batch");
            }
            Ok(response) => {
                self.fallback.write(
                    Level::Error,
                    &format!(
                        "Failed to flush logs: {} {} {}",
                        response.status, response.status_text, response.body
                    ),
                );
            }
            Err(e) => {
                self.fallback
                    .write(Level::Error, &format!("Failed to flush logs: {}", e));
            }
        }
    }

    fn finish_flush(&self, id: u64) {
        let mut state = self.lock();
        if matches!(state.flush, FlushState::Flushing { id: current, .. } if current == id) {
            state.flush = FlushState::Idle;
        }
    }
}
