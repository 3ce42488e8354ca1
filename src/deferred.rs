use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// Host capability that keeps background work alive after a request handler
/// has returned its response.
///
/// `wait_until` must not block: it hands the future off and returns.
pub trait DeferredWork: Send + Sync {
    fn wait_until(&self, work: BoxFuture<'static, ()>);
}

/// Deferred work on the current tokio runtime, tracked so the host can wait
/// for every registered future before shutting down.
#[derive(Clone, Debug, Default)]
pub struct TaskQueue {
    tracker: TaskTracker,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered futures that have not completed yet.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for all work registered so far and any registered while
    /// waiting. The queue keeps accepting work afterwards.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

impl DeferredWork for TaskQueue {
    fn wait_until(&self, work: BoxFuture<'static, ()>) {
        match Handle::try_current() {
            Ok(handle) => {
                self.tracker.spawn_on(work, &handle);
            }
            Err(_) => debug!("no tokio runtime, dropping deferred work"),
        }
    }
}

/// Stand-in used when the host offers no deferred-work capability: the work
/// is spawned untracked on the current runtime, if there is one.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Detached;

impl DeferredWork for Detached {
    fn wait_until(&self, work: BoxFuture<'static, ()>) {
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(work);
            }
            Err(_) => debug!("no tokio runtime, dropping background flush"),
        }
    }
}
