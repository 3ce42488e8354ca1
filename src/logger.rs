use crate::buffer::LogBuffer;
use crate::config::LoggerConfig;
use crate::deferred::{DeferredWork, Detached};
use crate::fallback::{ConsoleSink, FallbackSink};
use crate::flush::{self, FlushOptions, FlushState};
use crate::format::{ErrorValue, NoTraceContext, RecordFormatter, TraceContext};
use crate::id::{IdGenerator, UuidGenerator};
use crate::pretty;
use crate::record::{Fields, Level};
use crate::scheduler::{FlushScheduler, Trigger};
use crate::sink::{ingest_url, IngestSink};
use futures::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

pub(crate) struct EngineState {
    pub(crate) buffer: LogBuffer,
    pub(crate) scheduler: FlushScheduler,
    pub(crate) flush: FlushState,
    pub(crate) next_flush_id: u64,
}

pub(crate) struct Inner {
    pub(crate) formatter: RecordFormatter,
    pub(crate) ingest_url: String,
    pub(crate) api_key: String,
    pub(crate) local_dev: bool,
    pub(crate) degraded: bool,
    pub(crate) sink: Arc<dyn IngestSink>,
    pub(crate) fallback: Arc<dyn FallbackSink>,
    pub(crate) deferred: Arc<dyn DeferredWork>,
    state: Mutex<EngineState>,
}

impl Inner {
    pub(crate) fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Buffers log records for one request and delivers them in batches.
///
/// Record methods never block on the network and never fail. A flush is
/// registered with the host's [`DeferredWork`] once `count_threshold`
/// records are buffered, or `time_threshold` after the first record of a
/// batch. Call [`EdgeLogger::flush_in_background`] (or await
/// [`EdgeLogger::flush`]) before the handler returns so that nothing is left
/// behind when the execution window closes.
///
/// Cloning is cheap and every clone shares the same buffer.
#[derive(Clone)]
pub struct EdgeLogger {
    inner: Arc<Inner>,
}

impl EdgeLogger {
    /// Engine with the default HTTP sink, console fallback, no trace
    /// context and UUID request ids.
    ///
    /// Passing `None` for `deferred` still buffers and delivers on the
    /// current tokio runtime, but every record is also echoed to the
    /// fallback sink since background work may not outlive the request.
    pub fn new(config: LoggerConfig, deferred: Option<Arc<dyn DeferredWork>>) -> Self {
        let builder = Self::builder(config);
        match deferred {
            Some(deferred) => builder.deferred(deferred).build(),
            None => builder.build(),
        }
    }

    pub fn builder(config: LoggerConfig) -> EdgeLoggerBuilder {
        EdgeLoggerBuilder::new(config)
    }

    pub fn request_id(&self) -> &str {
        self.inner.formatter.request_id()
    }

    /// Whether records are echoed to the fallback sink because background
    /// delivery is known to be unreliable.
    pub fn is_degraded(&self) -> bool {
        self.inner.degraded
    }

    /// Number of records waiting for a successful delivery.
    pub fn buffered_len(&self) -> usize {
        self.inner.lock().buffer.len()
    }

    pub fn log(&self, message: impl Into<String>, fields: Option<Fields>) {
        self.record(Level::Info, message, fields);
    }

    pub fn info(&self, message: impl Into<String>, fields: Option<Fields>) {
        self.record(Level::Info, message, fields);
    }

    pub fn warn(&self, message: impl Into<String>, fields: Option<Fields>) {
        self.record(Level::Warn, message, fields);
    }

    pub fn debug(&self, message: impl Into<String>, fields: Option<Fields>) {
        self.record(Level::Debug, message, fields);
    }

    /// Record an error given as a message, an error value or any JSON value.
    ///
    /// ```no_run
    /// # use edge_log_sink::{EdgeLogger, ErrorValue};
    /// # fn demo(logger: &EdgeLogger, err: std::io::Error) {
    /// logger.error("payment declined", None);
    /// logger.error(ErrorValue::from_error(&err), None);
    /// logger.error(serde_json::json!({"code": 7}), None);
    /// # }
    /// ```
    pub fn error(&self, value: impl Into<ErrorValue>, fields: Option<Fields>) {
        self.record(Level::Error, value.into().render(), fields);
    }

    /// Format, buffer and schedule one record.
    pub fn record(&self, level: Level, message: impl Into<String>, fields: Option<Fields>) {
        let inner = &self.inner;
        let record = inner.formatter.format(message.into(), level, fields);

        if inner.local_dev {
            inner.fallback.write(record.level, &pretty::render(&record));
            return;
        }

        if inner.degraded {
            if let Ok(line) = serde_json::to_string(&record) {
                inner.fallback.write(record.level, &line);
            }
        }

        let trigger = {
            let mut state = inner.lock();
            state.buffer.append(record);
            let buffered = state.buffer.len();
            let in_flight = state.flush.is_flushing();
            let trigger = state.scheduler.on_append(buffered, in_flight);
            if trigger == Trigger::ArmTimer {
                state.scheduler.arm(|id, delay| self.spawn_timer(id, delay));
            }
            trigger
        };

        if trigger == Trigger::FlushNow {
            debug!("count threshold reached, registering flush");
            self.register_flush(FlushOptions::skip_if_in_progress());
        }
    }

    /// Deliver everything buffered when the call starts.
    ///
    /// Delivery failures are reported to the fallback sink, never returned;
    /// undelivered records stay buffered for the next flush.
    pub async fn flush(&self, options: FlushOptions) {
        flush::flush(&self.inner, options).await;
    }

    /// Register a full flush with the host's deferred-work capability. This
    /// is the call to make right before a handler returns.
    pub fn flush_in_background(&self) {
        self.register_flush(FlushOptions::default());
    }

    fn register_flush(&self, options: FlushOptions) {
        let logger = self.clone();
        self.inner
            .deferred
            .wait_until(async move { logger.flush(options).await }.boxed());
    }

    // Called with the state lock held; the task cannot clear its own handle
    // before the scheduler has stored it.
    fn spawn_timer(&self, id: u64, delay: Duration) -> Option<AbortHandle> {
        let Ok(runtime) = Handle::try_current() else {
            debug!("no tokio runtime, time-based flush disabled");
            return None;
        };
        let engine = Arc::downgrade(&self.inner);
        let task = runtime.spawn(async move {
            sleep(delay).await;
            let Some(inner) = engine.upgrade() else {
                return;
            };
            let logger = EdgeLogger { inner };
            debug!("time threshold reached, registering flush");
            logger.register_flush(FlushOptions::skip_if_in_progress());
            logger.inner.lock().scheduler.clear_fired(id);
        });
        Some(task.abort_handle())
    }
}

/// Collaborators for an [`EdgeLogger`]; anything not set uses its default.
pub struct EdgeLoggerBuilder {
    config: LoggerConfig,
    deferred: Option<Arc<dyn DeferredWork>>,
    sink: Option<Arc<dyn IngestSink>>,
    fallback: Arc<dyn FallbackSink>,
    trace_context: Arc<dyn TraceContext>,
    id_generator: Arc<dyn IdGenerator>,
}

impl EdgeLoggerBuilder {
    fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            deferred: None,
            sink: None,
            fallback: Arc::new(ConsoleSink),
            trace_context: Arc::new(NoTraceContext),
            id_generator: Arc::new(UuidGenerator),
        }
    }

    pub fn deferred(mut self, deferred: Arc<dyn DeferredWork>) -> Self {
        self.deferred = Some(deferred);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn IngestSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn fallback(mut self, fallback: Arc<dyn FallbackSink>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn trace_context(mut self, trace_context: Arc<dyn TraceContext>) -> Self {
        self.trace_context = trace_context;
        self
    }

    pub fn id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = id_generator;
        self
    }

    pub fn build(self) -> EdgeLogger {
        let config = self.config.normalized();
        let api_key = config.valid_api_key().map(str::to_string);
        let degraded = api_key.is_none() || self.deferred.is_none();
        if degraded {
            warn!(
                has_api_key = api_key.is_some(),
                has_deferred_work = self.deferred.is_some(),
                "background log delivery unavailable, echoing records to fallback output"
            );
        }

        let request_id = config
            .request_id
            .clone()
            .unwrap_or_else(|| self.id_generator.generate());
        let formatter =
            RecordFormatter::new(request_id, config.service_name.clone(), self.trace_context);

        let inner = Inner {
            formatter,
            ingest_url: ingest_url(&config.ingest_url, &config.dataset),
            api_key: api_key.unwrap_or_default(),
            local_dev: config.local_dev,
            degraded,
            sink: self.sink.unwrap_or_else(default_sink),
            fallback: self.fallback,
            deferred: self.deferred.unwrap_or_else(|| Arc::new(Detached)),
            state: Mutex::new(EngineState {
                buffer: LogBuffer::new(),
                scheduler: FlushScheduler::new(config.count_threshold, config.time_threshold),
                flush: FlushState::Idle,
                next_flush_id: 0,
            }),
        };

        EdgeLogger {
            inner: Arc::new(inner),
        }
    }
}

#[cfg(feature = "http")]
fn default_sink() -> Arc<dyn IngestSink> {
    Arc::new(crate::http::HttpSink::new())
}

#[cfg(not(feature = "http"))]
fn default_sink() -> Arc<dyn IngestSink> {
    warn!("http feature is disabled and no sink was configured, batches are discarded");
    Arc::new(crate::noop_sink::NoopSink)
}
