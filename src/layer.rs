use crate::logger::EdgeLogger;
use crate::record::{Fields, Level};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns application events into records on
/// an [`EdgeLogger`].
///
/// Events less severe than `min_level` are dropped; `TRACE` events that
/// pass map to debug. Events emitted by this crate are never forwarded, so the
/// engine's own diagnostics cannot feed back into its buffer.
pub struct EdgeLogLayer {
    logger: EdgeLogger,
    min_level: tracing::Level,
    /// Total events seen by the layer (before filtering).
    pub total_events: Arc<AtomicU64>,
    /// Events handed to the logger.
    pub forwarded_events: Arc<AtomicU64>,
}

impl EdgeLogLayer {
    /// Forward events at `DEBUG` and more severe.
    pub fn new(logger: EdgeLogger) -> Self {
        Self::with_min_level(logger, tracing::Level::DEBUG)
    }

    pub fn with_min_level(logger: EdgeLogger, min_level: tracing::Level) -> Self {
        Self {
            logger,
            min_level,
            total_events: Arc::new(AtomicU64::new(0)),
            forwarded_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

fn map_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        tracing::Level::DEBUG | tracing::Level::TRACE => Level::Debug,
    }
}

impl<S> Layer<S> for EdgeLogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if *meta.level() > self.min_level || meta.target().starts_with(env!("CARGO_CRATE_NAME")) {
            return;
        }

        let mut fields = Fields::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        fields
            .entry("target".to_string())
            .or_insert_with(|| serde_json::Value::from(meta.target()));

        self.logger.record(
            map_level(meta.level()),
            message.unwrap_or_default(),
            Some(fields),
        );
        self.forwarded_events.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Fields,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let rendered = crate::format::ErrorValue::from_error(value).render();
        self.fields.insert(field.name().to_string(), serde_json::Value::String(rendered));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
