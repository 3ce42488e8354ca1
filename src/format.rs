use crate::record::{Fields, Level, LogRecord};
use chrono::Utc;
use std::error::Error;
use std::sync::Arc;

/// Source of the correlation id linking a record to a distributed trace.
///
/// Returning `None` is normal: most records are written outside any traced
/// span.
pub trait TraceContext: Send + Sync {
    fn correlation_id(&self) -> Option<String>;
}

impl<F> TraceContext for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn correlation_id(&self) -> Option<String> {
        (self)()
    }
}

/// Trace context for hosts without tracing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTraceContext;

impl TraceContext for NoTraceContext {
    fn correlation_id(&self) -> Option<String> {
        None
    }
}

/// Anything the `error` entry point accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorValue {
    Message(String),
    Error {
        description: String,
        trace: Option<String>,
    },
    Value(serde_json::Value),
}

impl ErrorValue {
    /// Capture an error's description and, when it has one, its source
    /// chain as trace detail.
    pub fn from_error<E: Error + ?Sized>(err: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        ErrorValue::Error {
            description: err.to_string(),
            trace: if causes.is_empty() {
                None
            } else {
                Some(causes.join(": "))
            },
        }
    }

    pub fn render(&self) -> String {
        match self {
            ErrorValue::Message(message) => message.clone(),
            ErrorValue::Error {
                description,
                trace: Some(trace),
            } => format!("{}: {}", description, trace),
            ErrorValue::Error {
                description,
                trace: None,
            } => description.clone(),
            ErrorValue::Value(serde_json::Value::String(s)) => s.clone(),
            ErrorValue::Value(value) => value.to_string(),
        }
    }
}

impl From<&str> for ErrorValue {
    fn from(message: &str) -> Self {
        ErrorValue::Message(message.to_string())
    }
}

impl From<String> for ErrorValue {
    fn from(message: String) -> Self {
        ErrorValue::Message(message)
    }
}

impl From<serde_json::Value> for ErrorValue {
    fn from(value: serde_json::Value) -> Self {
        ErrorValue::Value(value)
    }
}

impl From<Box<dyn Error + Send + Sync>> for ErrorValue {
    fn from(err: Box<dyn Error + Send + Sync>) -> Self {
        ErrorValue::from_error(err.as_ref())
    }
}

impl From<&(dyn Error + 'static)> for ErrorValue {
    fn from(err: &(dyn Error + 'static)) -> Self {
        ErrorValue::from_error(err)
    }
}

/// Builds [`LogRecord`]s stamped with the engine's request id and service.
#[derive(Clone)]
pub struct RecordFormatter {
    request_id: String,
    service: Option<String>,
    trace_context: Arc<dyn TraceContext>,
}

impl RecordFormatter {
    pub fn new(
        request_id: String,
        service: Option<String>,
        trace_context: Arc<dyn TraceContext>,
    ) -> Self {
        Self {
            request_id,
            service,
            trace_context,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// A `level` entry in `fields` naming a known level takes precedence over
    /// `level`. The entry itself stays in `fields` and is written verbatim.
    pub fn format(&self, message: String, level: Level, fields: Option<Fields>) -> LogRecord {
        let fields = fields.unwrap_or_default();
        let level = fields
            .get("level")
            .and_then(|v| v.as_str())
            .and_then(Level::parse)
            .unwrap_or(level);

        LogRecord {
            message,
            level,
            time: Utc::now(),
            request_id: self.request_id.clone(),
            trace_id: self.trace_context.correlation_id(),
            service: self.service.clone(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapped {
        inner: std::io::Error,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }

    impl Error for Wrapped {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.inner)
        }
    }

    fn formatter() -> RecordFormatter {
        RecordFormatter::new("req-9".to_string(), None, Arc::new(NoTraceContext))
    }

    #[test]
    fn field_level_overrides_argument() {
        let mut fields = Fields::new();
        fields.insert("level".to_string(), json!("error"));
        let record = formatter().format("msg".to_string(), Level::Info, Some(fields));
        assert_eq!(record.level, Level::Error);
    }

    #[test]
    fn unknown_field_level_keeps_argument() {
        let mut fields = Fields::new();
        fields.insert("level".to_string(), json!(3));
        let record = formatter().format("msg".to_string(), Level::Warn, Some(fields));
        assert_eq!(record.level, Level::Warn);
    }

    #[test]
    fn stamps_correlation_id_from_trace_context() {
        let formatter = RecordFormatter::new(
            "req-1".to_string(),
            Some("api".to_string()),
            Arc::new(|| Some("trace-abc".to_string())),
        );
        let record = formatter.format("msg".to_string(), Level::Info, None);
        assert_eq!(record.trace_id.as_deref(), Some("trace-abc"));
        assert_eq!(record.service.as_deref(), Some("api"));
        assert_eq!(record.request_id, "req-1");
    }

    #[test]
    fn error_with_source_renders_trace_after_separator() {
        let err = Wrapped {
            inner: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let rendered = ErrorValue::from_error(&err).render();
        assert!(rendered.starts_with("boom"));
        assert_eq!(rendered, "boom: disk full");
    }

    #[test]
    fn error_without_source_renders_description() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(ErrorValue::from_error(&err).render(), "boom");
    }

    #[test]
    fn arbitrary_values_render_as_json_text() {
        assert_eq!(ErrorValue::from(json!({"code": 7})).render(), r#"{"code":7}"#);
        assert_eq!(ErrorValue::from(json!("plain")).render(), "plain");
        assert_eq!(ErrorValue::from(json!(null)).render(), "null");
    }
}
