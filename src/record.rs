use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Caller-supplied structured data attached to a record.
pub type Fields = BTreeMap<String, serde_json::Value>;

/// Severity of a [`LogRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warning",
            Level::Error => "error",
        }
    }

    /// Parse a level name as callers put it in a `level` field.
    ///
    /// Matching is case-insensitive and accepts `warn` as well as `warning`.
    pub fn parse(name: &str) -> Option<Level> {
        match name.to_ascii_lowercase().as_str() {
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single normalized log entry, immutable once built by the formatter.
///
/// Serializes to the ingest shape
/// `{message, level, traceId?, _time, service?, requestId, ...fields}` where
/// caller fields are written last and replace any earlier key of the same
/// name.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub message: String,
    pub level: Level,
    pub time: DateTime<Utc>,
    pub request_id: String,
    pub trace_id: Option<String>,
    pub service: Option<String>,
    pub fields: Fields,
}

impl LogRecord {
    /// Timestamp in the ISO-8601 form used on the wire (millisecond
    /// precision, `Z` suffix).
    pub fn timestamp(&self) -> String {
        self.time.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn base_entries(&self) -> Vec<(&'static str, serde_json::Value)> {
        let mut entries = vec![
            ("message", serde_json::Value::from(self.message.as_str())),
            ("level", serde_json::Value::from(self.level.as_str())),
        ];
        if let Some(trace_id) = &self.trace_id {
            entries.push(("traceId", serde_json::Value::from(trace_id.as_str())));
        }
        entries.push(("_time", serde_json::Value::from(self.timestamp())));
        if let Some(service) = &self.service {
            entries.push(("service", serde_json::Value::from(service.as_str())));
        }
        entries.push(("requestId", serde_json::Value::from(self.request_id.as_str())));
        entries
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let base: Vec<_> = self
            .base_entries()
            .into_iter()
            .filter(|(key, _)| !self.fields.contains_key(*key))
            .collect();

        let mut map = serializer.serialize_map(Some(base.len() + self.fields.len()))?;
        for (key, value) in &base {
            map.serialize_entry(key, value)?;
        }
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(fields: Fields) -> LogRecord {
        LogRecord {
            message: "hello".to_string(),
            level: Level::Info,
            time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            request_id: "req-1".to_string(),
            trace_id: None,
            service: Some("checkout".to_string()),
            fields,
        }
    }

    #[test]
    fn serializes_ingest_shape() {
        let value = serde_json::to_value(record(Fields::new())).unwrap();
        assert_eq!(
            value,
            json!({
                "message": "hello",
                "level": "info",
                "_time": "2024-03-01T12:30:00.000Z",
                "service": "checkout",
                "requestId": "req-1",
            })
        );
    }

    #[test]
    fn warn_level_is_written_as_warning() {
        let mut r = record(Fields::new());
        r.level = Level::Warn;
        let value = serde_json::to_value(r).unwrap();
        assert_eq!(value["level"], json!("warning"));
        assert_eq!(Level::parse(Level::Warn.as_str()), Some(Level::Warn));
    }

    #[test]
    fn omits_absent_trace_id_and_service() {
        let mut r = record(Fields::new());
        r.service = None;
        let value = serde_json::to_value(r).unwrap();
        assert!(value.get("traceId").is_none());
        assert!(value.get("service").is_none());
    }

    #[test]
    fn caller_fields_override_base_keys() {
        let mut fields = Fields::new();
        fields.insert("message".to_string(), json!("overridden"));
        fields.insert("user_id".to_string(), json!(42));
        let text = serde_json::to_string(&record(fields)).unwrap();

        assert_eq!(text.matches("\"message\"").count(), 1);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["message"], json!("overridden"));
        assert_eq!(value["user_id"], json!(42));
    }

    #[test]
    fn parses_level_names() {
        assert_eq!(Level::parse("WARNING"), Some(Level::Warn));
        assert_eq!(Level::parse("warn"), Some(Level::Warn));
        assert_eq!(Level::parse("debug"), Some(Level::Debug));
        assert_eq!(Level::parse("fatal"), None);
    }
}
