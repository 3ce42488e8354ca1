use crate::record::{Level, LogRecord};
use colored::Colorize;

/// Human-readable single record for local development:
/// `LEVEL [request-id] message`, followed by the pretty-printed fields when
/// there are any.
pub fn render(record: &LogRecord) -> String {
    let label = format!("{:<7}", record.level.as_str().to_uppercase());
    let label = match record.level {
        Level::Error => label.red().bold(),
        Level::Warn => label.yellow().bold(),
        Level::Info => label.cyan(),
        Level::Debug => label.dimmed(),
    };

    let mut line = format!("{} [{}] {}", label, record.request_id, record.message);
    if !record.fields.is_empty() {
        if let Ok(fields) = serde_json::to_string_pretty(&record.fields) {
            line.push('\n');
            line.push_str(&fields);
        }
    }
    line
}
