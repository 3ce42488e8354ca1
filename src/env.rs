/// Environment variable names read by
/// [`LoggerConfig::from_env`](crate::config::LoggerConfig::from_env).
///
/// These are purely helpers; the engine itself never touches the
/// environment.

/// Ingest API token.
pub const EDGE_LOG_API_KEY_ENV: &str = "EDGE_LOG_API_KEY";

/// Target dataset name.
pub const EDGE_LOG_DATASET_ENV: &str = "EDGE_LOG_DATASET";

/// Optional logical service name stamped on every record.
pub const EDGE_LOG_SERVICE_NAME_ENV: &str = "EDGE_LOG_SERVICE_NAME";

/// Ingest API base URL, e.g. `https://api.axiom.co/v1`.
pub const EDGE_LOG_INGEST_URL_ENV: &str = "EDGE_LOG_INGEST_URL";

/// Time threshold in milliseconds.
pub const EDGE_LOG_TIME_THRESHOLD_MS_ENV: &str = "EDGE_LOG_TIME_THRESHOLD_MS";

/// Count threshold.
pub const EDGE_LOG_COUNT_THRESHOLD_ENV: &str = "EDGE_LOG_COUNT_THRESHOLD";

/// Fixed request id instead of a generated one.
pub const EDGE_LOG_REQUEST_ID_ENV: &str = "EDGE_LOG_REQUEST_ID";

/// `true`/`1` enables local development output.
pub const EDGE_LOG_LOCAL_DEV_ENV: &str = "EDGE_LOG_LOCAL_DEV";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable, treating unset and empty as absent.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
