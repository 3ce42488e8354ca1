use crate::env::*;
use crate::error::ConfigError;
use std::str::FromStr;
use tokio::time::Duration;

pub const DEFAULT_DATASET: &str = "edge-logger";
pub const DEFAULT_INGEST_URL: &str = "https://api.axiom.co/v1";
pub const DEFAULT_COUNT_THRESHOLD: usize = 100;
pub const DEFAULT_TIME_THRESHOLD: Duration = Duration::from_millis(10_000);

/// Engine configuration.
///
/// **Fields**
/// - `api_key`: bearer token for the ingest endpoint. Absent or blank keys
///   put the engine in degraded mode where every record is also written to
///   the fallback sink.
/// - `dataset`: dataset the batches are ingested into.
/// - `service_name`: stamped on every record as `service` when set.
/// - `ingest_url`: API base URL; `/datasets/{dataset}/ingest` is appended.
/// - `time_threshold`: maximum time a buffered record waits for a flush.
/// - `count_threshold`: buffer length that triggers an immediate flush.
/// - `request_id`: id stamped on every record; generated when `None`.
/// - `local_dev`: render records to the fallback sink instead of
///   buffering and delivering them.
#[derive(Clone, Debug)]
pub struct LoggerConfig {
    pub api_key: Option<String>,
    pub dataset: String,
    pub service_name: Option<String>,
    pub ingest_url: String,
    pub time_threshold: Duration,
    pub count_threshold: usize,
    pub request_id: Option<String>,
    pub local_dev: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            dataset: DEFAULT_DATASET.to_string(),
            service_name: None,
            ingest_url: DEFAULT_INGEST_URL.to_string(),
            time_threshold: DEFAULT_TIME_THRESHOLD,
            count_threshold: DEFAULT_COUNT_THRESHOLD,
            request_id: None,
            local_dev: false,
        }
    }
}

impl LoggerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Build a config from the `EDGE_LOG_*` variables in [`crate::env`],
    /// using defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let time_threshold = match env_opt(EDGE_LOG_TIME_THRESHOLD_MS_ENV) {
            Some(raw) => Duration::from_millis(parse(EDGE_LOG_TIME_THRESHOLD_MS_ENV, &raw)?),
            None => defaults.time_threshold,
        };
        let count_threshold = match env_opt(EDGE_LOG_COUNT_THRESHOLD_ENV) {
            Some(raw) => parse(EDGE_LOG_COUNT_THRESHOLD_ENV, &raw)?,
            None => defaults.count_threshold,
        };
        let local_dev = match env_opt(EDGE_LOG_LOCAL_DEV_ENV) {
            Some(raw) => parse_flag(EDGE_LOG_LOCAL_DEV_ENV, &raw)?,
            None => defaults.local_dev,
        };

        Ok(Self {
            api_key: env_opt(EDGE_LOG_API_KEY_ENV),
            dataset: env_or(EDGE_LOG_DATASET_ENV, DEFAULT_DATASET),
            service_name: env_opt(EDGE_LOG_SERVICE_NAME_ENV),
            ingest_url: env_or(EDGE_LOG_INGEST_URL_ENV, DEFAULT_INGEST_URL),
            time_threshold,
            count_threshold,
            request_id: env_opt(EDGE_LOG_REQUEST_ID_ENV),
            local_dev,
        })
    }

    /// The key to send, or `None` if it is missing or blank.
    pub fn valid_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Clamp degenerate thresholds: at least one record and one millisecond.
    pub(crate) fn normalized(mut self) -> Self {
        self.count_threshold = self.count_threshold.max(1);
        if self.time_threshold < Duration::from_millis(1) {
            self.time_threshold = Duration::from_millis(1);
        }
        self
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}
