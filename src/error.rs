/// Error returned by an [`IngestSink`](crate::sink::IngestSink) when the
/// request could not be completed at the transport level.
///
/// A response with a non-success status is not an error here; the engine
/// inspects the status itself.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[cfg(feature = "http")]
    #[error("ingest request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Error returned when reading [`LoggerConfig`](crate::config::LoggerConfig)
/// from the environment.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Error returned by the global subscriber helpers in [`crate::init`].
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}
