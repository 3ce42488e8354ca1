use crate::error::SinkError;
use async_trait::async_trait;

/// A serialized batch addressed to the ingest endpoint.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Full dataset-scoped URL, see [`ingest_url`].
    pub url: String,
    pub api_key: String,
    /// JSON array of records.
    pub body: Vec<u8>,
}

impl IngestRequest {
    pub const CONTENT_TYPE: &'static str = "application/json";

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

/// Outcome of a request that reached the endpoint. The body has been read
/// in full by the time a sink returns this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl IngestResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Asynchronous delivery client for batches produced by the engine.
///
/// Implementations send bytes and report what came back. They do not retry
/// and do not interpret the status; a delivery that fails is reported to the
/// fallback sink by the engine and the batch stays buffered for the next
/// flush.
#[async_trait]
pub trait IngestSink: Send + Sync {
    /// Submit one batch.
    ///
    /// **Returns**
    /// - `Ok(response)` whenever the endpoint answered, whatever the status.
    /// - `Err(..)` if the request never completed (connection refused,
    ///   TLS failure, timeout imposed by the transport, etc).
    async fn send(&self, request: IngestRequest) -> Result<IngestResponse, SinkError>;
}

/// `{base}/datasets/{dataset}/ingest`, with the dataset name percent-encoded.
pub fn ingest_url(base: &str, dataset: &str) -> String {
    format!(
        "{}/datasets/{}/ingest",
        base.trim_end_matches('/'),
        urlencoding::encode(dataset)
    )
}
