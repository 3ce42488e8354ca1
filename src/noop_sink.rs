use crate::error::SinkError;
use crate::sink::{IngestRequest, IngestResponse, IngestSink};
use async_trait::async_trait;

/// A sink that accepts every batch without sending it anywhere.
///
/// Useful for measuring the overhead of the engine itself without any
/// network I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl IngestSink for NoopSink {
    async fn send(&self, _request: IngestRequest) -> Result<IngestResponse, SinkError> {
        Ok(IngestResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: String::new(),
        })
    }
}
