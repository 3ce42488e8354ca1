use std::sync::Arc;

use async_trait::async_trait;
use edge_log_sink::error::SinkError;
use edge_log_sink::{EdgeLogger, IngestRequest, IngestResponse, IngestSink, LoggerConfig, TaskQueue};

/// Example of delivering batches through a custom transport by
/// implementing `IngestSink` directly. Here the batch is only printed.
struct StdoutSink;

#[async_trait]
impl IngestSink for StdoutSink {
    async fn send(&self, request: IngestRequest) -> Result<IngestResponse, SinkError> {
        println!("[stdout-sink] POST {} ({} bytes)", request.url, request.body.len());
        println!("{}", String::from_utf8_lossy(&request.body));
        Ok(IngestResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: String::new(),
        })
    }
}

#[tokio::main]
async fn main() {
    let queue = TaskQueue::new();
    let logger = EdgeLogger::builder(LoggerConfig::new("example-key"))
        .deferred(Arc::new(queue.clone()))
        .sink(Arc::new(StdoutSink))
        .build();

    logger.info("custom sink example started", None);
    logger.error("simulated failure sent via custom sink", None);

    logger.flush_in_background();
    queue.drain().await;
}
