use std::sync::Arc;

use edge_log_sink::init::init_tracing;
use edge_log_sink::{EdgeLogger, LoggerConfig, TaskQueue};
use tracing::{error, info};

/// Reads `EDGE_LOG_*` variables, forwards `tracing` events to the ingest
/// API and flushes before exiting, the way a request handler would before
/// returning its response.
#[tokio::main]
async fn main() {
    let config = match LoggerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid logger configuration: {}", e);
            return;
        }
    };

    let queue = TaskQueue::new();
    let logger = EdgeLogger::new(config, Some(Arc::new(queue.clone())));
    if let Err(e) = init_tracing(logger.clone()) {
        eprintln!("{}", e);
    }

    info!(route = "/checkout", "handling request");
    error!(user_id = 42, reason = "card declined", "payment failed");

    logger.flush_in_background();
    queue.drain().await;
}
