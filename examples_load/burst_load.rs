use std::sync::Arc;
use std::time::Instant;

use edge_log_sink::noop_sink::NoopSink;
use edge_log_sink::{EdgeLogger, LoggerConfig, TaskQueue};

#[tokio::main]
async fn main() {
    let queue = TaskQueue::new();
    let config = LoggerConfig {
        count_threshold: 1_000,
        ..LoggerConfig::new("load-test-key")
    };
    let logger = EdgeLogger::builder(config)
        .deferred(Arc::new(queue.clone()))
        .sink(Arc::new(NoopSink))
        .build();

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        let mut fields = edge_log_sink::Fields::new();
        fields.insert("iteration".to_string(), i.into());
        logger.info("burst load event", Some(fields));
    }

    let recorded = start.elapsed();
    logger.flush_in_background();
    queue.drain().await;

    println!(
        "recorded {} events in {:?} (~{:.0} ev/s), drained in {:?}, {} left buffered",
        n,
        recorded,
        n as f64 / recorded.as_secs_f64(),
        start.elapsed() - recorded,
        logger.buffered_len()
    );
}
