use async_trait::async_trait;
use edge_log_sink::error::SinkError;
use edge_log_sink::fallback::MemorySink;
use edge_log_sink::{EdgeLogger, IngestRequest, IngestResponse, IngestSink, LoggerConfig, TaskQueue};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

pub enum Outcome {
    Status(u16, &'static str, &'static str),
    Fault(&'static str),
}

/// Records every request and answers from a script, 200 once the script
/// runs out. With a gate, each delivery waits for one permit before
/// answering.
#[derive(Default)]
pub struct ScriptedSink {
    requests: Mutex<Vec<IngestRequest>>,
    outcomes: Mutex<VecDeque<Outcome>>,
    gate: Option<Arc<Semaphore>>,
    pub started: Notify,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_outcome(&self, outcome: Outcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn requests(&self) -> Vec<IngestRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Messages in the `index`th payload, in order.
    pub fn messages(&self, index: usize) -> Vec<String> {
        let requests = self.requests();
        let batch: Vec<serde_json::Value> = serde_json::from_slice(&requests[index].body).unwrap();
        batch
            .iter()
            .map(|r| r["message"].as_str().unwrap().to_string())
            .collect()
    }
}

#[async_trait]
impl IngestSink for ScriptedSink {
    async fn send(&self, request: IngestRequest) -> Result<IngestResponse, SinkError> {
        self.requests.lock().unwrap().push(request);
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let outcome = self.outcomes.lock().unwrap().pop_front();
        match outcome {
            None => Ok(IngestResponse {
                status: 200,
                status_text: "OK".to_string(),
                body: String::new(),
            }),
            Some(Outcome::Status(status, status_text, body)) => Ok(IngestResponse {
                status,
                status_text: status_text.to_string(),
                body: body.to_string(),
            }),
            Some(Outcome::Fault(message)) => Err(SinkError::Transport(message.to_string())),
        }
    }
}

pub struct Harness {
    pub logger: EdgeLogger,
    pub queue: TaskQueue,
    pub sink: Arc<ScriptedSink>,
    pub fallback: Arc<MemorySink>,
}

pub fn config(count_threshold: usize) -> LoggerConfig {
    let mut config = LoggerConfig::new("test-key");
    config.count_threshold = count_threshold;
    config.request_id = Some("req-test".to_string());
    config
}

pub fn harness(config: LoggerConfig, sink: ScriptedSink) -> Harness {
    let queue = TaskQueue::new();
    let sink = Arc::new(sink);
    let fallback = Arc::new(MemorySink::new());
    let logger = EdgeLogger::builder(config)
        .deferred(Arc::new(queue.clone()))
        .sink(Arc::clone(&sink) as Arc<dyn IngestSink>)
        .fallback(Arc::clone(&fallback) as Arc<dyn edge_log_sink::fallback::FallbackSink>)
        .build();

    Harness {
        logger,
        queue,
        sink,
        fallback,
    }
}
