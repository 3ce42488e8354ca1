use crate::error::SinkError;
use crate::sink::{IngestRequest, IngestResponse, IngestSink};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// [`IngestSink`] that POSTs batches over HTTP(S) with `reqwest`.
///
/// No request timeout is set unless [`HttpSink::with_timeout`] is used, so
/// deliveries are bounded only by the client and the platform.
#[derive(Clone, Debug, Default)]
pub struct HttpSink {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpSink {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Reuse an existing client (connection pool, proxy settings).
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl IngestSink for HttpSink {
    async fn send(&self, request: IngestRequest) -> Result<IngestResponse, SinkError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, IngestRequest::CONTENT_TYPE)
            .header(AUTHORIZATION, request.authorization())
            .body(request.body);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "failed to read ingest response body");
                "<no body>".to_string()
            }
        };

        Ok(IngestResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tracing_test::traced_test;

    /// Answers one request with a 200 whose body is cut short.
    async fn truncated_ok_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut seen = Vec::new();
            let mut buf = [0u8; 1024];
            while !(seen.windows(4).any(|w| w == b"\r\n\r\n") && seen.ends_with(b"[]")) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/datasets/logs/ingest", addr)
    }

    #[tokio::test]
    #[traced_test]
    async fn unreadable_body_on_success_is_logged() {
        let url = truncated_ok_server().await;

        let response = HttpSink::new()
            .send(IngestRequest {
                url,
                api_key: "key".to_string(),
                body: b"[]".to_vec(),
            })
            .await
            .expect("status line was received");

        assert!(response.is_success());
        assert_eq!(response.body, "<no body>");
        assert!(logs_contain("failed to read ingest response body"));
    }
}
