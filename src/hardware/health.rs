//! Inference endpoint health probe

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of probing the inference server
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub url: String,
    pub reachable: bool,
    pub status: Option<u16>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl HealthReport {
    /// Reachable and answered with a 2xx status
    pub fn is_healthy(&self) -> bool {
        self.reachable && self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

/// `/health` URL for an OpenAI-compatible base URL (`.../v1/` is stripped)
pub fn health_url(api_base_url: &str) -> String {
    let base = api_base_url.trim_end_matches('/');
    let base = base.strip_suffix("/v1").unwrap_or(base);
    format!("{}/health", base)
}

/// Issues `GET <server>/health` and records status and latency
pub async fn probe(api_base_url: &str, timeout: Duration) -> HealthReport {
    let url = health_url(api_base_url);
    debug!("Probing {}", url);

    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            return HealthReport {
                url,
                reachable: false,
                status: None,
                latency_ms: None,
                error: Some(e.to_string()),
            }
        }
    };

    let started = Instant::now();
    match client.get(&url).send().await {
        Ok(response) => HealthReport {
            url,
            reachable: true,
            status: Some(response.status().as_u16()),
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => HealthReport {
            url,
            reachable: false,
            status: None,
            latency_ms: None,
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use yare::parameterized;

    #[parameterized(
        with_v1_slash = { "http://localhost:8080/v1/", "http://localhost:8080/health" },
        with_v1 = { "http://localhost:8080/v1", "http://localhost:8080/health" },
        bare = { "http://127.0.0.1:9000", "http://127.0.0.1:9000/health" },
        nested = { "https://llm.internal/api/v1/", "https://llm.internal/api/health" },
    )]
    fn test_health_url(base: &str, expected: &str) {
        assert_eq!(health_url(base), expected);
    }

    #[tokio::test]
    async fn test_probe_healthy_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 15\r\nconnection: close\r\n\r\n{\"status\":\"ok\"}")
                .await
                .unwrap();
        });

        let report = probe(&format!("http://{}/v1/", addr), Duration::from_secs(5)).await;
        assert!(report.reachable);
        assert_eq!(report.status, Some(200));
        assert!(report.is_healthy());
        assert!(report.latency_ms.is_some());
    }

    #[tokio::test]
    async fn test_probe_unreachable_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let report = probe(&format!("http://{}/v1/", addr), Duration::from_secs(2)).await;
        assert!(!report.reachable);
        assert!(!report.is_healthy());
        assert!(report.error.is_some());
    }
}
