use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use super::throttle::Throttle;

/// Outcome of a single GET that did not produce a page.
#[derive(Debug)]
enum AttemptError {
    /// Network failure, 429 or 5xx. Worth another try.
    Transient(String),
    /// Any other non-success status.
    Permanent(StatusCode),
}

impl AttemptError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

pub struct HttpClient {
    inner: reqwest::Client,
    throttle: Throttle,
    max_attempts: u32,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        let throttle = Throttle::new(config.mean_delay_secs)?;

        Ok(Self {
            inner,
            throttle,
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// Fetch a URL as text after a throttle delay, retrying transient failures.
    ///
    /// Each retry waits a freshly sampled throttle delay. Exhausting every
    /// attempt gives [`ScrapeError::NoResponse`].
    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        self.throttle.wait().await;

        let schedule = self.throttle.delays(self.max_attempts as usize - 1);
        let mut attempt = 0u32;

        let result = RetryIf::spawn(
            schedule,
            || {
                attempt += 1;
                self.try_once(url, attempt)
            },
            AttemptError::is_transient,
        )
        .await;

        match result {
            Ok(text) => Ok(text),
            Err(AttemptError::Permanent(status)) => Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status,
            }),
            Err(AttemptError::Transient(cause)) => Err(ScrapeError::NoResponse {
                url: url.to_string(),
                attempts: self.max_attempts,
                cause,
            }),
        }
    }

    async fn try_once(&self, url: &str, attempt: u32) -> Result<String, AttemptError> {
        debug!("GET {} (attempt {}/{})", url, attempt, self.max_attempts);

        let resp = match self.inner.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("No response from server on attempt {}: {}", attempt, e);
                return Err(AttemptError::Transient(e.to_string()));
            }
        };

        let status = resp.status();
        if status.is_success() {
            return resp.text().await.map_err(|e| {
                warn!("Failed to read body on attempt {}: {}", attempt, e);
                AttemptError::Transient(e.to_string())
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            warn!("HTTP {} on attempt {}, retrying", status, attempt);
            Err(AttemptError::Transient(format!("HTTP {}", status)))
        } else {
            Err(AttemptError::Permanent(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client(max_attempts: u32) -> HttpClient {
        let config = ScraperConfig {
            mean_delay_secs: 0.0,
            max_attempts,
            timeout_secs: 5,
            ..Default::default()
        };
        HttpClient::new(&config).unwrap()
    }

    /// Answer every connection with `status_line`; returns the base URL and a hit counter.
    async fn serve_status(status_line: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status_line
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/", addr), hits)
    }

    #[tokio::test]
    async fn test_refused_connection_exhausts_attempts() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{}/", port);

        let err = client(3).get_text(&url).await.unwrap_err();
        assert!(err.is_fatal());
        match err {
            ScrapeError::NoResponse { url: failed, attempts, cause } => {
                assert_eq!(failed, url);
                assert_eq!(attempts, 3);
                assert!(!cause.is_empty());
            }
            other => panic!("expected NoResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let (url, hits) = serve_status("404 Not Found").await;

        let err = client(3).get_text(&url).await.unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::HttpStatus { status: StatusCode::NOT_FOUND, .. }
        ));
        assert!(!err.is_fatal());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_no_response() {
        let (url, hits) = serve_status("503 Service Unavailable").await;

        let err = client(3).get_text(&url).await.unwrap_err();
        match err {
            ScrapeError::NoResponse { attempts, cause, .. } => {
                assert_eq!(attempts, 3);
                assert!(cause.contains("503"), "cause was {:?}", cause);
            }
            other => panic!("expected NoResponse, got {:?}", other),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let body = "<html>ok</html>";
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        let text = client(3).get_text(&format!("http://{}/", addr)).await.unwrap();
        assert_eq!(text, "<html>ok</html>");
    }
}
