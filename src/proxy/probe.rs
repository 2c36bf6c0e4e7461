//! Probe client issuing echo requests through a proxy

use crate::proxy::models::ProxyAddress;
use async_trait::async_trait;
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::{Client, Proxy as ReqwestProxy, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Why a probe did not produce a usable response
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid proxy address: {0}")]
    InvalidProxy(#[source] reqwest::Error),
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected HTTP status: {0}")]
    Status(u16),
}

/// Headers and body of a 200 response relayed by the proxy.
///
/// Any other status is reported as `ProbeError::Status`.
#[derive(Debug, Clone, Default)]
pub struct ProbeResponse {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

pub type ProbeResult = std::result::Result<ProbeResponse, ProbeError>;

/// One request through one proxy. Failures are returned, never raised.
#[async_trait]
pub trait ProbeClient: Send + Sync {
    async fn probe(&self, address: &ProxyAddress) -> ProbeResult;
}

/// Probe client backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpProbeClient {
    target_url: String,
    timeout: Duration,
}

impl HttpProbeClient {
    pub fn new(target_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            target_url: target_url.into(),
            timeout,
        }
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create a single-use client routed through the proxy for both schemes
    fn create_client(&self, address: &ProxyAddress) -> Result<Client, ProbeError> {
        let proxy = ReqwestProxy::all(address.url()).map_err(ProbeError::InvalidProxy)?;

        Client::builder()
            .proxy(proxy)
            .timeout(self.timeout)
            .build()
            .map_err(ProbeError::InvalidProxy)
    }

    async fn exchange(&self, client: &Client) -> ProbeResult {
        let response = client
            .get(&self.target_url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(ProbeResponse {
            headers,
            body: body.to_vec(),
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> ProbeError {
        if error.is_timeout() {
            ProbeError::Timeout(self.timeout)
        } else {
            ProbeError::Transport(error)
        }
    }
}

#[async_trait]
impl ProbeClient for HttpProbeClient {
    async fn probe(&self, address: &ProxyAddress) -> ProbeResult {
        let client = self.create_client(address)?;

        let result = match tokio::time::timeout(self.timeout, self.exchange(&client)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };

        if let Err(ref e) = result {
            debug!("probe through {} failed: {}", address, e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const TARGET: &str = "http://echo.test/ip";

    /// Fake proxy answering every request with a canned response
    async fn spawn_fake_proxy(response: &'static str) -> ProxyAddress {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    loop {
                        let n = match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => n,
                        };
                        request.extend_from_slice(&buf[..n]);
                        if request.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        ProxyAddress::new(addr.to_string())
    }

    #[tokio::test]
    async fn test_probe_success() {
        let address = spawn_fake_proxy(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nVia: 1.1 squid\r\nContent-Length: 22\r\nConnection: close\r\n\r\n{\"origin\": \"1.2.3.4\"}\n",
        )
        .await;

        let client = HttpProbeClient::new(TARGET, Duration::from_secs(5));
        let response = client.probe(&address).await.unwrap();
        assert!(response.headers.contains_key("Via"));
        assert_eq!(response.body, b"{\"origin\": \"1.2.3.4\"}\n");
    }

    #[tokio::test]
    async fn test_probe_non_200_is_failure() {
        let address = spawn_fake_proxy(
            "HTTP/1.1 407 Proxy Authentication Required\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let client = HttpProbeClient::new(TARGET, Duration::from_secs(5));
        let result = client.probe(&address).await;
        assert!(matches!(result, Err(ProbeError::Status(407))));
    }

    #[tokio::test]
    async fn test_probe_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = ProxyAddress::new(listener.local_addr().unwrap().to_string());
        tokio::spawn(async move {
            // Accept and hold the connection without ever answering
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let client = HttpProbeClient::new(TARGET, Duration::from_millis(200));
        let result = client.probe(&address).await;
        assert!(matches!(result, Err(ProbeError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_probe_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = ProxyAddress::new(listener.local_addr().unwrap().to_string());
        drop(listener);

        let client = HttpProbeClient::new(TARGET, Duration::from_secs(2));
        assert!(client.probe(&address).await.is_err());
    }

    #[tokio::test]
    async fn test_probe_invalid_proxy() {
        let client = HttpProbeClient::new(TARGET, Duration::from_secs(2));
        let result = client.probe(&ProxyAddress::new("127.0.0.1:notaport")).await;
        assert!(matches!(result, Err(ProbeError::InvalidProxy(_))));
    }
}
