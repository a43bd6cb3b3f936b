//! HTTP transport backed by `reqwest`.

use std::future::Future;

use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::config::{ClientConfig, ConfigError};

use super::transport::{Transport, TransportError, TransportRequest, TransportResponse};

/// Sends requests over HTTP to a configured origin.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
        async move {
            let url = request
                .url(&self.base_url)
                .ok_or_else(|| TransportError::new("base url cannot carry a path"))?;
            debug!(method = %request.method, %url, "sending request");

            let mut builder = self.client.request(request.method.into(), url);
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|err| {
                warn!(error = %err, "request failed without a response");
                TransportError::new(err.to_string())
            })?;

            let status = response.status().as_u16();
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    warn!(status, error = %err, "failed to read response body");
                    String::new()
                }
            };
            debug!(status, bytes = body.len(), "received response");

            Ok(TransportResponse { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::transport::Method;

    #[test]
    fn builds_from_default_config() {
        let transport = HttpTransport::new(&ClientConfig::default()).unwrap();
        assert_eq!(transport.base_url().as_str(), "http://localhost:8080/");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let config = ClientConfig {
            // Port 9 (discard) on loopback is closed on CI machines.
            base_url: String::from("http://127.0.0.1:9"),
            timeout_ms: 500,
        };
        let transport = HttpTransport::new(&config).unwrap();

        let result = transport
            .send(TransportRequest::new(Method::Get, ["api", "domain", "x"]))
            .await;
        assert!(result.is_err());
    }
}
