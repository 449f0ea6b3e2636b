// Spine PDS client over TLS MA
// Author: kelexine (https://github.com/kelexine)

use super::tls;
use super::BackendClient;
use crate::config::{SpineConfig, TlsConfig};
use crate::error::{GatewayError, Result};
use crate::metrics;
use crate::models::{BackendResponse, OutboundRequest};
use crate::utils::logging::preview;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Client for the Spine PDS synchronous query service.
///
/// The underlying connection pool and TLS configuration are built once and
/// shared read-only by every worker. There is no retry: a failed call
/// surfaces as [`GatewayError::Transport`] and the classifier routes it to
/// the error path.
pub struct SpineClient {
    http_client: Client,
    timeout: Duration,
}

impl SpineClient {
    /// Create a client presenting the configured client certificate.
    ///
    /// This method will:
    /// 1. Configure a pooled rustls HTTP client with the request timeout
    /// 2. Attach the client identity and any extra Spine root certificates
    pub fn new(spine: &SpineConfig, tls_config: &TlsConfig) -> Result<Self> {
        let timeout = Duration::from_secs(spine.timeout_seconds);

        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(spine.connect_timeout_seconds))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls();

        if let Some(identity) = tls::load_identity(tls_config)? {
            builder = builder.identity(identity);
        }
        for cert in tls::load_root_certificates(tls_config)? {
            builder = builder.add_root_certificate(cert);
        }

        let http_client = builder
            .build()
            .map_err(|e| GatewayError::Tls(format!("Failed to create HTTP client: {}", e)))?;

        debug!(
            "Created Spine client (timeout {}s, client auth: {})",
            spine.timeout_seconds, tls_config.enabled
        );

        Ok(Self {
            http_client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl BackendClient for SpineClient {
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse> {
        debug!("POST {} ({} bytes)", request.destination_uri, request.body.len());
        let start = Instant::now();

        // Only the SOAP action and content type go out; no client headers
        let result = self
            .http_client
            .post(&request.destination_uri)
            .header("SOAPaction", &request.soap_action)
            .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
            .body(request.body)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                metrics::record_backend_call("connection_failure", start.elapsed().as_secs_f64());
                warn!("Spine call to {} failed: {}", request.destination_uri, e);
                return Err(GatewayError::Transport(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                metrics::record_backend_call("body_failure", start.elapsed().as_secs_f64());
                warn!("Spine replied HTTP {} but the body could not be read: {}", status, e);
                return Err(GatewayError::ResponseBody {
                    status,
                    reason: e.to_string(),
                });
            }
        };

        metrics::record_backend_call(&metrics::status_class(status), start.elapsed().as_secs_f64());
        debug!(
            "Spine replied HTTP {} in {:?}: {}",
            status,
            start.elapsed(),
            preview(&body, 200)
        );

        Ok(BackendResponse {
            status,
            headers,
            body,
        })
    }
}
