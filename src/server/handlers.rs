// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::middleware::{request_id, EXCHANGE_ID_HEADER};
use super::routes::AppState;
use crate::error::GatewayError;
use crate::metrics;
use crate::models::{GatewayResponse, InboundQuery, RequestedFormat};
use crate::translation::{conformance, ErrorFormatter, OperationOutcomeFormatter};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

/// Largest GET body buffered into a queue message.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Capture everything the handler may need from the HTTP request.
fn inbound_query(method: &Method, path: &str, headers: &HeaderMap, query: Vec<(String, String)>) -> InboundQuery {
    let mut inbound = InboundQuery::new(method.as_str(), path);
    inbound.headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    inbound.query = query;
    inbound
}

/// Handler for `/fhir/Patient`.
///
/// GET searches are enqueued and the caller waits for the handler's
/// reply. Any other method is rejected here without touching the queue.
/// The method is checked before the body is read, so an oversized or
/// non-UTF-8 body on a non-GET request still gets the 405 outcome.
pub async fn patient_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    query: Option<Query<Vec<(String, String)>>>,
    body: Body,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let mut inbound = inbound_query(&method, "/fhir/Patient", &headers, query);
    let exchange_id = inbound.exchange_id.clone();
    debug!("Request {} assigned exchange {}", request_id(&headers), exchange_id);

    let mut response = if method != Method::GET {
        info!("{} request for exchange {} rejected", method, exchange_id);
        let format = RequestedFormat::resolve(&inbound, &state.config.fhir.default_format);
        let message = format!("{} is not supported for Patient; only search (GET) is", method);
        match OperationOutcomeFormatter.format_error(
            &format,
            StatusCode::METHOD_NOT_ALLOWED.as_u16(),
            "not-supported",
            &message,
        ) {
            Ok(rendered) => rendered.into_response(),
            Err(_) => GatewayError::UnsupportedMethod(message).into_response(),
        }
    } else {
        debug!("GET request for exchange {}", exchange_id);
        let result = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => {
                inbound.body = String::from_utf8_lossy(&bytes).into_owned();
                await_reply(&state, inbound).await
            }
            Err(e) => Err(GatewayError::InvalidRequest(format!(
                "request body could not be read (limit {} bytes): {}",
                MAX_BODY_BYTES, e
            ))),
        };
        match result {
            Ok(reply) => reply.into_response(),
            Err(err) => {
                warn!("Exchange {} failed at ingress: {}", exchange_id, err);
                err.into_response()
            }
        }
    };

    if let Ok(value) = HeaderValue::from_str(&exchange_id) {
        response.headers_mut().insert(EXCHANGE_ID_HEADER, value);
    }
    metrics::record_ingress(method.as_str(), "/fhir/Patient", response.status().as_u16());
    response
}

async fn await_reply(state: &AppState, inbound: InboundQuery) -> Result<GatewayResponse, GatewayError> {
    let exchange_id = inbound.exchange_id.clone();
    let pending = state.queue.enqueue(inbound)?;

    match tokio::time::timeout(state.reply_timeout, pending).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(_)) => Err(GatewayError::Internal(format!(
            "exchange {} was dropped without a reply",
            exchange_id
        ))),
        Err(_) => Err(GatewayError::ReplyTimeout(exchange_id)),
    }
}

/// Handler for `GET /fhir/metadata` and `OPTIONS /fhir`.
pub async fn conformance_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    query: Option<Query<Vec<(String, String)>>>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let inbound = inbound_query(&method, "/fhir/metadata", &headers, query);
    let format = RequestedFormat::resolve(&inbound, &state.config.fhir.default_format);

    let response = match conformance::respond(&format) {
        Ok(rendered) => rendered.into_response(),
        Err(err) => err.into_response(),
    };

    metrics::record_ingress(method.as_str(), "/fhir/metadata", response.status().as_u16());
    response
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    // Check queue headroom
    let depth = state.queue.depth();
    let capacity = state.queue.capacity();
    let queue_check = if depth * 10 > capacity * 9 {
        overall_status = HealthStatus::Degraded;
        HealthCheck {
            status: "warning".to_string(),
            message: format!("Queue nearly full: {}/{}", depth, capacity),
        }
    } else {
        HealthCheck {
            status: "ok".to_string(),
            message: format!("Queue depth {}/{}", depth, capacity),
        }
    };
    checks.insert("queue".to_string(), queue_check);

    // Check configuration
    let spine_check = HealthCheck {
        status: "ok".to_string(),
        message: format!("PDS URL: {}", state.config.spine.pds_url),
    };
    checks.insert("spine".to_string(), spine_check);

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}
