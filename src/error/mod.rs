// Error types for the fhir2spine gateway
// Author: kelexine (https://github.com/kelexine)

use crate::models::fhir::OperationOutcome;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Payload build error: {0}")]
    PayloadBuild(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// Spine answered with a status line but the body could not be read.
    #[error("Spine replied HTTP {status} but the body was lost: {reason}")]
    ResponseBody { status: u16, reason: String },

    #[error("Queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("Timed out waiting for exchange {0}")]
    ReplyTimeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status and FHIR issue code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::InvalidRequest(_) | GatewayError::PayloadBuild(_) => {
                (StatusCode::BAD_REQUEST, "invalid")
            }
            GatewayError::UnsupportedMethod(_) => (StatusCode::METHOD_NOT_ALLOWED, "not-supported"),
            GatewayError::Transport(_) | GatewayError::ResponseBody { .. } | GatewayError::Http(_) => {
                (StatusCode::BAD_GATEWAY, "transient")
            }
            GatewayError::QueueUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "transient"),
            GatewayError::ReplyTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "exception"),
        }
    }

    /// True for errors caused by the client's own request.
    pub fn is_client_error(&self) -> bool {
        self.status_and_code().0.is_client_error()
    }
}

// Convert GatewayError to an OperationOutcome response for Axum
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let outcome = OperationOutcome::error(code, self.to_string());

        match serde_json::to_string(&outcome) {
            Ok(body) => (
                status,
                [(header::CONTENT_TYPE, "application/fhir+json; charset=UTF-8")],
                body,
            )
                .into_response(),
            Err(_) => (status, self.to_string()).into_response(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
