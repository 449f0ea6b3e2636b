// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{conformance_handler, health_handler, metrics_handler, patient_handler};
use super::middleware::request_id_layers;
use crate::config::AppConfig;
use crate::queue::RequestQueue;
use axum::{routing::{any, get, options}, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub queue: Arc<dyn RequestQueue>,
    pub reply_timeout: Duration,
}

pub fn create_router(config: AppConfig, queue: Arc<dyn RequestQueue>) -> Router {
    let state = AppState {
        reply_timeout: Duration::from_secs(config.queue.reply_timeout_seconds),
        config: Arc::new(config),
        queue,
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .route("/fhir/Patient", any(patient_handler))
        .route("/fhir/metadata", get(conformance_handler))
        .route("/fhir", options(conformance_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
