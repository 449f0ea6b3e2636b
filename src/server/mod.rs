//! Axum-based HTTP ingress for the fhir2spine gateway.
//!
//! This module accepts FHIR requests from clients, puts Patient searches on
//! the request queue and waits for the handler's reply. Conformance,
//! health and metrics requests are answered directly.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual endpoints (Patient, metadata, health, metrics).
//! - `middleware`: Request ID tracking.
//! - `routes`: The router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::MAX_BODY_BYTES;
pub use routes::{create_router, AppState};
