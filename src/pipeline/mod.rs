//! The request handler: drives one exchange from a dequeued FHIR search to
//! a rendered FHIR reply.
//!
//! ```text
//! RECEIVED → FORMAT_RESOLVED → PAYLOAD_BUILT → SENT → CLASSIFIED → RESPONDED
//! ```
//!
//! Stages run strictly in sequence. The two audit taps (outbound request,
//! Spine reply) are handed to the [`AuditSink`] and never awaited.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod state;

pub use state::{ExchangeState, Stage};

use crate::audit::{AuditRecord, AuditSink, Direction};
use crate::config::AppConfig;
use crate::error::GatewayError;
use crate::metrics;
use crate::models::{ExchangeOutcome, GatewayResponse, InboundQuery, OutboundRequest, RequestedFormat};
use crate::spine::BackendClient;
use crate::translation::{
    ErrorFormatter, OperationOutcomeFormatter, PatientBundleFormatter, PayloadBuilder,
    ResponseClassifier, ResponseFormatter, SimpleTraceBuilder, SpineIdentity, StatusClassifier,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Status returned to the client when Spine could not be reached or
/// answered with a non-2xx status.
const TRANSPORT_ERROR_STATUS: u16 = 502;

/// Orchestrates the pipeline stages. Holds no per-exchange state, so one
/// instance is shared by every worker.
pub struct Pipeline {
    payload_builder: Arc<dyn PayloadBuilder>,
    backend: Arc<dyn BackendClient>,
    classifier: Arc<dyn ResponseClassifier>,
    formatter: Arc<dyn ResponseFormatter>,
    error_formatter: Arc<dyn ErrorFormatter>,
    audit: Arc<dyn AuditSink>,
    identity: SpineIdentity,
    soap_action: String,
    default_format: String,
}

impl Pipeline {
    /// Pipeline with the standard builder, classifier and formatters.
    pub fn new(config: &AppConfig, backend: Arc<dyn BackendClient>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            payload_builder: Arc::new(SimpleTraceBuilder),
            backend,
            classifier: Arc::new(StatusClassifier),
            formatter: Arc::new(PatientBundleFormatter),
            error_formatter: Arc::new(OperationOutcomeFormatter),
            audit,
            identity: SpineIdentity::from(&config.spine),
            soap_action: config.spine.soap_action.clone(),
            default_format: config.fhir.default_format.clone(),
        }
    }

    pub fn with_payload_builder(mut self, payload_builder: Arc<dyn PayloadBuilder>) -> Self {
        self.payload_builder = payload_builder;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ResponseClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn ResponseFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_error_formatter(mut self, error_formatter: Arc<dyn ErrorFormatter>) -> Self {
        self.error_formatter = error_formatter;
        self
    }

    pub fn default_format(&self) -> &str {
        &self.default_format
    }

    /// Run one exchange to completion. Always produces a reply; failures
    /// are rendered, never returned.
    pub async fn handle(&self, query: InboundQuery) -> GatewayResponse {
        let span = info_span!("exchange", exchange_id = %query.exchange_id);
        self.run(query).instrument(span).await
    }

    async fn run(&self, query: InboundQuery) -> GatewayResponse {
        let start = Instant::now();
        let mut state = ExchangeState::new();

        // RECEIVED → FORMAT_RESOLVED
        let format = RequestedFormat::resolve(&query, &self.default_format);
        state.advance(Stage::FormatResolved);
        info!("FHIR format requested was: {} ({:?})", format.value, format.source);

        if !query.is_get() {
            state.advance(Stage::Responded);
            let err = GatewayError::UnsupportedMethod(format!(
                "{} is not supported for Patient; only search (GET) is",
                query.method
            ));
            return self.finish("client_error", start, self.render_error(&format, &err));
        }

        // FORMAT_RESOLVED → PAYLOAD_BUILT
        let body = match self.payload_builder.build(
            query.param("family"),
            query.param("gender"),
            query.param("birthdate"),
            &self.identity,
        ) {
            Ok(body) => body,
            Err(err) => {
                state.advance(Stage::Responded);
                warn!("Rejecting search: {}", err);
                return self.finish("client_error", start, self.render_error(&format, &err));
            }
        };
        state.advance(Stage::PayloadBuilt);

        // PAYLOAD_BUILT → SENT
        // The outbound request is built from scratch: none of the client's
        // headers carry over, only the SOAP action and destination.
        let request = OutboundRequest {
            soap_action: self.soap_action.clone(),
            destination_uri: self.identity.pds_url.clone(),
            body,
        };
        self.audit.record(AuditRecord::new(
            Direction::Request,
            &query.exchange_id,
            request.body.clone(),
        ));
        let result = self.backend.send(request).await;
        state.advance(Stage::Sent);

        // SENT → CLASSIFIED
        let outcome = match result {
            Ok(response) => {
                self.audit.record(AuditRecord::new(
                    Direction::Response,
                    &query.exchange_id,
                    response.body.clone(),
                ));
                self.classifier.classify(Some(response.status), &response.body)
            }
            Err(err) => {
                // A status line without a readable body is still a reply
                if let GatewayError::ResponseBody { status, .. } = &err {
                    debug!("Auditing HTTP {} reply with an unreadable body", status);
                    self.audit.record(AuditRecord::new(
                        Direction::Response,
                        &query.exchange_id,
                        String::new(),
                    ));
                }
                self.classifier.classify(None, &err.to_string())
            }
        };
        state.advance(Stage::Classified);
        debug!("Exchange classified as {}", outcome.label());

        // CLASSIFIED → RESPONDED
        let rendered = match &outcome {
            ExchangeOutcome::TransportError { status, diagnostic } => {
                warn!("Spine transport error (status {:?})", status);
                self.error_formatter
                    .format_error(&format, TRANSPORT_ERROR_STATUS, "transient", diagnostic)
            }
            ExchangeOutcome::Success { body } => {
                self.formatter.format(&query.exchange_id, &format, body)
            }
            ExchangeOutcome::ApplicationFault { detail } => {
                self.formatter.format(&query.exchange_id, &format, detail)
            }
        };
        state.advance(Stage::Responded);

        match rendered {
            Ok(response) => self.finish(outcome.label(), start, response),
            Err(err) => {
                error!("Failed to render reply: {}", err);
                self.finish("internal_error", start, self.render_error(&format, &err))
            }
        }
    }

    fn render_error(&self, format: &RequestedFormat, err: &GatewayError) -> GatewayResponse {
        let (status, code) = err.status_and_code();
        self.error_formatter
            .format_error(format, status.as_u16(), code, &err.to_string())
            .unwrap_or_else(|e| {
                error!("Error formatter failed: {}", e);
                GatewayResponse::new(status.as_u16(), "text/plain; charset=UTF-8", err.to_string())
            })
    }

    fn finish(&self, outcome: &str, start: Instant, response: GatewayResponse) -> GatewayResponse {
        let elapsed = start.elapsed();
        metrics::record_exchange(outcome, elapsed.as_secs_f64());
        info!(
            "Exchange finished: outcome={} status={} in {:?}",
            outcome, response.status, elapsed
        );
        response
    }
}
