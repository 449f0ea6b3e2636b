// Request handler pipeline tests
// Author: kelexine (https://github.com/kelexine)

mod common;

use common::{test_config, FakeBackend, MemoryAuditSink, PDS_URL, TRACE_REPLY};
use fhir2spine::audit::Direction;
use fhir2spine::error::Result;
use fhir2spine::models::{ExchangeOutcome, GatewayResponse, InboundQuery, RequestedFormat};
use fhir2spine::pipeline::Pipeline;
use fhir2spine::translation::{ResponseClassifier, ResponseFormatter};
use std::sync::{Arc, Mutex};

fn smith_search() -> InboundQuery {
    InboundQuery::new("GET", "/fhir/Patient")
        .with_param("family", "Smith")
        .with_param("gender", "F")
        .with_param("birthdate", "1980-01-01")
}

fn pipeline(backend: Arc<FakeBackend>, audit: Arc<MemoryAuditSink>) -> Pipeline {
    Pipeline::new(&test_config(), backend, audit)
}

/// Captures what the domain formatter was handed.
#[derive(Default)]
struct RecordingFormatter {
    calls: Mutex<Vec<(String, String)>>,
}

impl ResponseFormatter for RecordingFormatter {
    fn format(&self, _exchange_id: &str, format: &RequestedFormat, body: &str) -> Result<GatewayResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((format.value.clone(), body.to_string()));
        Ok(GatewayResponse::new(200, "text/plain", "formatted"))
    }
}

#[tokio::test]
async fn test_success_reaches_domain_formatter_with_default_format() {
    let backend = FakeBackend::replying(200, TRACE_REPLY);
    let audit = Arc::new(MemoryAuditSink::default());
    let formatter = Arc::new(RecordingFormatter::default());
    let pipeline = pipeline(backend.clone(), audit.clone()).with_formatter(formatter.clone());

    let response = pipeline.handle(smith_search()).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "formatted");
    let calls = formatter.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "application/fhir+xml");
    assert_eq!(calls[0].1, TRACE_REPLY);
}

#[tokio::test]
async fn test_success_renders_patient_bundle() {
    let backend = FakeBackend::replying(200, TRACE_REPLY);
    let audit = Arc::new(MemoryAuditSink::default());
    let pipeline = pipeline(backend, audit);

    let response = pipeline.handle(smith_search().with_param("_format", "json")).await;

    assert_eq!(response.status, 200);
    assert!(response.content_type.starts_with("application/fhir+json"));
    let json: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["resourceType"], "Bundle");
    assert_eq!(json["entry"][0]["resource"]["identifier"][0]["value"], "9434765919");
}

#[tokio::test]
async fn test_outbound_request_carries_only_spine_headers() {
    let backend = FakeBackend::replying(200, TRACE_REPLY);
    let audit = Arc::new(MemoryAuditSink::default());
    let pipeline = pipeline(backend.clone(), audit);

    let query = smith_search()
        .with_header("Authorization", "Bearer client-secret")
        .with_header("Cookie", "session=abc");
    pipeline.handle(query).await;

    let sent = backend.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].soap_action, "urn:nhs:names:services:pdsquery/QUPA_IN000005UK01");
    assert_eq!(sent[0].destination_uri, PDS_URL);
    assert!(sent[0].body.contains("<family>Smith</family>"));
    assert!(!sent[0].body.contains("client-secret"));
    assert!(!sent[0].body.contains("session=abc"));
}

#[tokio::test]
async fn test_backend_503_takes_error_path_without_parsing() {
    // A body that would parse as a patient must still not reach the domain formatter
    let backend = FakeBackend::replying(503, TRACE_REPLY);
    let audit = Arc::new(MemoryAuditSink::default());
    let formatter = Arc::new(RecordingFormatter::default());
    let pipeline = pipeline(backend, audit).with_formatter(formatter.clone());

    let response = pipeline.handle(smith_search().with_param("_format", "json")).await;

    assert_eq!(response.status, 502);
    assert!(formatter.calls.lock().unwrap().is_empty());
    let json: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["resourceType"], "OperationOutcome");
    assert_eq!(json["issue"][0]["code"], "transient");
    assert!(json["issue"][0]["diagnostics"].as_str().unwrap().contains("HTTP 503"));
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let backend = FakeBackend::failing("connection refused");
    let audit = Arc::new(MemoryAuditSink::default());
    let pipeline = pipeline(backend, audit.clone());

    let response = pipeline.handle(smith_search()).await;

    assert_eq!(response.status, 502);
    assert!(response.body.contains("connection refused"));
    // Only the outbound request exists to audit
    let records = audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].direction, Direction::Request);
}

#[tokio::test]
async fn test_unreadable_reply_body_is_audited_and_transport_error() {
    let backend = FakeBackend::losing_body(200, "connection reset");
    let audit = Arc::new(MemoryAuditSink::default());
    let formatter = Arc::new(RecordingFormatter::default());
    let pipeline = pipeline(backend, audit.clone()).with_formatter(formatter.clone());

    let response = pipeline.handle(smith_search()).await;

    assert_eq!(response.status, 502);
    assert!(response.body.contains("connection reset"));
    assert!(formatter.calls.lock().unwrap().is_empty());
    // The status line arrived, so both directions are recorded
    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].direction, Direction::Response);
    assert!(records[1].payload.is_empty());
}

#[tokio::test]
async fn test_two_audit_records_per_round_trip() {
    let backend = FakeBackend::replying(200, TRACE_REPLY);
    let audit = Arc::new(MemoryAuditSink::default());
    let pipeline = pipeline(backend.clone(), audit.clone());

    let query = smith_search();
    let exchange_id = query.exchange_id.clone();
    pipeline.handle(query).await;

    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].direction, Direction::Request);
    assert_eq!(records[1].direction, Direction::Response);
    assert!(records.iter().all(|r| r.exchange_id == exchange_id));
    assert_eq!(records[0].payload, backend.sent()[0].body);
    assert_eq!(records[1].payload, TRACE_REPLY);
    assert_ne!(records[0].file_name(), records[1].file_name());
}

#[tokio::test]
async fn test_concurrent_exchanges_have_distinct_audit_names() {
    let backend = FakeBackend::replying(200, TRACE_REPLY);
    let audit = Arc::new(MemoryAuditSink::default());
    let pipeline = Arc::new(pipeline(backend, audit.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.handle(smith_search()).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let mut names: Vec<_> = audit.records().iter().map(|r| r.file_name()).collect();
    assert_eq!(names.len(), 16);
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 16);
}

#[tokio::test]
async fn test_missing_parameter_short_circuits() {
    let backend = FakeBackend::replying(200, TRACE_REPLY);
    let audit = Arc::new(MemoryAuditSink::default());
    let pipeline = pipeline(backend.clone(), audit.clone());

    let query = InboundQuery::new("GET", "/fhir/Patient")
        .with_param("family", "Smith")
        .with_param("_format", "json");
    let response = pipeline.handle(query).await;

    assert_eq!(response.status, 400);
    assert!(response.body.contains("birthdate") || response.body.contains("gender"));
    assert!(backend.sent().is_empty());
    assert!(audit.records().is_empty());
}

#[tokio::test]
async fn test_non_get_message_from_queue_is_rejected() {
    let backend = FakeBackend::replying(200, TRACE_REPLY);
    let audit = Arc::new(MemoryAuditSink::default());
    let pipeline = pipeline(backend.clone(), audit);

    let mut query = smith_search();
    query.method = "POST".to_string();
    let response = pipeline.handle(query).await;

    assert_eq!(response.status, 405);
    assert!(response.body.contains("not-supported"));
    assert!(backend.sent().is_empty());
}

#[tokio::test]
async fn test_explicit_format_beats_accept_header() {
    let backend = FakeBackend::replying(200, TRACE_REPLY);
    let audit = Arc::new(MemoryAuditSink::default());
    let formatter = Arc::new(RecordingFormatter::default());
    let pipeline = pipeline(backend, audit).with_formatter(formatter.clone());

    let query = smith_search()
        .with_header("_format", "json")
        .with_header("Accept", "application/fhir+xml");
    pipeline.handle(query).await;

    assert_eq!(formatter.calls.lock().unwrap()[0].0, "json");
}

struct FaultClassifier;

impl ResponseClassifier for FaultClassifier {
    fn classify(&self, _status: Option<u16>, body: &str) -> ExchangeOutcome {
        ExchangeOutcome::ApplicationFault {
            detail: format!("fault: {}", body),
        }
    }
}

#[tokio::test]
async fn test_application_fault_uses_domain_formatter() {
    let backend = FakeBackend::replying(200, "<SOAP-ENV:Fault/>");
    let audit = Arc::new(MemoryAuditSink::default());
    let formatter = Arc::new(RecordingFormatter::default());
    let pipeline = pipeline(backend, audit)
        .with_classifier(Arc::new(FaultClassifier))
        .with_formatter(formatter.clone());

    let response = pipeline.handle(smith_search()).await;

    assert_eq!(response.status, 200);
    assert_eq!(formatter.calls.lock().unwrap()[0].1, "fault: <SOAP-ENV:Fault/>");
}
