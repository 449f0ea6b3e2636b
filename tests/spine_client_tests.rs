// Spine client tests against a mock HTTP server
// Author: kelexine (https://github.com/kelexine)

mod common;

use common::{test_config, TRACE_REPLY};
use fhir2spine::config::TlsConfig;
use fhir2spine::error::GatewayError;
use fhir2spine::models::OutboundRequest;
use fhir2spine::spine::{BackendClient, SpineClient};
use mockito::Matcher;

const SOAP_ACTION: &str = "urn:nhs:names:services:pdsquery/QUPA_IN000005UK01";

fn client() -> SpineClient {
    SpineClient::new(&test_config().spine, &TlsConfig::default()).unwrap()
}

fn request(destination_uri: String) -> OutboundRequest {
    OutboundRequest {
        soap_action: SOAP_ACTION.to_string(),
        destination_uri,
        body: "<SOAP-ENV:Envelope><family>Smith</family></SOAP-ENV:Envelope>".to_string(),
    }
}

#[tokio::test]
async fn test_posts_soap_with_action_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sync-service")
        .match_header("soapaction", SOAP_ACTION)
        .match_header("content-type", Matcher::Regex("^text/xml".to_string()))
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Regex("<family>Smith</family>".to_string()))
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(TRACE_REPLY)
        .create_async()
        .await;

    let response = client()
        .send(request(format!("{}/sync-service", server.url())))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body, TRACE_REPLY);
    assert!(response
        .headers
        .iter()
        .any(|(name, value)| name == "content-type" && value == "text/xml"));
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/sync-service")
        .with_status(503)
        .with_body("Service Unavailable")
        .expect(1)
        .create_async()
        .await;

    let response = client()
        .send(request(format!("{}/sync-service", server.url())))
        .await
        .unwrap();

    // Exactly one attempt: no retry on failure
    mock.assert_async().await;
    assert_eq!(response.status, 503);
    assert_eq!(response.body, "Service Unavailable");
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let err = client()
        .send(request("http://127.0.0.1:1/sync-service".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Transport(_)));
}

#[test]
fn test_timeout_follows_config() {
    let mut config = test_config();
    config.spine.timeout_seconds = 7;
    let client = SpineClient::new(&config.spine, &TlsConfig::default()).unwrap();
    assert_eq!(client.timeout().as_secs(), 7);
}

#[test]
fn test_enabled_tls_without_key_material_fails() {
    let tls = TlsConfig {
        enabled: true,
        ..TlsConfig::default()
    };
    let result = SpineClient::new(&test_config().spine, &tls);
    assert!(matches!(result, Err(GatewayError::Tls(_))));
}
