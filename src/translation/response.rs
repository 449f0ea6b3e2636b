// Response classification (Spine reply → routing outcome)
// Author: kelexine (https://github.com/kelexine)

use super::ResponseClassifier;
use crate::models::ExchangeOutcome;

/// Routes on the status code alone.
///
/// A status whose first digit is not `2` is a transport error and its body
/// is never parsed. Everything else is a success carrying the raw body;
/// telling a SOAP fault or "no match" reply apart from a trace result is
/// left to the domain formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusClassifier;

impl ResponseClassifier for StatusClassifier {
    fn classify(&self, status: Option<u16>, body: &str) -> ExchangeOutcome {
        classify(status, body)
    }
}

/// `None` is the connection-failure sentinel and always a transport error.
pub fn classify(status: Option<u16>, body: &str) -> ExchangeOutcome {
    match status {
        Some(code) if code.to_string().starts_with('2') => ExchangeOutcome::Success {
            body: body.to_string(),
        },
        Some(code) => ExchangeOutcome::TransportError {
            status: Some(code),
            diagnostic: format!("HTTP {}: {}", code, body),
        },
        None => ExchangeOutcome::TransportError {
            status: None,
            diagnostic: format!("Connection failed: {}", body),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_2xx_is_success_with_raw_body() {
        for status in [200, 201, 202, 204, 299] {
            let outcome = classify(Some(status), "<Envelope/>");
            assert_eq!(
                outcome,
                ExchangeOutcome::Success {
                    body: "<Envelope/>".to_string()
                }
            );
        }
    }

    #[test]
    fn test_non_2xx_is_transport_error() {
        for status in [100, 301, 404, 500, 503] {
            match classify(Some(status), "busy") {
                ExchangeOutcome::TransportError { status: s, diagnostic } => {
                    assert_eq!(s, Some(status));
                    assert!(diagnostic.contains(&status.to_string()));
                    assert!(diagnostic.contains("busy"));
                }
                other => panic!("expected transport error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_soap_fault_in_200_is_passed_through() {
        let fault = "<SOAP-ENV:Envelope><SOAP-ENV:Body><SOAP-ENV:Fault/></SOAP-ENV:Body></SOAP-ENV:Envelope>";
        assert!(matches!(classify(Some(200), fault), ExchangeOutcome::Success { .. }));
    }

    #[test]
    fn test_connection_failure_sentinel() {
        assert!(matches!(
            classify(None, "connection refused"),
            ExchangeOutcome::TransportError { status: None, .. }
        ));
    }
}
