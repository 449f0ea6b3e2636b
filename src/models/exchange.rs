//! Exchange-level types shared by the pipeline stages.
//!
//! An exchange starts as an [`InboundQuery`] (which is also the queue
//! message schema), produces exactly one [`OutboundRequest`], receives at
//! most one [`BackendResponse`] and ends in one [`ExchangeOutcome`].

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};

/// The client's request as it crosses the queue boundary.
///
/// Header names are stored lowercased. Query parameters keep their order
/// and duplicates; lookups return the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundQuery {
    /// Unique per exchange; keys the audit records.
    pub exchange_id: String,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub query: Vec<(String, String)>,
    #[serde(default)]
    pub body: String,
}

impl InboundQuery {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            exchange_id: uuid::Uuid::new_v4().to_string(),
            method: method.into(),
            path: path.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .push((name.into().to_ascii_lowercase(), value.into()));
        self
    }

    /// First value of a query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// A SOAP request ready for Spine.
///
/// Carries only the two transport headers the backend needs; nothing from
/// the inbound request is forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub soap_action: String,
    pub destination_uri: String,
    pub body: String,
}

/// Status, headers and body returned by Spine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl BackendResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Routing decision made once per backend reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// 2xx reply; the body is handed to the domain formatter untouched.
    Success { body: String },
    /// Non-2xx reply or connection failure (`status` is `None`).
    TransportError {
        status: Option<u16>,
        diagnostic: String,
    },
    /// 2xx reply whose body encodes a domain failure.
    ApplicationFault { detail: String },
}

impl ExchangeOutcome {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ExchangeOutcome::Success { .. } => "success",
            ExchangeOutcome::TransportError { .. } => "transport_error",
            ExchangeOutcome::ApplicationFault { .. } => "application_fault",
        }
    }
}

/// Client-facing reply produced at the end of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl GatewayResponse {
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_returns_first_value() {
        let query = InboundQuery::new("GET", "/fhir/Patient")
            .with_param("family", "Smith")
            .with_param("family", "Jones");
        assert_eq!(query.param("family"), Some("Smith"));
        assert_eq!(query.param("gender"), None);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let query = InboundQuery::new("GET", "/fhir/Patient").with_header("Accept", "application/fhir+json");
        assert_eq!(query.header("accept"), Some("application/fhir+json"));
        assert_eq!(query.header("ACCEPT"), Some("application/fhir+json"));
    }

    #[test]
    fn test_exchange_ids_are_unique() {
        let a = InboundQuery::new("GET", "/fhir/Patient");
        let b = InboundQuery::new("GET", "/fhir/Patient");
        assert_ne!(a.exchange_id, b.exchange_id);
    }

    #[test]
    fn test_queue_message_schema_roundtrip() {
        let query = InboundQuery::new("GET", "/fhir/Patient")
            .with_param("family", "Smith")
            .with_header("Accept", "application/fhir+xml");
        let json = serde_json::to_string(&query).unwrap();
        let back: InboundQuery = serde_json::from_str(&json).unwrap();
        assert_eq!(back, query);
    }
}
