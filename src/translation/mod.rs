//! Translation between the FHIR and Spine sides of an exchange.
//!
//! Each pipeline capability is a narrow trait so the orchestrator can be
//! given alternative implementations:
//!
//! - [`PayloadBuilder`]: search parameters → SOAP request body (`request`)
//! - [`ResponseClassifier`]: Spine status/body → [`ExchangeOutcome`] (`response`)
//! - [`ResponseFormatter`] / [`ErrorFormatter`]: outcome → FHIR reply (`fhir`)
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod conformance;
pub mod fhir;
pub mod request;
pub mod response;
pub mod trace;
pub mod xml;

pub use fhir::{OperationOutcomeFormatter, PatientBundleFormatter};
pub use request::{build_simple_trace, SimpleTraceBuilder, SpineIdentity};
pub use response::{classify, StatusClassifier};

use crate::error::Result;
use crate::models::{ExchangeOutcome, GatewayResponse, RequestedFormat};

/// Builds the backend request body. Must fail, never substitute, when a
/// required value is missing or malformed.
pub trait PayloadBuilder: Send + Sync {
    fn build(
        &self,
        family: Option<&str>,
        gender: Option<&str>,
        birthdate: Option<&str>,
        identity: &SpineIdentity,
    ) -> Result<String>;
}

/// Decides the reply path. `status` is `None` when no response arrived.
pub trait ResponseClassifier: Send + Sync {
    fn classify(&self, status: Option<u16>, body: &str) -> ExchangeOutcome;
}

/// Domain path: renders a backend body in the requested representation.
pub trait ResponseFormatter: Send + Sync {
    fn format(&self, exchange_id: &str, format: &RequestedFormat, body: &str) -> Result<GatewayResponse>;
}

/// Error path: renders a failure without interpreting any backend body.
pub trait ErrorFormatter: Send + Sync {
    fn format_error(
        &self,
        format: &RequestedFormat,
        status: u16,
        code: &str,
        diagnostic: &str,
    ) -> Result<GatewayResponse>;
}
