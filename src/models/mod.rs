//! Data models for the FHIR and Spine sides of the gateway.
//!
//! This module contains the type definitions used by:
//! - The queue boundary and pipeline (`exchange`)
//! - Format negotiation (`format`)
//! - The FHIR resources returned to clients (`fhir`)

// Author: kelexine (https://github.com/kelexine)

pub mod exchange;
pub mod fhir;
pub mod format;

pub use exchange::{BackendResponse, ExchangeOutcome, GatewayResponse, InboundQuery, OutboundRequest};
pub use fhir::{Bundle, Conformance, OperationOutcome, Patient};
pub use format::{FormatSource, Representation, RequestedFormat};
