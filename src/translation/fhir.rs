//! FHIR rendering for replies sent back to the client.
//!
//! JSON goes through serde; XML is written by hand for the handful of
//! resources the gateway produces. Both formatters pick the representation
//! from the exchange's [`RequestedFormat`].
//!
//! Author: kelexine (<https://github.com/kelexine>)

use super::trace::extract_patient;
use super::xml::escape;
use super::{ErrorFormatter, ResponseFormatter};
use crate::error::Result;
use crate::models::fhir::{Bundle, Conformance, OperationOutcome, Patient};
use crate::models::{GatewayResponse, Representation, RequestedFormat};
use serde::Serialize;
use std::fmt::Write;
use tracing::debug;

/// Renders a Spine trace reply as a FHIR searchset `Bundle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatientBundleFormatter;

impl ResponseFormatter for PatientBundleFormatter {
    fn format(&self, exchange_id: &str, format: &RequestedFormat, body: &str) -> Result<GatewayResponse> {
        let patients: Vec<Patient> = extract_patient(body).into_iter().collect();
        debug!("Rendering searchset with {} patient(s)", patients.len());

        let bundle = Bundle::searchset(exchange_id, patients);
        render(200, format.representation(), &bundle, bundle_to_xml)
    }
}

/// Renders transport failures as an `OperationOutcome` with HTTP 502.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationOutcomeFormatter;

impl ErrorFormatter for OperationOutcomeFormatter {
    fn format_error(
        &self,
        format: &RequestedFormat,
        status: u16,
        code: &str,
        diagnostic: &str,
    ) -> Result<GatewayResponse> {
        let outcome = OperationOutcome::error(code, diagnostic);
        render(status, format.representation(), &outcome, outcome_to_xml)
    }
}

/// Serialize `resource` in the requested representation.
pub fn render<T: Serialize>(
    status: u16,
    representation: Representation,
    resource: &T,
    to_xml: fn(&T) -> String,
) -> Result<GatewayResponse> {
    let body = match representation {
        Representation::Json => serde_json::to_string_pretty(resource)?,
        Representation::Xml => to_xml(resource),
    };
    Ok(GatewayResponse::new(status, representation.content_type(), body))
}

const FHIR_NS: &str = "http://hl7.org/fhir";

// `write!` into a String cannot fail
macro_rules! w {
    ($out:expr, $($arg:tt)*) => {
        let _ = write!($out, $($arg)*);
    };
}

fn value(out: &mut String, element: &str, v: &str) {
    w!(out, "<{} value=\"{}\"/>", element, escape(v));
}

pub fn patient_to_xml(patient: &Patient) -> String {
    let mut out = String::new();
    w!(out, "<Patient xmlns=\"{}\">", FHIR_NS);
    for id in &patient.identifier {
        out.push_str("<identifier>");
        value(&mut out, "system", &id.system);
        value(&mut out, "value", &id.value);
        out.push_str("</identifier>");
    }
    for name in &patient.name {
        out.push_str("<name>");
        for family in &name.family {
            value(&mut out, "family", family);
        }
        for given in &name.given {
            value(&mut out, "given", given);
        }
        out.push_str("</name>");
    }
    if let Some(gender) = &patient.gender {
        value(&mut out, "gender", gender);
    }
    if let Some(birth_date) = &patient.birth_date {
        value(&mut out, "birthDate", birth_date);
    }
    out.push_str("</Patient>");
    out
}

pub fn bundle_to_xml(bundle: &Bundle) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    w!(out, "<Bundle xmlns=\"{}\">", FHIR_NS);
    value(&mut out, "id", &bundle.id);
    value(&mut out, "type", &bundle.bundle_type);
    value(&mut out, "total", &bundle.total.to_string());
    for entry in &bundle.entry {
        out.push_str("<entry><resource>");
        out.push_str(&patient_to_xml(&entry.resource));
        out.push_str("</resource></entry>");
    }
    out.push_str("</Bundle>");
    out
}

pub fn outcome_to_xml(outcome: &OperationOutcome) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    w!(out, "<OperationOutcome xmlns=\"{}\">", FHIR_NS);
    for issue in &outcome.issue {
        out.push_str("<issue>");
        value(&mut out, "severity", &issue.severity);
        value(&mut out, "code", &issue.code);
        if let Some(diagnostics) = &issue.diagnostics {
            value(&mut out, "diagnostics", diagnostics);
        }
        out.push_str("</issue>");
    }
    out.push_str("</OperationOutcome>");
    out
}

pub fn conformance_to_xml(conformance: &Conformance) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    w!(out, "<Conformance xmlns=\"{}\">", FHIR_NS);
    value(&mut out, "status", &conformance.status);
    value(&mut out, "date", &conformance.date);
    out.push_str("<software>");
    value(&mut out, "name", &conformance.software.name);
    value(&mut out, "version", &conformance.software.version);
    out.push_str("</software>");
    value(&mut out, "fhirVersion", &conformance.fhir_version);
    value(&mut out, "kind", &conformance.kind);
    value(&mut out, "acceptUnknown", &conformance.accept_unknown);
    for format in &conformance.format {
        value(&mut out, "format", format);
    }
    for rest in &conformance.rest {
        out.push_str("<rest>");
        value(&mut out, "mode", &rest.mode);
        for resource in &rest.resource {
            out.push_str("<resource>");
            value(&mut out, "type", &resource.resource_type);
            for interaction in &resource.interaction {
                out.push_str("<interaction>");
                value(&mut out, "code", &interaction.code);
                out.push_str("</interaction>");
            }
            for param in &resource.search_param {
                out.push_str("<searchParam>");
                value(&mut out, "name", &param.name);
                value(&mut out, "type", &param.param_type);
                out.push_str("</searchParam>");
            }
            out.push_str("</resource>");
        }
        out.push_str("</rest>");
    }
    out.push_str("</Conformance>");
    out
}
