// Requested FHIR representation
// Author: kelexine (https://github.com/kelexine)

use super::exchange::InboundQuery;
use serde::Serialize;

/// Where the requested format came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatSource {
    Parameter,
    AcceptHeader,
    Default,
}

/// Wire representation actually rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Json,
    Xml,
}

impl Representation {
    pub fn content_type(self) -> &'static str {
        match self {
            Representation::Json => "application/fhir+json; charset=UTF-8",
            Representation::Xml => "application/fhir+xml; charset=UTF-8",
        }
    }
}

/// The client's format preference, resolved once per exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestedFormat {
    pub value: String,
    pub source: FormatSource,
}

/// Marker an `Accept` header must contain to count as a FHIR format hint.
const ACCEPT_MARKER: &str = "fhir";

impl RequestedFormat {
    /// Resolve in priority order: `_format` > `Accept` (with marker) > default.
    ///
    /// `_format` is looked up in the query string first and then as a
    /// header, since both are explicit client choices.
    pub fn resolve(query: &InboundQuery, default_format: &str) -> Self {
        if let Some(value) = query.param("_format").or_else(|| query.header("_format")) {
            return Self {
                value: value.to_string(),
                source: FormatSource::Parameter,
            };
        }

        if let Some(accept) = query.header("accept").filter(|a| a.contains(ACCEPT_MARKER)) {
            return Self {
                value: accept.to_string(),
                source: FormatSource::AcceptHeader,
            };
        }

        Self {
            value: default_format.to_string(),
            source: FormatSource::Default,
        }
    }

    /// Map the raw value onto JSON or XML. Anything without "json" in it
    /// renders as XML, the FHIR default.
    pub fn representation(&self) -> Representation {
        if self.value.to_ascii_lowercase().contains("json") {
            Representation::Json
        } else {
            Representation::Xml
        }
    }
}
