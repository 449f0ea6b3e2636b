// Static Conformance statement
// Author: kelexine (https://github.com/kelexine)

use super::fhir::{conformance_to_xml, render};
use crate::error::Result;
use crate::models::fhir::{Conformance, Interaction, RestComponent, RestResource, SearchParam, Software};
use crate::models::{GatewayResponse, RequestedFormat};

/// Describe what this gateway serves: Patient search by family, gender and birthdate.
pub fn conformance_statement() -> Conformance {
    let search_param = |name: &str, param_type: &str| SearchParam {
        name: name.to_string(),
        param_type: param_type.to_string(),
    };

    Conformance {
        resource_type: "Conformance".to_string(),
        status: "active".to_string(),
        date: "2015-10-01".to_string(),
        fhir_version: "1.0.2".to_string(),
        kind: "instance".to_string(),
        software: Software {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        accept_unknown: "no".to_string(),
        format: vec![
            "application/fhir+xml".to_string(),
            "application/fhir+json".to_string(),
        ],
        rest: vec![RestComponent {
            mode: "server".to_string(),
            resource: vec![RestResource {
                resource_type: "Patient".to_string(),
                interaction: vec![Interaction {
                    code: "search-type".to_string(),
                }],
                search_param: vec![
                    search_param("family", "string"),
                    search_param("gender", "token"),
                    search_param("birthdate", "date"),
                ],
            }],
        }],
    }
}

/// Render the statement in the caller's format.
pub fn respond(format: &RequestedFormat) -> Result<GatewayResponse> {
    render(200, format.representation(), &conformance_statement(), conformance_to_xml)
}
