//! FHIR (DSTU2) resource definitions returned to clients.
//!
//! Only the resources and fields this gateway actually produces are
//! modelled: `Patient` inside a search `Bundle`, `OperationOutcome` for
//! errors and the static `Conformance` statement.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};

/// FHIR identifier system for NHS numbers.
pub const NHS_NUMBER_SYSTEM: &str = "http://fhir.nhs.net/Id/nhs-number";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

impl Default for Patient {
    fn default() -> Self {
        Self {
            resource_type: "Patient".to_string(),
            identifier: Vec::new(),
            name: Vec::new(),
            gender: None,
            birth_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HumanName {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub family: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

/// Search result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,
    pub id: String,
    #[serde(rename = "type")]
    pub bundle_type: String,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntry {
    pub resource: Patient,
}

impl Bundle {
    pub fn searchset(id: impl Into<String>, patients: Vec<Patient>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            id: id.into(),
            bundle_type: "searchset".to_string(),
            total: patients.len(),
            entry: patients
                .into_iter()
                .map(|resource| BundleEntry { resource })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub resource_type: String,
    pub issue: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl OperationOutcome {
    /// Single error-severity issue.
    pub fn error(code: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            issue: vec![Issue {
                severity: "error".to_string(),
                code: code.into(),
                diagnostics: Some(diagnostics.into()),
            }],
        }
    }
}

/// Capability statement served at `/fhir/metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conformance {
    pub resource_type: String,
    pub status: String,
    pub date: String,
    pub fhir_version: String,
    pub kind: String,
    pub software: Software,
    pub accept_unknown: String,
    pub format: Vec<String>,
    pub rest: Vec<RestComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Software {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestComponent {
    pub mode: String,
    pub resource: Vec<RestResource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub interaction: Vec<Interaction>,
    pub search_param: Vec<SearchParam>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParam {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
}
