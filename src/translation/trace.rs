// HL7 simple trace reply → FHIR Patient
// Author: kelexine (https://github.com/kelexine)

use super::xml::unescape;
use crate::models::fhir::{HumanName, Identifier, Patient, NHS_NUMBER_SYSTEM};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref NHS_NUMBER: Regex =
        Regex::new(r#"<id\s+root="2\.16\.840\.1\.113883\.2\.1\.4\.1"\s+extension="([0-9]{10})""#).unwrap();
    static ref PATIENT_PERSON: Regex =
        Regex::new(r"(?s)<patientPerson\b[^>]*>(.*?)</patientPerson>").unwrap();
    static ref FAMILY: Regex = Regex::new(r"<family>([^<]*)</family>").unwrap();
    static ref GIVEN: Regex = Regex::new(r"<given>([^<]*)</given>").unwrap();
    static ref GENDER: Regex = Regex::new(r#"<administrativeGenderCode\s+code="([0-9])""#).unwrap();
    static ref BIRTH_TIME: Regex = Regex::new(r#"<birthTime\s+value="([0-9]{8})"#).unwrap();
}

/// Extract the traced patient, if the reply contains one.
///
/// A reply without an NHS number (no match, SOAP fault, anything else)
/// yields `None` rather than an error. Name, gender and birth time are
/// only read from inside `<patientPerson>`.
pub fn extract_patient(body: &str) -> Option<Patient> {
    let nhs_number = NHS_NUMBER.captures(body)?.get(1)?.as_str().to_string();
    let person = PATIENT_PERSON
        .captures(body)
        .and_then(|c| c.get(1))
        .map_or("", |m| m.as_str());

    let text = |re: &Regex| -> Vec<String> {
        re.captures_iter(person)
            .filter_map(|c| c.get(1))
            .map(|m| unescape(m.as_str().trim()).into_owned())
            .filter(|s| !s.is_empty())
            .collect()
    };

    let family = text(&FAMILY);
    let given = text(&GIVEN);
    let name = if family.is_empty() && given.is_empty() {
        Vec::new()
    } else {
        vec![HumanName {
            family: family.into_iter().take(1).collect(),
            given,
        }]
    };

    let gender = GENDER
        .captures(person)
        .and_then(|c| c.get(1))
        .map(|m| fhir_gender(m.as_str()).to_string());

    let birth_date = BIRTH_TIME
        .captures(person)
        .and_then(|c| c.get(1))
        .map(|m| {
            let v = m.as_str();
            format!("{}-{}-{}", &v[0..4], &v[4..6], &v[6..8])
        });

    debug!("Extracted traced patient with {} name(s)", name.len());

    Some(Patient {
        identifier: vec![Identifier {
            system: NHS_NUMBER_SYSTEM.to_string(),
            value: nhs_number,
        }],
        name,
        gender,
        birth_date,
        ..Default::default()
    })
}

fn fhir_gender(code: &str) -> &'static str {
    match code {
        "1" => "male",
        "2" => "female",
        "9" => "other",
        _ => "unknown",
    }
}
