// Request translation (FHIR Patient search → Spine PDS simple trace)
// Author: kelexine (https://github.com/kelexine)

use super::xml::escape;
use super::PayloadBuilder;
use crate::config::SpineConfig;
use crate::error::{GatewayError, Result};
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use tracing::debug;

/// HL7 interaction carried by every simple trace request.
pub const SIMPLE_TRACE_INTERACTION: &str = "QUPA_IN000005UK01";

/// OID root for Spine accredited system IDs.
const ASID_ROOT: &str = "1.2.826.0.1285.0.2.0.107";

/// Identities and addresses that come from configuration, not the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineIdentity {
    pub asid: String,
    pub pds_asid: String,
    pub pds_url: String,
    pub from_address: String,
}

impl From<&SpineConfig> for SpineIdentity {
    fn from(config: &SpineConfig) -> Self {
        Self {
            asid: config.asid.clone(),
            pds_asid: config.pds_asid.clone(),
            pds_url: config.pds_url.clone(),
            from_address: config.soap_from_address.clone(),
        }
    }
}

/// Builds the `QUPA_IN000005UK01` SOAP envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTraceBuilder;

impl PayloadBuilder for SimpleTraceBuilder {
    fn build(
        &self,
        family: Option<&str>,
        gender: Option<&str>,
        birthdate: Option<&str>,
        identity: &SpineIdentity,
    ) -> Result<String> {
        build_simple_trace(
            family,
            gender,
            birthdate,
            &identity.asid,
            &identity.pds_asid,
            &identity.pds_url,
            &identity.from_address,
        )
    }
}

/// Build a simple trace request body.
///
/// Pure: the same inputs always give byte-identical output. The SOAP
/// `MessageID` is a digest of the inputs rather than a random UUID.
pub fn build_simple_trace(
    family: Option<&str>,
    gender: Option<&str>,
    birthdate: Option<&str>,
    sender_asid: &str,
    target_asid: &str,
    target_url: &str,
    source_address: &str,
) -> Result<String> {
    let family = required("family", family)?;
    let gender_code = hl7_gender_code(required("gender", gender)?)?;
    let birth_time = hl7_birth_time(required("birthdate", birthdate)?)?;

    for (name, value) in [
        ("sender ASID", sender_asid),
        ("target ASID", target_asid),
        ("target URL", target_url),
        ("source address", source_address),
    ] {
        if value.trim().is_empty() {
            return Err(GatewayError::PayloadBuild(format!("{} is not configured", name)));
        }
    }

    let message_id = message_id(&[
        family,
        gender_code,
        &birth_time,
        sender_asid,
        target_asid,
        target_url,
        source_address,
    ]);

    debug!(
        "Building simple trace {} for gender={} birth_time={}",
        message_id, gender_code, birth_time
    );

    let family = escape(family);
    let sender_asid = escape(sender_asid);
    let target_asid = escape(target_asid);
    let target_url = escape(target_url);
    let source_address = escape(source_address);

    Ok(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/" xmlns:wsa="http://schemas.xmlsoap.org/ws/2004/08/addressing" xmlns:hl7="urn:hl7-org:v3">
  <SOAP-ENV:Header>
    <wsa:MessageID>uuid:{message_id}</wsa:MessageID>
    <wsa:Action>urn:nhs:names:services:pdsquery/{interaction}</wsa:Action>
    <wsa:To>{target_url}</wsa:To>
    <wsa:From>
      <wsa:Address>{source_address}</wsa:Address>
    </wsa:From>
    <hl7:communicationFunctionRcv>
      <hl7:device>
        <hl7:id root="{asid_root}" extension="{target_asid}"/>
      </hl7:device>
    </hl7:communicationFunctionRcv>
    <hl7:communicationFunctionSnd>
      <hl7:device>
        <hl7:id root="{asid_root}" extension="{sender_asid}"/>
      </hl7:device>
    </hl7:communicationFunctionSnd>
    <wsa:ReplyTo>
      <wsa:Address>{source_address}</wsa:Address>
    </wsa:ReplyTo>
  </SOAP-ENV:Header>
  <SOAP-ENV:Body>
    <simpleTraceQuery xmlns="urn:hl7-org:v3">
      <{interaction}>
        <id root="{message_id}"/>
        <interactionId root="2.16.840.1.113883.2.1.3.2.4.12" extension="{interaction}"/>
        <processingCode code="P"/>
        <processingModeCode code="T"/>
        <acceptAckCode code="NE"/>
        <communicationFunctionRcv>
          <device classCode="DEV" determinerCode="INSTANCE">
            <id root="{asid_root}" extension="{target_asid}"/>
          </device>
        </communicationFunctionRcv>
        <communicationFunctionSnd>
          <device classCode="DEV" determinerCode="INSTANCE">
            <id root="{asid_root}" extension="{sender_asid}"/>
          </device>
        </communicationFunctionSnd>
        <ControlActEvent classCode="CACT" moodCode="EVN">
          <author1 typeCode="AUT">
            <AgentSystemSDS classCode="AGNT">
              <agentSystemSDS classCode="DEV" determinerCode="INSTANCE">
                <id root="{asid_root}" extension="{sender_asid}"/>
              </agentSystemSDS>
            </AgentSystemSDS>
          </author1>
          <query>
            <Person.AdministrativeGender>
              <value code="{gender_code}"/>
              <semanticsText>Person.AdministrativeGender</semanticsText>
            </Person.AdministrativeGender>
            <Person.BirthTime>
              <value value="{birth_time}"/>
              <semanticsText>Person.BirthTime</semanticsText>
            </Person.BirthTime>
            <Person.Name>
              <value>
                <family>{family}</family>
              </value>
              <semanticsText>Person.Name</semanticsText>
            </Person.Name>
          </query>
        </ControlActEvent>
      </{interaction}>
    </simpleTraceQuery>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>
"#,
        interaction = SIMPLE_TRACE_INTERACTION,
        asid_root = ASID_ROOT,
    ))
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(GatewayError::PayloadBuild(format!(
            "Missing required search parameter: {}",
            name
        ))),
    }
}

/// Map a FHIR (or single-letter) gender onto the HL7 administrative gender code.
pub fn hl7_gender_code(gender: &str) -> Result<&'static str> {
    match gender.to_ascii_lowercase().as_str() {
        "male" | "m" => Ok("1"),
        "female" | "f" => Ok("2"),
        "other" | "o" => Ok("9"),
        "unknown" | "u" => Ok("0"),
        _ => Err(GatewayError::PayloadBuild(format!(
            "Invalid gender: {}. Must be one of male, female, other, unknown",
            gender
        ))),
    }
}

/// `YYYY-MM-DD` → `YYYYMMDD`, rejecting impossible dates.
pub fn hl7_birth_time(birthdate: &str) -> Result<String> {
    NaiveDate::parse_from_str(birthdate, "%Y-%m-%d")
        .map(|d| d.format("%Y%m%d").to_string())
        .map_err(|_| {
            GatewayError::PayloadBuild(format!(
                "Invalid birthdate: {}. Expected YYYY-MM-DD",
                birthdate
            ))
        })
}

fn message_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Uuid::from_bytes(bytes).to_string().to_uppercase()
}
