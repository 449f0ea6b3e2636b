// Shared fakes for integration tests
// Author: kelexine (https://github.com/kelexine)

#![allow(dead_code)]

use async_trait::async_trait;
use fhir2spine::audit::{AuditRecord, AuditSink};
use fhir2spine::config::AppConfig;
use fhir2spine::error::{GatewayError, Result};
use fhir2spine::models::{BackendResponse, OutboundRequest};
use fhir2spine::spine::BackendClient;
use std::sync::{Arc, Mutex};

pub const PDS_URL: &str = "https://spine.test/sync-service";

pub const TRACE_REPLY: &str = r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
<SOAP-ENV:Body><traceQueryResponse xmlns="urn:hl7-org:v3"><QUPA_IN000007UK01>
<subject><patientRole>
  <id root="2.16.840.1.113883.2.1.4.1" extension="9434765919"/>
  <patientPerson>
    <name><given>Jane</given><family>Smith</family></name>
    <administrativeGenderCode code="2"/>
    <birthTime value="19800101"/>
  </patientPerson>
</patientRole></subject>
</QUPA_IN000007UK01></traceQueryResponse></SOAP-ENV:Body></SOAP-ENV:Envelope>"#;

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.spine.asid = "111111111111".to_string();
    config.spine.pds_asid = "928942012545".to_string();
    config.spine.pds_url = PDS_URL.to_string();
    config.spine.soap_from_address = "https://gateway.test/fhir".to_string();
    config.queue.capacity = 16;
    config.queue.workers = 2;
    config.queue.reply_timeout_seconds = 5;
    config
}

/// What the fake backend should do with each call.
#[derive(Clone)]
pub enum Scripted {
    Reply(u16, String),
    ConnectionFailure(String),
    BodyFailure(u16, String),
}

/// Records every request and answers with a fixed script.
pub struct FakeBackend {
    script: Scripted,
    pub sent: Mutex<Vec<OutboundRequest>>,
}

impl FakeBackend {
    pub fn replying(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Scripted::Reply(status, body.to_string()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Scripted::ConnectionFailure(reason.to_string()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn losing_body(status: u16, reason: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Scripted::BodyFailure(status, reason.to_string()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse> {
        self.sent.lock().unwrap().push(request);
        match &self.script {
            Scripted::Reply(status, body) => Ok(BackendResponse::new(*status, body.clone())),
            Scripted::ConnectionFailure(reason) => Err(GatewayError::Transport(reason.clone())),
            Scripted::BodyFailure(status, reason) => Err(GatewayError::ResponseBody {
                status: *status,
                reason: reason.clone(),
            }),
        }
    }
}

/// Keeps audit records in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    pub records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        self.records.lock().unwrap().push(record);
    }
}
