//! Configuration data structures for the fhir2spine gateway.
//!
//! This module defines the schema for the application settings: the HTTP
//! listener, the Spine PDS endpoint and identities, the mutually
//! authenticated TLS material, the request queue, audit output and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port).
    #[serde(default)]
    pub server: ServerConfig,

    /// Spine PDS endpoint and message identities.
    #[serde(default)]
    pub spine: SpineConfig,

    /// Client certificate material for the TLS MA connection.
    #[serde(default)]
    pub tls: TlsConfig,

    /// Request queue and worker pool settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Audit file output.
    #[serde(default)]
    pub audit: AuditConfig,

    /// FHIR representation defaults.
    #[serde(default)]
    pub fhir: FhirConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `0.0.0.0`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8080`
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Settings for the outbound Spine PDS connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpineConfig {
    /// Accredited System ID of this gateway (message sender).
    #[serde(default = "default_asid")]
    pub asid: String,

    /// Accredited System ID of the PDS service (message receiver).
    #[serde(default = "default_pds_asid")]
    pub pds_asid: String,

    /// Full URL of the PDS simple trace endpoint.
    #[serde(default = "default_pds_url")]
    pub pds_url: String,

    /// Address placed in the WS-Addressing `From`/`ReplyTo` elements.
    #[serde(default = "default_soap_from_address")]
    pub soap_from_address: String,

    /// Value of the `SOAPaction` transport header.
    /// Default: `urn:nhs:names:services:pdsquery/QUPA_IN000005UK01`
    #[serde(default = "default_soap_action")]
    pub soap_action: String,

    /// Total request timeout in seconds.
    /// Default: `30`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Connection establishment timeout in seconds.
    /// Default: `10`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

/// Client identity and trust anchors for the TLS MA channel.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TlsConfig {
    /// Whether to present a client certificate at all.
    /// Disable only for local stubs.
    #[serde(default)]
    pub enabled: bool,

    /// PEM file holding the client certificate chain.
    #[serde(default)]
    pub client_cert_path: Option<String>,

    /// PEM file holding the client private key.
    #[serde(default)]
    pub client_key_path: Option<String>,

    /// PEM bundle of additional root certificates (Spine CA).
    #[serde(default)]
    pub ca_cert_path: Option<String>,
}

/// Settings for the ingress queue and its consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of queued, unprocessed requests.
    /// Default: `1024`
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    /// Number of request handler workers.
    /// Default: number of logical CPU cores.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// How long the HTTP caller waits for the handler's reply, in seconds.
    /// Default: `35`
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_seconds: u64,
}

/// Settings for the exchange audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit records are written.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory receiving one file per exchange direction.
    /// Default: `log/spine`
    #[serde(default = "default_audit_directory")]
    pub directory: String,
}

/// Settings for FHIR resource rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FhirConfig {
    /// Format used when the client states no preference.
    /// Default: `application/fhir+xml`
    #[serde(default = "default_format")]
    pub default_format: String,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SpineConfig {
    fn default() -> Self {
        Self {
            asid: default_asid(),
            pds_asid: default_pds_asid(),
            pds_url: default_pds_url(),
            soap_from_address: default_soap_from_address(),
            soap_action: default_soap_action(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            workers: default_workers(),
            reply_timeout_seconds: default_reply_timeout(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_audit_directory(),
        }
    }
}

impl Default for FhirConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Helper functions for serde defaults and shared constants
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_asid() -> String {
    "000000000000".to_string()
}

fn default_pds_asid() -> String {
    "928942012545".to_string()
}

fn default_pds_url() -> String {
    "https://localhost:8443/sync-service".to_string()
}

fn default_soap_from_address() -> String {
    "https://localhost:8080/fhir".to_string()
}

pub(crate) fn default_soap_action() -> String {
    "urn:nhs:names:services:pdsquery/QUPA_IN000005UK01".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_reply_timeout() -> u64 {
    35 // backend timeout + 5s
}

fn default_true() -> bool {
    true
}

fn default_audit_directory() -> String {
    "log/spine".to_string()
}

fn default_format() -> String {
    "application/fhir+xml".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
