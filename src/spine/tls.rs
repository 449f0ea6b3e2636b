//! Client identity and trust roots for the TLS MA connection to Spine.
//!
//! Certificates are issued and rotated elsewhere; this module only reads
//! the PEM files named in [`TlsConfig`] once at startup.

// Author: kelexine (https://github.com/kelexine)

use crate::config::TlsConfig;
use crate::error::{GatewayError, Result};
use reqwest::{Certificate, Identity};
use std::path::Path;
use tracing::debug;

/// Load the client certificate and key as one identity.
///
/// Returns `None` when TLS client authentication is disabled.
pub fn load_identity(config: &TlsConfig) -> Result<Option<Identity>> {
    if !config.enabled {
        return Ok(None);
    }

    let (cert_path, key_path) = match (&config.client_cert_path, &config.client_key_path) {
        (Some(cert), Some(key)) => (cert, key),
        _ => {
            return Err(GatewayError::Tls(
                "client certificate and key paths are required".to_string(),
            ))
        }
    };

    let mut pem = read_pem(Path::new(cert_path))?;
    pem.push(b'\n');
    pem.extend(read_pem(Path::new(key_path))?);

    let identity = Identity::from_pem(&pem)
        .map_err(|e| GatewayError::Tls(format!("invalid client identity: {}", e)))?;

    debug!("Loaded client identity from {}", cert_path);
    Ok(Some(identity))
}

/// Load extra root certificates (e.g. the Spine CA chain).
pub fn load_root_certificates(config: &TlsConfig) -> Result<Vec<Certificate>> {
    let Some(ca_path) = &config.ca_cert_path else {
        return Ok(Vec::new());
    };

    let pem = read_pem(Path::new(ca_path))?;
    let certs = Certificate::from_pem_bundle(&pem)
        .map_err(|e| GatewayError::Tls(format!("invalid CA bundle {}: {}", ca_path, e)))?;

    if certs.is_empty() {
        return Err(GatewayError::Tls(format!("no certificates found in {}", ca_path)));
    }

    debug!("Loaded {} root certificate(s) from {}", certs.len(), ca_path);
    Ok(certs)
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(GatewayError::Tls(format!("file not found: {}", path.display())));
    }
    Ok(std::fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_tls_has_no_identity() {
        let config = TlsConfig::default();
        assert!(load_identity(&config).unwrap().is_none());
        assert!(load_root_certificates(&config).unwrap().is_empty());
    }

    #[test]
    fn test_missing_files_are_tls_errors() {
        let config = TlsConfig {
            enabled: true,
            client_cert_path: Some("/nonexistent/client.pem".to_string()),
            client_key_path: Some("/nonexistent/client.key".to_string()),
            ca_cert_path: Some("/nonexistent/ca.pem".to_string()),
        };
        assert!(matches!(load_identity(&config), Err(GatewayError::Tls(_))));
        assert!(matches!(load_root_certificates(&config), Err(GatewayError::Tls(_))));
    }

    #[test]
    fn test_garbage_ca_bundle_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ca.pem");
        std::fs::write(&path, "not a certificate").unwrap();

        let config = TlsConfig {
            ca_cert_path: Some(path.to_string_lossy().to_string()),
            ..Default::default()
        };
        assert!(load_root_certificates(&config).is_err());
    }
}
