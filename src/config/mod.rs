// Configuration module
// Author: kelexine (https://github.com/kelexine)

mod models;

pub use models::*;

use crate::error::{GatewayError, Result};
use config::{Config, Environment, File};
use std::path::PathBuf;

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Config file (`--config` path or `~/.fhir2spine/config.toml`)
    /// 3. Defaults (lowest)
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path
            .map(str::to_string)
            .unwrap_or_else(Self::default_config_path);

        let config = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&Self::default())?)
            // An explicit --config path must exist; the default one may not
            .add_source(File::with_name(&config_path).required(path.is_some()))
            // Override with environment variables (e.g. FHIR2SPINE_SPINE__PDS_URL)
            .add_source(
                Environment::with_prefix("FHIR2SPINE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("spine.asid", &self.spine.asid),
            ("spine.pds_asid", &self.spine.pds_asid),
            ("spine.pds_url", &self.spine.pds_url),
            ("spine.soap_from_address", &self.spine.soap_from_address),
            ("spine.soap_action", &self.spine.soap_action),
            ("fhir.default_format", &self.fhir.default_format),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(GatewayError::Config(format!("{} must not be empty", key)));
            }
        }

        if !self.spine.pds_url.starts_with("http://") && !self.spine.pds_url.starts_with("https://") {
            return Err(GatewayError::Config(format!(
                "spine.pds_url must be an http(s) URL, got {}",
                self.spine.pds_url
            )));
        }

        if self.queue.capacity == 0 || self.queue.workers == 0 {
            return Err(GatewayError::Config(
                "queue.capacity and queue.workers must be greater than zero".to_string(),
            ));
        }

        if self.spine.timeout_seconds == 0 {
            return Err(GatewayError::Config(
                "spine.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        if self.tls.enabled
            && (self.tls.client_cert_path.is_none() || self.tls.client_key_path.is_none())
        {
            return Err(GatewayError::Config(
                "tls.client_cert_path and tls.client_key_path are required when tls.enabled".to_string(),
            ));
        }

        Ok(())
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fhir2spine")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}
