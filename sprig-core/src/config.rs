// Server configuration
//
// Sources, lowest to highest priority: defaults, application metadata,
// an optional TOML file, then `SPRIG_*` environment variables.

use crate::http::APPLICATION_OCTET_STREAM;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5000;
pub const ENV_PREFIX: &str = "SPRIG";

/// Settings read once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Namespace scanned for controller registrations
    pub base_namespace: Option<String>,
    /// Content type sent with serialized return values
    pub response_content_type: String,
    /// How long `stop` waits for in-flight connections
    pub shutdown_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base_namespace: None,
            response_content_type: APPLICATION_OCTET_STREAM.to_string(),
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

/// Partial configuration; every field present overrides the base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverlay {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_namespace: Option<String>,
    pub response_content_type: Option<String>,
    pub shutdown_timeout_ms: Option<u64>,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_base_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.base_namespace = Some(namespace.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.response_content_type = content_type.into();
        self
    }

    pub fn with_shutdown_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.shutdown_timeout_ms = timeout_ms;
        self
    }

    /// Apply a partial configuration on top of this one
    pub fn merge(mut self, overlay: ConfigOverlay) -> Self {
        if let Some(host) = overlay.host {
            self.host = host;
        }
        if let Some(port) = overlay.port {
            self.port = port;
        }
        if let Some(namespace) = overlay.base_namespace {
            self.base_namespace = Some(namespace);
        }
        if let Some(content_type) = overlay.response_content_type {
            self.response_content_type = content_type;
        }
        if let Some(timeout) = overlay.shutdown_timeout_ms {
            self.shutdown_timeout_ms = timeout;
        }
        self
    }

    /// Overlay the settings found in TOML text
    pub fn merge_toml_str(self, text: &str) -> Result<Self> {
        let overlay: ConfigOverlay =
            toml::from_str(text).map_err(|e| Error::Config(format!("invalid TOML: {}", e)))?;
        Ok(self.merge(overlay))
    }

    /// Overlay the settings found in a TOML file
    pub fn merge_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loading configuration file");
        self.merge_toml_str(&text)
    }

    /// Overlay prefix-stripped, lowercased variables (`port`, `host`, ...).
    pub fn merge_vars(mut self, vars: &HashMap<String, String>) -> Result<Self> {
        if let Some(host) = vars.get("host") {
            self.host = host.clone();
        }
        if let Some(port) = vars.get("port") {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("invalid port '{}': {}", port, e)))?;
        }
        if let Some(namespace) = vars.get("base_namespace") {
            self.base_namespace = Some(namespace.clone());
        }
        if let Some(content_type) = vars.get("content_type") {
            self.response_content_type = content_type.clone();
        }
        if let Some(timeout) = vars.get("shutdown_timeout_ms") {
            self.shutdown_timeout_ms = timeout.trim().parse().map_err(|e| {
                Error::Config(format!("invalid shutdown timeout '{}': {}", timeout, e))
            })?;
        }
        Ok(self)
    }

    /// Overlay `SPRIG_CONFIG` (a TOML file) and then `SPRIG_*` variables.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    pub fn merge_env(self) -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }

        let vars = EnvLoader::new(ENV_PREFIX).load();
        let config = match vars.get("config") {
            Some(path) => self.merge_file(path)?,
            None => self,
        };
        config.merge_vars(&vars)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if let Some(namespace) = &self.base_namespace
            && namespace.trim().is_empty()
        {
            return Err(Error::Config("base namespace must not be empty".to_string()));
        }
        if self.response_content_type.trim().is_empty() {
            return Err(Error::Config(
                "response content type must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` as passed to the listener
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Reads environment variables under a prefix
#[derive(Debug, Clone)]
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// All `PREFIX_*` variables, keyed by the lowercased remainder
    pub fn load(&self) -> HashMap<String, String> {
        self.filter(env::vars())
    }

    /// A single `PREFIX_KEY` variable
    pub fn load_var(&self, key: &str) -> Option<String> {
        env::var(format!("{}_{}", self.prefix, key.to_uppercase())).ok()
    }

    fn filter(&self, vars: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
        let prefix = format!("{}_", self.prefix);
        vars.filter_map(|(key, value)| {
            key.strip_prefix(&prefix)
                .filter(|rest| !rest.is_empty())
                .map(|rest| (rest.to_lowercase(), value))
        })
        .collect()
    }
}
