use crate::utils::env_parse;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

const SOURCE: &str = "server_config";

/// Server-side settings.
///
/// Sources, lowest precedence first: [`Default`], a YAML file
/// ([`ServerConfig::from_yaml_file`]), then `BFETCH_*` environment variables
/// ([`ServerConfig::with_env_overrides`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Prefix every registered route is mounted under.
    pub base_path: String,
    /// Largest accepted request body; larger bodies get `413`.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_path: "/bfetch".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw).map_err(|e| {
            Error::configuration_with_context(
                e.to_string(),
                ErrorContext::new().with_source(SOURCE),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw).map_err(|e| match e {
            Error::Configuration { message, context } => Error::Configuration {
                message,
                context: context.with_details(path.display().to_string()),
            },
            other => other,
        })
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `BFETCH_BIND_ADDR`, `BFETCH_BASE_PATH` and `BFETCH_MAX_BODY_BYTES`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(addr) = env_parse::<SocketAddr>("BFETCH_BIND_ADDR", SOURCE)? {
            self.bind_addr = addr;
        }
        if let Ok(base_path) = std::env::var("BFETCH_BASE_PATH") {
            self.base_path = base_path;
        }
        if let Some(max) = env_parse::<usize>("BFETCH_MAX_BODY_BYTES", SOURCE)? {
            self.max_body_bytes = max;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(Error::configuration_with_context(
                "base path must be empty or start with '/'",
                ErrorContext::new()
                    .with_field_path("base_path")
                    .with_details(self.base_path.clone()),
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(Error::configuration_with_context(
                "max body size must be greater than zero",
                ErrorContext::new().with_field_path("max_body_bytes"),
            ));
        }
        Ok(())
    }

    /// Full path of a route registered as `path`.
    pub fn route_path(&self, path: &str) -> String {
        let base = self.base_path.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}
