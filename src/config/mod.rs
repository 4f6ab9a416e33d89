//! Configuration Module
//!
//! Handles application configuration loading, validation, and management.
//! Settings live in `~/.zapgate/config.toml`; secrets and deploy-specific
//! endpoints can be overridden through the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// External WhatsApp gateway
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Webhook callback resolution
    #[serde(default)]
    pub webhook: WebhookSettings,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseSettings,

    /// Organization the CLI operates on
    #[serde(default)]
    pub tenant: TenantSettings,
}

/// External gateway endpoint and fleet credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Fixed base URL of the gateway
    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,

    /// Fleet-level admin token. Prefer ZAPGATE_ADMIN_TOKEN over the file.
    #[serde(default)]
    pub admin_token: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_gateway_base_url(),
            admin_token: String::new(),
        }
    }
}

/// Public origin the gateway posts webhook events to.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhookSettings {
    /// Must be a production HTTPS origin; anything else falls back to the
    /// hardcoded production host (see the webhook module).
    #[serde(default)]
    pub public_url: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Organization binding for the CLI surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSettings {
    /// Organization id lifecycle commands act on
    #[serde(default)]
    pub org_id: Option<String>,

    /// User id the CLI acts as (always the organization owner)
    #[serde(default = "default_operator")]
    pub operator: String,
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            org_id: None,
            operator: default_operator(),
        }
    }
}

fn default_gateway_base_url() -> String {
    "https://free.uazapi.com".to_string()
}

fn default_db_path() -> String {
    zapgate_home().join("zapgate.db").to_string_lossy().to_string()
}

fn default_operator() -> String {
    "operator".to_string()
}

/// Path to the ZapGate home directory: `~/.zapgate/`
pub fn zapgate_home() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".zapgate"))
        .unwrap_or_else(|| PathBuf::from(".zapgate"))
}

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    zapgate_home().join("config.toml")
}

impl Config {
    /// Load from `path` (or the default location), then apply environment
    /// overrides. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);
        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        } else {
            Config::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Environment overrides for secrets and deploy-specific endpoints.
    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("ZAPGATE_ADMIN_TOKEN")
            && !token.is_empty()
        {
            self.gateway.admin_token = token;
        }
        if let Ok(url) = std::env::var("ZAPGATE_GATEWAY_URL")
            && !url.is_empty()
        {
            self.gateway.base_url = url;
        }
        if let Ok(url) = std::env::var("ZAPGATE_PUBLIC_URL")
            && !url.is_empty()
        {
            self.webhook.public_url = Some(url);
        }
        if let Ok(org) = std::env::var("ZAPGATE_ORG_ID")
            && !org.is_empty()
        {
            self.tenant.org_id = Some(org);
        }
    }

    /// Write a default configuration file. Refuses to overwrite unless `force`.
    pub fn write_default(path: &Path, force: bool) -> Result<PathBuf> {
        if path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let rendered =
            toml::to_string_pretty(&Config::default()).context("rendering default config")?;
        fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?;
        Ok(path.to_path_buf())
    }
}
