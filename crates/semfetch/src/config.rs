// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fetcher configuration and its resolution.
//!
//! Values are layered: defaults, then `SEMFETCH_*` environment variables,
//! then an explicit JSON file. Later layers win field by field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_TIMEOUT_MS: &str = "SEMFETCH_TIMEOUT_MS";
pub const ENV_PROXY: &str = "SEMFETCH_PROXY";
pub const ENV_OFFLINE: &str = "SEMFETCH_OFFLINE";
pub const ENV_OFFLINE_MIRROR: &str = "SEMFETCH_OFFLINE_MIRROR";
pub const ENV_ORIGIN: &str = "SEMFETCH_ORIGIN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config file must contain a JSON object")]
    NotAnObject,

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Per-request deadline.
    pub timeout_ms: u64,
    /// Cross-site proxy, `{uri}` is replaced by the encoded target.
    pub proxy_template: Option<String>,
    pub offline: bool,
    /// Base the offline override substitutes for the target host.
    pub offline_mirror: Option<String>,
    /// Host → base URI remap applied before every dial.
    pub local_site_map: BTreeMap<String, String>,
    /// Origin of the calling context. `None` treats every target as same-origin.
    pub context_origin: Option<String>,
    /// Schemes rejected without a network attempt.
    pub unsupported_schemes: Vec<String>,
    /// Graph that receives request/response provenance.
    pub session_node: String,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            proxy_template: None,
            offline: false,
            offline_mirror: None,
            local_site_map: BTreeMap::new(),
            context_origin: None,
            unsupported_schemes: vec!["urn".into(), "tel".into(), "mailto".into()],
            session_node: "urn:x-semfetch:session".into(),
            user_agent: format!("semfetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_unsupported_scheme(&self, scheme: &str) -> bool {
        self.unsupported_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme))
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with variables from `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_TIMEOUT_MS,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_PROXY).filter(|v| !v.is_empty()) {
            config.proxy_template = Some(value);
        }
        if let Some(value) = lookup(ENV_OFFLINE) {
            config.offline = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "" | "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: ENV_OFFLINE,
                        value,
                    })
                }
            };
        }
        if let Some(value) = lookup(ENV_OFFLINE_MIRROR).filter(|v| !v.is_empty()) {
            config.offline_mirror = Some(value);
        }
        if let Some(value) = lookup(ENV_ORIGIN).filter(|v| !v.is_empty()) {
            config.context_origin = Some(value);
        }
        Ok(config)
    }

    /// Overlay the fields present in a JSON object onto `self`.
    pub fn merge_json(self, text: &str) -> Result<Self, ConfigError> {
        let overlay: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Object(overlay) = overlay else {
            return Err(ConfigError::NotAnObject);
        };
        let mut base = serde_json::to_value(self)?;
        if let serde_json::Value::Object(fields) = &mut base {
            fields.extend(overlay);
        }
        Ok(serde_json::from_value(base)?)
    }

    /// Resolve the effective configuration: defaults → environment → file.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::from_env()?;
        match explicit {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), "loading fetcher config");
                config.merge_json(&text)
            }
            None => Ok(config),
        }
    }
}
