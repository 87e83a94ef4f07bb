//! Client configuration: TOML file plus environment overrides.
//!
//! Lookup order per field: environment variable, then config file, then
//! built-in default. The file is optional unless the user named one
//! explicitly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::AgentConfig;
use crate::error::ClientError;
use crate::session::{SubmitPolicy, DEFAULT_AGENT_ID};

/// Environment variable overriding the backend base URL.
pub const ENV_BASE_URL: &str = "MENTOR_BASE_URL";
/// Environment variable overriding the startup agent.
pub const ENV_AGENT: &str = "MENTOR_AGENT";

/// Everything the binary needs to construct the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub agent: String,
    pub submit_policy: SubmitPolicy,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Default `k` for retriever debug queries.
    pub retriever_k: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: "http://127.0.0.1:8000".to_string(),
            agent: DEFAULT_AGENT_ID.to_string(),
            submit_policy: SubmitPolicy::default(),
            connect_timeout_secs: 3,
            request_timeout_secs: 10,
            retriever_k: 5,
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document. Unknown keys are ignored, absent keys fall
    /// back to the defaults.
    pub fn from_toml(text: &str) -> Result<Self, ClientError> {
        toml::from_str(text).map_err(|e| ClientError::Config {
            path: "<inline>".to_string(),
            detail: e.to_string(),
        })
    }

    /// Load from `path`. A missing file is only an error when
    /// `required` is set (the user asked for that specific file).
    pub fn load(path: &Path, required: bool) -> Result<Self, ClientError> {
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).map_err(|e| ClientError::Config {
                path: path.display().to_string(),
                detail: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                Ok(ClientConfig::default())
            }
            Err(e) => Err(ClientError::Config {
                path: path.display().to_string(),
                detail: e.to_string(),
            }),
        }
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides through a lookup function.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Some(agent) = lookup(ENV_AGENT) {
            if !agent.trim().is_empty() {
                self.agent = agent.trim().to_string();
            }
        }
    }
}

/// Validate an agent-config form before posting it back. Mirrors the
/// bounds the backend form enforces: temperature in `[0, 2]`, at least one
/// output token.
pub fn validate_agent_config(config: &AgentConfig) -> Result<(), ClientError> {
    if !(0.0..=2.0).contains(&config.temperature) || !config.temperature.is_finite() {
        return Err(ClientError::Validation {
            field: "temperature",
            detail: format!("{} fora do intervalo [0, 2]", config.temperature),
        });
    }
    if config.max_tokens == 0 {
        return Err(ClientError::Validation {
            field: "max_tokens",
            detail: "deve ser um inteiro positivo".to_string(),
        });
    }
    Ok(())
}
