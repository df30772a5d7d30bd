// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Process-wide configuration, loaded once at startup. Hot-reload is a
//! non-goal (spec §9) — a new `AppConfig` means a new process.

use serde::Deserialize;

use crate::domain::constraints::Constraints;
use crate::domain::repository::{PostgresConfig, StorageBackend};

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub constraints_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    InMemory,
    Postgres { connection_string: String },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::InMemory
    }
}

impl StorageConfig {
    pub fn to_backend(&self) -> StorageBackend {
        match self {
            StorageConfig::InMemory => StorageBackend::InMemory,
            StorageConfig::Postgres { connection_string } => {
                StorageBackend::PostgreSQL(PostgresConfig { connection_string: connection_string.clone() })
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    /// `"mock"` or `"openai-compatible"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// `"env:VAR_NAME"` indirection, resolved at startup via
    /// [`resolve_api_key`], never stored in plaintext in the config file.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

fn default_provider() -> String {
    "mock".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self { provider: default_provider(), base_url: None, api_key: None, model: None }
    }
}

#[derive(Debug, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_python_executable")]
    pub python_executable: String,
    #[serde(default)]
    pub data_cache_dir: Option<String>,
}

fn default_python_executable() -> String {
    "python3".to_string()
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self { python_executable: default_python_executable(), data_cache_dir: None }
    }
}

impl AppConfig {
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Loads the `Constraints` document referenced by `constraints_path`, or
    /// the documented defaults when unset.
    pub fn load_constraints(&self) -> anyhow::Result<Constraints> {
        match &self.constraints_path {
            Some(path) => {
                let source = std::fs::read_to_string(path)?;
                Ok(Constraints::from_yaml(&source)?)
            }
            None => Ok(Constraints::default()),
        }
    }
}

/// Resolves an `"env:VAR_NAME"` indirection to the environment variable's
/// value. A bare string (no `env:` prefix) is returned unchanged, for local
/// development convenience.
pub fn resolve_api_key(key: &str) -> anyhow::Result<String> {
    match key.strip_prefix("env:") {
        Some(var_name) => std::env::var(var_name)
            .map_err(|_| anyhow::anyhow!("environment variable not set: {var_name}")),
        None => Ok(key.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_in_memory_and_mock_llm() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert!(matches!(config.storage, StorageConfig::InMemory));
        assert_eq!(config.llm.provider, "mock");
    }

    #[test]
    fn env_indirection_resolves_from_environment() {
        std::env::set_var("TOOLSMITH_TEST_KEY", "secret-value");
        assert_eq!(resolve_api_key("env:TOOLSMITH_TEST_KEY").unwrap(), "secret-value");
        std::env::remove_var("TOOLSMITH_TEST_KEY");
    }

    #[test]
    fn missing_env_var_is_an_error() {
        assert!(resolve_api_key("env:TOOLSMITH_DOES_NOT_EXIST").is_err());
    }

    #[test]
    fn bare_key_passes_through() {
        assert_eq!(resolve_api_key("sk-literal").unwrap(), "sk-literal");
    }
}
