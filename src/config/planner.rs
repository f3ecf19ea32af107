//! Planning model endpoint configuration.
//!
//! ```toml
//! [planner]
//! endpoint = "https://api.deepseek.com"
//! api_path = "/v1/chat/completions"
//! api_key_env = "DEEPSEEK_API_KEY"
//! timeout_secs = 60
//! ```
//!
//! `timeout_secs = 0` leaves model requests unbounded, the same as
//! `tool_timeout_secs = 0` does for tool calls.
//!
//! The API key itself never lives in the file; `api_key_env` names the
//! environment variable (usually set through `config/.env`) that holds it.

use super::defaults::{
    DEFAULT_API_KEY_ENV, DEFAULT_API_PATH, DEFAULT_ENDPOINT, DEFAULT_MODEL_TIMEOUT_SECS,
};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub endpoint: String,
    pub api_path: String,
    pub api_key_env: Option<String>,
    pub timeout: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            api_key_env: Some(DEFAULT_API_KEY_ENV.to_string()),
            timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}

impl PlannerConfig {
    /// Resolve the bearer key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        let raw = self.api_key_env.as_deref().map(str::trim)?;
        if raw.is_empty() {
            return None;
        }
        match env::var(raw) {
            Ok(value) if !value.trim().is_empty() => Some(value),
            Ok(_) => None,
            Err(err) => {
                warn!(
                    endpoint = self.endpoint.as_str(),
                    env_var = raw,
                    %err,
                    "API key environment variable is not set"
                );
                None
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub(super) struct RawPlannerConfig {
    endpoint: Option<String>,
    api_path: Option<String>,
    api_key_env: Option<String>,
    timeout_secs: Option<u64>,
}

impl From<RawPlannerConfig> for PlannerConfig {
    fn from(raw: RawPlannerConfig) -> Self {
        let defaults = PlannerConfig::default();
        Self {
            endpoint: raw.endpoint.unwrap_or(defaults.endpoint),
            api_path: raw.api_path.unwrap_or(defaults.api_path),
            api_key_env: raw.api_key_env.or(defaults.api_key_env),
            timeout: raw
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let raw: RawPlannerConfig = toml::from_str("endpoint = \"http://localhost:9000\"")
            .expect("parse planner table");
        let config = PlannerConfig::from(raw);
        assert_eq!(config.endpoint, "http://localhost:9000");
        assert_eq!(config.api_path, DEFAULT_API_PATH);
        assert_eq!(config.api_key_env.as_deref(), Some(DEFAULT_API_KEY_ENV));
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS));
    }

    #[test]
    #[serial]
    fn resolves_api_key_from_named_variable() {
        unsafe {
            env::set_var("BRIDGE_TEST_PLANNER_KEY", "sk-test");
        }
        let config = PlannerConfig {
            api_key_env: Some("BRIDGE_TEST_PLANNER_KEY".into()),
            ..PlannerConfig::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-test"));
        unsafe {
            env::remove_var("BRIDGE_TEST_PLANNER_KEY");
        }
        assert!(config.resolve_api_key().is_none());
    }

    #[test]
    fn blank_variable_name_means_no_key() {
        let config = PlannerConfig {
            api_key_env: Some("  ".into()),
            ..PlannerConfig::default()
        };
        assert!(config.resolve_api_key().is_none());
    }
}
