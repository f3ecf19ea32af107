use super::defaults::{DEFAULT_MODEL, DEFAULT_NARRATION_PROMPT, DEFAULT_TOOL_TIMEOUT_SECS};
use super::error::ConfigError;
use super::planner::PlannerConfig;
use super::server::ServerConfig;
use std::path::Path;
use std::time::Duration;

/// Application configuration loaded from bridge.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub narration_prompt: String,
    pub tool_timeout: Duration,
    pub planner: PlannerConfig,
    pub servers: Vec<ServerConfig>,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            narration_prompt: DEFAULT_NARRATION_PROMPT.to_string(),
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            planner: PlannerConfig::default(),
            servers: Vec::new(),
        }
    }
}
