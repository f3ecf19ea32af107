use super::CONFIG_PATH;
use super::app::AppConfig;
use super::defaults::{DEFAULT_MODEL, DEFAULT_NARRATION_PROMPT, DEFAULT_TOOL_TIMEOUT_SECS};
use super::error::ConfigError;
use super::planner::{PlannerConfig, RawPlannerConfig};
use super::server::{RawServer, ServerConfig};
use dotenvy::from_filename;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;
use tracing::{debug, info};

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    model: Option<String>,
    narration_prompt: Option<String>,
    tool_timeout_secs: Option<u64>,
    #[serde(default)]
    planner: RawPlannerConfig,
    #[serde(default)]
    servers: Vec<RawServer>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename("config/.env");
    });
}

/// Load configuration. An explicit path must exist; the default path may be
/// absent, in which case built-in defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    if let Some(path) = path {
        return read_config(path);
    }
    match read_config(Path::new(CONFIG_PATH)) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound { .. }) => {
            info!("Configuration file not found; using defaults");
            Ok(AppConfig::default())
        }
        Err(other) => Err(other),
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading bridge configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let model = match parsed.model {
        Some(model) if model.trim().is_empty() => return Err(ConfigError::EmptyModel),
        Some(model) => model,
        None => DEFAULT_MODEL.to_string(),
    };

    let mut seen = HashSet::new();
    let mut servers = Vec::with_capacity(parsed.servers.len());
    for (position, raw) in parsed.servers.into_iter().enumerate() {
        if raw.command.trim().is_empty() {
            return Err(ConfigError::MissingCommand { position });
        }
        if !seen.insert(raw.name.clone()) {
            return Err(ConfigError::DuplicateServer { name: raw.name });
        }
        servers.push(ServerConfig::from(raw));
    }

    Ok(AppConfig {
        model,
        narration_prompt: parsed
            .narration_prompt
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NARRATION_PROMPT.to_string()),
        tool_timeout: Duration::from_secs(
            parsed.tool_timeout_secs.unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
        ),
        planner: PlannerConfig::from(parsed.planner),
        servers,
    })
}
