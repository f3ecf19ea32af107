pub mod app;
pub mod defaults;
pub mod error;
pub mod loader;
pub mod planner;
pub mod server;

/// Default config file path - can be overridden via CLI argument
pub const CONFIG_PATH: &str = "config/bridge.toml";

pub use app::AppConfig;
pub use error::ConfigError;
pub use planner::PlannerConfig;
pub use server::ServerConfig;
