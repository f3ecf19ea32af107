pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::bridge::{
    BridgeError, CapabilityDirectory, Orchestrator, TurnOutcome, build_orchestrator,
    build_orchestrator_with_client,
};
pub use application::tooling::{CapabilityProvider, ServerManager, ToolInvokeError};
pub use application::{bridge, stdio, tooling};
pub use config::{AppConfig, ConfigError};
pub use domain::types;
pub use infrastructure::{model, server};
