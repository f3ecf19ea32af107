use clap::Parser;
use mcp_plan_bridge::cli::{Cli, RunMode, render_failure, render_outcome};
use mcp_plan_bridge::{AppConfig, ServerManager, build_orchestrator, server, stdio};
use std::error::Error;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting mcp-plan-bridge");
    let cli = Cli::parse();
    debug!(?cli.mode, config = ?cli.config, model = ?cli.model, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let mut config = AppConfig::load(config_path)?;
    if let Some(model) = cli.model.clone() {
        config.model = model;
    }
    info!(
        model = config.model.as_str(),
        servers = config.servers.len(),
        endpoint = config.planner.endpoint.as_str(),
        "Configuration loaded"
    );

    let manager = Arc::new(ServerManager::new(config.servers.clone()));
    let orchestrator = Arc::new(build_orchestrator(&config, manager.clone()));

    let result = run(&cli, orchestrator).await;
    manager.shutdown().await;
    info!("Bridge execution finished");
    result
}

async fn run(
    cli: &Cli,
    orchestrator: Arc<mcp_plan_bridge::Orchestrator>,
) -> Result<(), Box<dyn Error>> {
    info!(mode = ?cli.mode, "Running bridge in selected mode");
    match cli.mode {
        RunMode::Cli => {
            let prompt = load_prompt(cli)?;
            match orchestrator.handle_turn(&prompt).await {
                Ok(outcome) => {
                    println!("{}", serde_json::to_string_pretty(&render_outcome(&outcome))?);
                }
                Err(err) => {
                    println!("{}", serde_json::to_string_pretty(&render_failure(&err))?);
                    return Err(err.into());
                }
            }
        }
        RunMode::Stdio => {
            let tools = orchestrator.start().await?;
            info!(tools, "Entering STDIO mode; awaiting JSON line input");
            stdio::run(orchestrator).await?;
        }
        RunMode::Rest => {
            match orchestrator.start().await {
                Ok(tools) => info!(tools, "Capability directory ready"),
                Err(err) => warn!(%err, "Capability listing failed at startup; will retry per request"),
            }
            info!(addr = %cli.rest_addr, "Starting REST server");
            server::serve(orchestrator, cli.rest_addr).await?;
        }
    }
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .with_level(true)
            .init();
    });
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path, "Loading prompt from file");
        let content = fs::read_to_string(path)?;
        return non_empty(normalize_prompt(content));
    }

    if !cli.prompt.is_empty() {
        info!("Using prompt provided through CLI arguments");
        return non_empty(normalize_prompt(cli.prompt.join(" ")));
    }

    if !io::stdin().is_terminal() {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return non_empty(normalize_prompt(buffer));
    }

    warn!("Prompt not provided via arguments, file, or stdin");
    Err("prompt required via arguments, file, or stdin".into())
}

fn normalize_prompt(prompt: String) -> String {
    prompt.trim().to_string()
}

fn non_empty(prompt: String) -> Result<String, Box<dyn Error>> {
    if prompt.is_empty() {
        return Err("prompt cannot be empty".into());
    }
    Ok(prompt)
}
