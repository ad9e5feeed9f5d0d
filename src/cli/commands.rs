//! CLI command handlers.

use super::OutputFormat;
use crate::a2a;
use crate::config::Config;
use crate::protocol::StdioTransport;
use crate::router::{Request, Router, RouterOutcome};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Requests run by `scenarios`, in order.
pub const SCENARIOS: &[(&str, &str)] = &[
    ("Task allocation", "Get customer information for ID 5"),
    ("Account upgrade", "I'm customer 12 and need help upgrade my account"),
    (
        "Escalation",
        "I've been charged twice, please cancel my subscription. My ID is 7",
    ),
    (
        "Negotiation",
        "Show me all active customers who have open tickets",
    ),
    (
        "Multi-intent",
        "I am customer 12, update my email to new@email.com and show my ticket history",
    ),
];

/// Load configuration, from an explicit file when one is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

async fn connect(config: &Config) -> Result<StdioTransport> {
    tracing::info!(
        "Starting tool server: {} {}",
        config.tool_server.command,
        config.tool_server.args.join(" ")
    );
    StdioTransport::spawn(&config.tool_server)
        .await
        .context("Failed to start tool server")
}

/// Answer one request.
pub(crate) async fn cmd_ask(
    config: &Config,
    text: String,
    customer_id: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let transport = Arc::new(connect(config).await?);
    let router = Router::with_config(transport.clone(), config.router.clone());

    let mut request = Request::new(text);
    if let Some(id) = customer_id {
        request = request.with_customer_id(id);
    }
    let outcome = router.handle(request).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => print_outcome(&outcome),
    }

    drop(router);
    shutdown(transport).await;
    Ok(())
}

/// Run every scenario sequentially over one connection.
pub(crate) async fn cmd_scenarios(config: &Config, format: OutputFormat) -> Result<()> {
    let transport = Arc::new(connect(config).await?);
    let router = Router::with_config(transport.clone(), config.router.clone());

    let mut outcomes = Vec::with_capacity(SCENARIOS.len());
    for (index, (title, text)) in SCENARIOS.iter().enumerate() {
        tracing::info!("Scenario {}/{}: {}", index + 1, SCENARIOS.len(), title);
        let outcome = router.handle(Request::new(*text)).await;

        if format == OutputFormat::Text {
            println!("{}", "=".repeat(72));
            println!("Scenario {}: {}", index + 1, title);
            println!("Query: {}", text);
            println!("{}", "=".repeat(72));
            print_outcome(&outcome);
            println!();
        }
        outcomes.push(outcome);
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    }

    drop(router);
    shutdown(transport).await;
    Ok(())
}

/// Write a default configuration file.
pub(crate) fn cmd_init(config: &Config, force: bool) -> Result<()> {
    let path = Config::system_config_path().context("Could not determine config path")?;

    if path.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists: {:?}\nUse --force to overwrite",
            path
        );
    }

    config.save(&path)?;
    println!("✅ Configuration initialized at: {:?}", path);
    Ok(())
}

fn print_outcome(outcome: &RouterOutcome) {
    println!("{}", outcome.response);
    println!();
    println!("Status: {} ({})", outcome.status, outcome.shape);
    println!("A2A log:");
    println!("{}", a2a::render(&outcome.log));
}

async fn shutdown(transport: Arc<StdioTransport>) {
    match Arc::try_unwrap(transport) {
        Ok(transport) => transport.shutdown().await,
        Err(_) => tracing::warn!("Tool server still in use; leaving it to exit on drop"),
    }
}
