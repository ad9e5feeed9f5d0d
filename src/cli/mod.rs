//! CLI Module
//!
//! Command-line interface for Support Mesh using Clap v4.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Support Mesh - multi-agent customer service orchestration
#[derive(Parser, Debug)]
#[command(name = "support-mesh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route a single request through the agents
    Ask {
        /// The customer's request
        text: String,

        /// Customer id to use when the text doesn't mention one
        #[arg(long)]
        customer_id: Option<u64>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Run the built-in demonstration scenarios over one connection
    Scenarios {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Main CLI entry point
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = commands::load_config(cli.config.as_deref())?;
    if cli.debug {
        config.logging.level = "debug".to_string();
    }
    config.validate()?;

    let _guard = crate::logging::init(&config.logging)?;
    if cli.debug {
        tracing::info!("Debug mode enabled");
    }

    match cli.command {
        Commands::Ask {
            text,
            customer_id,
            format,
        } => commands::cmd_ask(&config, text, customer_id, format).await,
        Commands::Scenarios { format } => commands::cmd_scenarios(&config, format).await,
        Commands::Init { force } => commands::cmd_init(&config, force),
    }
}
