//! Chatrelay CLI — entry point.
//!
//! # Commands
//!
//! - `chatrelay serve [--host H] [--port P]` — run the HTTP proxy
//! - `chatrelay ask [-m MESSAGE] [--model ID]` — chat from the terminal (single-shot or REPL)
//! - `chatrelay models` — list the model catalog
//! - `chatrelay status` — show configuration and provider status
//! - `chatrelay onboard` — write a default config file

mod ask;
mod helpers;
mod models;
mod onboard;
mod repl;
mod serve;
mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use chatrelay_core::config::{load_config, Config};
use chatrelay_proxy::AppState;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Chatrelay — multi-provider LLM chat proxy
#[derive(Parser)]
#[command(name = "chatrelay", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.chatrelay/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (API + static site)
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Chat from the terminal (single-shot or interactive REPL)
    Ask {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Model id (default: chat.defaultModel)
        #[arg(long)]
        model: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// List available chat models
    Models,

    /// Show configuration and provider status
    Status,

    /// Write a default configuration file
    Onboard,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Serve { host, port, logs } => {
            init_logging(logs, "info");
            let mut config = load(config_path)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve::run(config).await
        }
        Commands::Ask {
            message,
            model,
            logs,
        } => {
            init_logging(logs, "warn");
            let config = load(config_path)?;
            run_ask(&config, message, model).await
        }
        Commands::Models => models::run(&load(config_path)?),
        Commands::Status => status::run(config_path.as_deref()),
        Commands::Onboard => onboard::run(config_path.as_deref()),
    }
}

fn load(path: Option<PathBuf>) -> Result<Config> {
    if let Some(ref p) = path {
        if !p.exists() {
            anyhow::bail!("config file not found: {}", p.display());
        }
    }
    Ok(load_config(path.as_deref()))
}

// ─────────────────────────────────────────────
// Ask command
// ─────────────────────────────────────────────

async fn run_ask(config: &Config, message: Option<String>, model: Option<String>) -> Result<()> {
    let state = AppState::from_config(config)
        .context("invalid model configuration")?
        .into_shared();
    let mut session = ask::ChatSession::new(state, model);

    match message {
        Some(msg) => {
            // Single-shot mode
            info!(model = session.model_id(), "processing single message");
            let reply = session.send(&msg).await?;
            helpers::print_response(&reply.text, &reply.model);
        }
        None => {
            // Interactive REPL mode
            repl::run(session).await?;
        }
    }

    Ok(())
}

/// Initialize tracing/logging.
///
/// `--logs` forces debug output for the workspace crates; otherwise
/// `RUST_LOG` wins, falling back to `default`.
fn init_logging(verbose: bool, default: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("chatrelay=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
