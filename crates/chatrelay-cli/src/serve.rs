//! `chatrelay serve` — build the shared state and run the HTTP proxy.
//!
//! Startup sequence:
//! 1. Build model registry + provider adapters from config
//! 2. Ensure the static directory exists
//! 3. Print a summary
//! 4. Serve until Ctrl+C

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{info, warn};

use chatrelay_core::config::Config;
use chatrelay_proxy::AppState;

use crate::helpers;

pub async fn run(config: Config) -> Result<()> {
    let state = AppState::from_config(&config).context("invalid model configuration")?;

    std::fs::create_dir_all(&state.static_dir).with_context(|| {
        format!("failed to create static dir: {}", state.static_dir.display())
    })?;

    let addr = format!("{}:{}", config.server.host, config.server.port);

    println!();
    println!(
        "{}  v{}",
        "💬 Chatrelay".cyan().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!();
    println!("  {:<16} http://{}", "Listening:".bold(), addr);
    println!("  {:<16} {}", "Static dir:".bold(), state.static_dir.display());
    println!(
        "  {:<16} {} ({} models)",
        "Default model:".bold(),
        state.registry.default_model().client_id,
        state.registry.len()
    );
    println!(
        "  {:<16} {}",
        "Fallbacks:".bold(),
        config.chat.fallback_models.join(", ")
    );
    for (backend, ok) in state.providers.status() {
        println!(
            "  {:<16} {}",
            format!("{}:", backend.spec().display_name).bold(),
            helpers::check_mark(ok, "key set", "not configured")
        );
    }
    println!();
    println!("  Ctrl+C to stop");
    println!();

    if state.providers.status().iter().all(|(_, ok)| !ok) {
        warn!("no provider credentials configured; every chat request will fail");
    }

    info!(
        addr = %addr,
        default_model = %state.registry.default_model().client_id,
        "starting server"
    );
    chatrelay_proxy::serve(state.into_shared(), &addr).await?;

    println!("  Server stopped. Goodbye!");
    Ok(())
}
