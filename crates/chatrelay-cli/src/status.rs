//! `chatrelay status` — show configuration and provider status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use chatrelay_core::config::{get_config_path, load_config};
use chatrelay_providers::registry::PROVIDERS;

use crate::helpers::check_mark;

/// Run the status command.
pub fn run(path: Option<&Path>) -> Result<()> {
    let config = load_config(path);
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

    println!();
    println!("{}", "💬 Chatrelay Status".cyan().bold());
    println!();

    // Config
    let config_exists = config_path.exists();
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );

    println!(
        "  {:<18} {}:{}",
        "Listen:".bold(),
        config.server.host,
        config.server.port
    );
    println!("  {:<18} {}", "Static dir:".bold(), config.server.static_dir);

    // Chat
    println!("  {:<18} {}", "Default model:".bold(), config.chat.default_model);
    println!(
        "  {:<18} {}",
        "Fallbacks:".bold(),
        config.chat.fallback_models.join(", ").dimmed()
    );
    println!(
        "  {:<18} {}",
        "Attempt timeout:".bold(),
        match config.chat.attempt_timeout_secs {
            0 => "off".to_string(),
            secs => format!("{secs}s"),
        }
    );
    println!(
        "  {:<18} {}",
        "Model table:".bold(),
        if config.models.is_empty() {
            "built-in".to_string()
        } else {
            format!("{} entries from config", config.models.len())
        }
    );

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let configured = config
            .providers
            .get_by_name(spec.name)
            .is_some_and(|p| p.is_configured());
        println!(
            "    {:<20} {}",
            spec.display_name,
            check_mark(configured, "(key set)", &format!("not configured ({})", spec.env_key))
        );
    }

    println!();

    Ok(())
}
