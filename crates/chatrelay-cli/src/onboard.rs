//! `chatrelay onboard` — write a default config file.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use chatrelay_core::config::{get_config_path, save_config, Config};
use chatrelay_providers::registry::PROVIDERS;

/// Run the onboard command.
pub fn run(path: Option<&Path>) -> Result<()> {
    println!();
    println!("{}", "💬 Chatrelay — Setup".cyan().bold());
    println!();

    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);
    let created = write_default_config(&config_path)?;
    if created {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }

    println!();
    println!("  Add at least one API key to the config, or export:");
    for spec in PROVIDERS {
        println!("    {}", spec.env_key.dimmed());
    }
    println!();
    println!(
        "{}",
        "  Setup complete! Run `chatrelay serve` to start the server.".green()
    );
    println!();

    Ok(())
}

/// Write defaults to `path` unless a file is already there.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::config::load_config;

    #[test]
    fn writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert!(write_default_config(&path).unwrap());
        let config = load_config(Some(&path));
        assert_eq!(config.chat.default_model, "gpt-oss-20b");

        // Should NOT overwrite
        std::fs::write(&path, "{\"server\":{\"port\":8080}}").unwrap();
        assert!(!write_default_config(&path).unwrap());
        assert!(std::fs::read_to_string(&path).unwrap().contains("8080"));
    }
}
