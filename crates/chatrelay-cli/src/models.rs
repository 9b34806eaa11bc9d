//! `chatrelay models` — print the chat model catalog.

use anyhow::{Context, Result};
use colored::Colorize;

use chatrelay_core::config::Config;
use chatrelay_providers::{ModelFamily, ModelRegistry, ProviderSet};

pub fn run(config: &Config) -> Result<()> {
    let registry = ModelRegistry::from_config(config).context("invalid model configuration")?;
    // Adapters are only built to read credential status.
    let providers = ProviderSet::from_config(&config.providers, &Default::default());
    let default_id = registry.default_model().client_id.clone();

    println!();
    println!(
        "{}  {}",
        "💬 Chatrelay Models".cyan().bold(),
        format!("({} total)", registry.len()).dimmed()
    );
    println!();
    println!(
        "  {:<24} {:<30} {:<10} {}",
        "ID".bold(),
        "NAME".bold(),
        "FAMILY".bold(),
        "BACKEND".bold()
    );

    for model in registry.all() {
        let marker = if model.client_id == default_id { "*" } else { " " };
        let backend = if providers.is_available(model.backend) {
            model.backend.as_str().green().to_string()
        } else {
            format!("{} (no key)", model.backend.as_str()).dimmed().to_string()
        };
        println!(
            "{} {:<24} {:<30} {:<10} {}",
            marker,
            model.client_id,
            model.display_name,
            family_label(&model.family),
            backend
        );
    }

    println!();
    println!("  {}", "* default model".dimmed());
    println!();
    Ok(())
}

fn family_label(family: &ModelFamily) -> String {
    match family {
        ModelFamily::Other(name) => name.clone(),
        known => format!("{known:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_labels() {
        assert_eq!(family_label(&ModelFamily::OpenAI), "OpenAI");
        assert_eq!(family_label(&ModelFamily::Other("DeepSeek".into())), "DeepSeek");
    }
}
