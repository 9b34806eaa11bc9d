//! Shared CLI helpers — path expansion, response printing, banners.

use std::path::PathBuf;

use colored::Colorize;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a model reply to stdout.
pub fn print_response(response: &str, model: &str) {
    println!();
    println!("{} {}", "💬 Chatrelay".cyan().bold(), format!("({model})").dimmed());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner(model: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!(
        "{}  v{}  {}",
        "💬 Chatrelay".cyan().bold(),
        version.dimmed(),
        format!("model: {model}").dimmed()
    );
    println!(
        "{}",
        "Type a message, \"/clear\" to start over, or \"exit\" to quit.".dimmed()
    );
    println!();
}

pub fn print_notice(text: &str) {
    println!("{}", format!("  · {text}").dimmed());
}

/// Print a "thinking" spinner placeholder (for non-log mode).
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// `✓` / `·` marker used by `status` and `models`.
pub fn check_mark(ok: bool, yes: &str, no: &str) -> String {
    if ok {
        format!("{} {}", "✓".green(), yes)
    } else {
        format!("{}", format!("· {no}").dimmed())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
