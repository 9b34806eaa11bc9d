//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing. Line history is kept for the
//! session only; nothing is written to disk.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use chatrelay_core::utils::truncate_string;

use crate::ask::ChatSession;
use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Clears the conversation without leaving.
const CLEAR_COMMANDS: &[&str] = &["/clear", "/new"];

/// Run the interactive REPL loop.
pub async fn run(mut session: ChatSession) -> Result<()> {
    helpers::print_banner(session.model_id());

    let mut editor = create_editor()?;

    loop {
        // Read input
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Ctrl-C — exit cleanly
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                // Ctrl-D — exit cleanly
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if matches_command(trimmed, EXIT_COMMANDS) {
            println!("\nGoodbye! 👋");
            break;
        }
        if matches_command(trimmed, CLEAR_COMMANDS) {
            session.clear();
            helpers::print_notice("conversation cleared");
            continue;
        }

        let _ = editor.add_history_entry(&input);

        debug!(
            turns = session.turns(),
            input = %truncate_string(trimmed, 80),
            "processing input"
        );
        helpers::print_thinking();

        match session.send(trimmed).await {
            Ok(reply) => {
                helpers::clear_thinking();
                helpers::print_response(&reply.text, &reply.model);
            }
            Err(e) => {
                helpers::clear_thinking();
                eprintln!("\n❌ Error: {e}\n");
            }
        }
    }

    Ok(())
}

/// Create a rustyline editor with in-memory history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;
    Ok(editor)
}

/// Case-insensitive match against a command list.
fn matches_command(input: &str, commands: &[&str]) -> bool {
    let lower = input.to_lowercase();
    commands.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert!(matches_command("exit", EXIT_COMMANDS));
        assert!(matches_command("EXIT", EXIT_COMMANDS));
        assert!(matches_command("/quit", EXIT_COMMANDS));
        assert!(matches_command(":q", EXIT_COMMANDS));
        assert!(!matches_command("hello", EXIT_COMMANDS));
        assert!(!matches_command("", EXIT_COMMANDS));
    }

    #[test]
    fn clear_commands() {
        assert!(matches_command("/clear", CLEAR_COMMANDS));
        assert!(matches_command("/NEW", CLEAR_COMMANDS));
        assert!(!matches_command("clear", CLEAR_COMMANDS));
    }
}
