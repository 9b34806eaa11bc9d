//! Model output cleanup.
//!
//! Some models emit definition-list style lines (`: explanation`) that render
//! badly as Markdown. Those lines are turned into bullets; everything else
//! passes through untouched.

use std::sync::LazyLock;

use regex::Regex;

static LEADING_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:\s+").expect("valid regex"));

/// Rewrite standalone `: text` lines as `- text` bullets.
///
/// Pure and idempotent: a rewritten line starts with `- ` and no longer
/// matches.
pub fn clean(text: &str) -> String {
    text.split('\n')
        .map(clean_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn clean_line(line: &str) -> std::borrow::Cow<'_, str> {
    let body = line.trim_start();
    if !LEADING_COLON.is_match(body.trim_end()) {
        return line.into();
    }
    // Indentation goes along with the colon.
    LEADING_COLON.replace(body, "- ").into_owned().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colon_line_becomes_bullet() {
        assert_eq!(clean(": hello"), "- hello");
    }

    #[test]
    fn test_inline_colon_unchanged() {
        assert_eq!(clean("hello: world"), "hello: world");
    }

    #[test]
    fn test_multiline() {
        let input = "Rust\n: a systems language\n:  fast\nplain line";
        assert_eq!(clean(input), "Rust\n- a systems language\n- fast\nplain line");
    }

    #[test]
    fn test_indented_colon_line_starts_with_bullet() {
        assert_eq!(clean("   :\tindented"), "- indented");
        assert_eq!(clean("  : x"), "- x");
        assert_eq!(clean(&clean("  : x")), "- x");
    }

    #[test]
    fn test_bare_colon_unchanged() {
        // Trimmed form is just ":" with nothing after it.
        assert_eq!(clean(":"), ":");
        assert_eq!(clean(":   "), ":   ");
        assert_eq!(clean(":no-space"), ":no-space");
    }

    #[test]
    fn test_empty_and_blank_lines() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("\n\n"), "\n\n");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            ": hello",
            "a\n: b\n  :  c\n:\nd: e",
            "- already a bullet",
            ": : nested colon",
            "\r\n: windows line\r\n",
            "::  double",
        ];
        for s in samples {
            let once = clean(s);
            assert_eq!(clean(&once), once, "not idempotent for {s:?}");
        }
    }
}
