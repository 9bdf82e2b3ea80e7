//! Log sanitizing for player-supplied text (ids, display names, shop replies).
//! Keeps every log record on a single line.

use std::fmt::Write;

/// Longest preview of a player string that reaches the log.
pub const LOG_PREVIEW_CHARS: usize = 120;

/// Escape `s` for a single-line log record, capped at [`LOG_PREVIEW_CHARS`].
pub fn escape_log(s: &str) -> String {
    escape_log_limited(s, LOG_PREVIEW_CHARS)
}

/// Escape line breaks, tabs, backslashes and other control characters
/// (as `\xNN`), appending `…` when `s` is longer than `limit` characters.
pub fn escape_log_limited(s: &str, limit: usize) -> String {
    let mut out = String::with_capacity(s.len().min(limit) + 4);
    for (n, ch) in s.chars().enumerate() {
        if n == limit {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forged_log_lines_stay_inline() {
        assert_eq!(
            escape_log("bob\n[INFO] admin logged in"),
            "bob\\n[INFO] admin logged in"
        );
        assert_eq!(escape_log("a\tb\\c\u{7}"), "a\\tb\\\\c\\x07");
    }

    #[test]
    fn long_names_are_cut() {
        assert_eq!(escape_log_limited("Health Potion", 6), "Health…");
        assert_eq!(escape_log_limited("Orc", 3), "Orc");
        assert_eq!(escape_log(&"x".repeat(500)).chars().count(), LOG_PREVIEW_CHARS + 1);
    }
}
