//! Keep user-typed text on one log line.

use std::fmt::Write;

/// Longest input preview written to a log line.
pub const LOG_PREVIEW_CHARS: usize = 200;

/// Escape control characters (newlines, carriage returns, tabs, terminal escapes) and
/// cut the text at [`LOG_PREVIEW_CHARS`] characters.
pub fn escape_log(s: &str) -> String {
    escape_log_with(s, LOG_PREVIEW_CHARS)
}

pub fn escape_log_with(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= max_chars {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x1b' => out.push_str("\\e"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
