//! YAML writer that keeps `config/project.yaml` friendly to yamllint
//!
//! Output starts with `---`, indents by four spaces and writes every single-line
//! string as a folded block scalar (`>-`) wrapped at word boundaries, so long prose
//! stays under the line-length limit. Wrapping is lossless: folded line breaks read
//! back as the single spaces they replaced. Strings that cannot be folded that way
//! (empty, multi-line, repeated or surrounding whitespace) are double-quoted.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

const INDENT: usize = 4;
const MAX_LINE: usize = 78;
const MIN_WRAP: usize = 40;

/// Serialize `value` as a yamllint-friendly document.
///
/// # Errors
///
/// Returns `serde_yaml::Error` if `value` cannot be represented as YAML.
pub fn to_string<T: Serialize>(value: &T) -> Result<String, serde_yaml::Error> {
    let value = serde_yaml::to_value(value)?;
    let mut out = String::from("---\n");
    match &value {
        Value::Mapping(map) if !map.is_empty() => write_mapping(&mut out, map, 0, false),
        Value::Sequence(seq) if !seq.is_empty() => write_sequence(&mut out, seq, 0),
        other => {
            out.push_str(&inline_scalar(other));
            out.push('\n');
        }
    }
    Ok(out)
}

fn pad(out: &mut String, col: usize) {
    out.extend(std::iter::repeat_n(' ', col));
}

fn write_mapping(out: &mut String, map: &Mapping, col: usize, first_inline: bool) {
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 || !first_inline {
            pad(out, col);
        }
        out.push_str(&render_key(key));
        out.push(':');
        write_node(out, value, col);
    }
}

fn write_sequence(out: &mut String, seq: &[Value], col: usize) {
    for item in seq {
        pad(out, col);
        out.push('-');
        match item {
            Value::Mapping(map) if !map.is_empty() => {
                out.push(' ');
                write_mapping(out, map, col + 2, true);
            }
            other => write_node(out, other, col),
        }
    }
}

/// Write a value that follows a `key:` or `-` indicator sitting at `col`.
fn write_node(out: &mut String, value: &Value, col: usize) {
    match value {
        Value::Mapping(map) if !map.is_empty() => {
            out.push('\n');
            write_mapping(out, map, col + INDENT, false);
        }
        Value::Sequence(seq) if !seq.is_empty() => {
            out.push('\n');
            write_sequence(out, seq, col + INDENT);
        }
        Value::String(s) if is_foldable(s) => write_folded(out, s, col + INDENT),
        Value::Tagged(tagged) => write_node(out, &tagged.value, col),
        other => {
            out.push(' ');
            out.push_str(&inline_scalar(other));
            out.push('\n');
        }
    }
}

fn write_folded(out: &mut String, s: &str, content_col: usize) {
    out.push_str(" >-\n");
    let width = MAX_LINE.saturating_sub(content_col).max(MIN_WRAP);
    for line in wrap_words(s, width) {
        pad(out, content_col);
        out.push_str(&line);
        out.push('\n');
    }
}

fn is_foldable(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(' ')
        && !s.ends_with(' ')
        && !s.contains("  ")
        && !s.chars().any(needs_escape)
}

/// Characters YAML reads as line breaks or refuses to print raw.
fn needs_escape(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{fffe}' | '\u{ffff}')
}

/// Greedy word wrap counting characters, not bytes. Words longer than `width`
/// get a line of their own.
#[must_use]
pub fn wrap_words(s: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in s.split(' ') {
        let len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = len;
        } else if current_len + 1 + len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn render_key(key: &Value) -> String {
    match key {
        Value::String(s)
            if s.starts_with(|c: char| c.is_ascii_alphabetic())
                && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
        {
            s.clone()
        }
        other => inline_scalar(other),
    }
}

fn inline_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Sequence(_) => "[]".to_string(),
        Value::Mapping(_) => "{}".to_string(),
        Value::Tagged(tagged) => inline_scalar(&tagged.value),
    }
}

/// Double-quoted scalar using the escapes YAML shares with JSON.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if needs_escape(c) => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
