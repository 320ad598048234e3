//! Text codec for `index.txt` content files.
//!
//! # Format
//!
//! ```text
//! type: Film
//!
//! ----
//!
//! title: National Youth Orchestra
//!
//! ----
//!
//! description:
//!
//! A value may span
//! several lines.
//! ```
//!
//! Blocks are separated by lines consisting of `----`. Each block starts with
//! `key:`; everything after the colon, including the following lines, is the
//! value. Values are trimmed. Value lines that would read as a separator are
//! escaped with a leading `\`.

use super::Fields;

const SEPARATOR: &str = "----";

/// Parse a content file. Blocks without a `key:` header are ignored.
pub fn parse(text: &str) -> Fields {
    let mut fields = Fields::new();
    let mut block: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim_end() == SEPARATOR {
            parse_block(&block, &mut fields);
            block.clear();
        } else {
            block.push(line);
        }
    }
    parse_block(&block, &mut fields);

    fields
}

fn parse_block(lines: &[&str], fields: &mut Fields) {
    let mut lines = lines.iter().skip_while(|line| line.trim().is_empty());
    let Some(header) = lines.next() else {
        return;
    };
    let Some((key, first)) = header.split_once(':') else {
        return;
    };
    let key = key.trim();
    if key.is_empty() {
        return;
    }

    let value = std::iter::once(first.trim_start())
        .chain(lines.copied())
        .map(unescape_line)
        .collect::<Vec<_>>()
        .join("\n");
    fields.set(key, value.trim());
}

/// Serialize fields in order. Keys keep their case.
pub fn stringify(fields: &Fields) -> String {
    let blocks: Vec<String> = fields
        .iter()
        .map(|(key, value)| {
            let value = value.trim();
            if value.is_empty() {
                format!("{key}:")
            } else if value.contains('\n') {
                let escaped: Vec<_> = value.lines().map(escape_line).collect();
                format!("{key}:\n\n{}", escaped.join("\n"))
            } else {
                format!("{key}: {}", escape_line(value))
            }
        })
        .collect();

    let mut out = blocks.join(&format!("\n\n{SEPARATOR}\n\n"));
    out.push('\n');
    out
}

/// Whether a line (ignoring existing escapes) would be read as a separator.
fn looks_like_separator(line: &str) -> bool {
    line.trim_start_matches('\\').starts_with(SEPARATOR)
}

fn escape_line(line: &str) -> String {
    if looks_like_separator(line) {
        format!("\\{line}")
    } else {
        line.to_owned()
    }
}

fn unescape_line(line: &str) -> &str {
    match line.strip_prefix('\\') {
        Some(rest) if looks_like_separator(rest) => rest,
        _ => line,
    }
}
