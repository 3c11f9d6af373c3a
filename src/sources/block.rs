//! Instruction text extraction from generator source files.
//!
//! Generator scripts keep their system prompt as a parenthesized run of
//! adjacent string literals:
//!
//! ```text
//! SYSTEM_INSTRUCTIONS = (
//!     "You write three questions. "
//!     "Each question has four choices."  # comment
//! )
//! ```
//!
//! The literals are decoded and concatenated without separators. Triple
//! quotes and the `r`/`u`/`f`/`b` prefixes are understood; a block that
//! mixes in names or calls is treated as absent.

use crate::config::InstructionFormat;
use crate::error::DigestError;
use crate::models::TypeLabel;
use regex::Regex;

/// Get the instruction text of one source file.
pub fn instruction_text(
    content: &str,
    format: InstructionFormat,
    block_name: &str,
    label: &TypeLabel,
) -> Result<String, DigestError> {
    match format {
        InstructionFormat::Plain => Ok(content.trim().to_string()),
        InstructionFormat::Python => {
            extract_assigned_literals(content, block_name).ok_or_else(|| {
                DigestError::MissingInstructionBlock {
                    label: label.to_string(),
                    block: block_name.to_string(),
                }
            })
        }
    }
}

/// Find `NAME = (` and return the concatenated string literals up to the
/// matching `)`. Returns `None` when the assignment is absent, unterminated,
/// or holds anything other than string literals.
pub fn extract_assigned_literals(source: &str, name: &str) -> Option<String> {
    let pattern = format!(r"\b{}\s*=\s*\(", regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    let start = re.find(source)?.end();
    read_literal_sequence(&source[start..])
}

fn read_literal_sequence(rest: &str) -> Option<String> {
    let mut text = String::new();
    let mut pos = 0;

    while let Some(c) = rest[pos..].chars().next() {
        match c {
            ')' => return Some(text),
            '"' | '\'' => pos = read_literal(rest, pos, false, &mut text)?,
            '#' => pos += rest[pos..].find('\n').unwrap_or(rest.len() - pos),
            c if c.is_alphabetic() || c == '_' => {
                let word_len = rest[pos..]
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len() - pos);
                let prefix = &rest[pos..pos + word_len];
                let quoted = matches!(rest[pos + word_len..].chars().next(), Some('"' | '\''));

                // A name or call inside the block cannot be resolved statically.
                if !quoted || !is_string_prefix(prefix) {
                    return None;
                }
                let raw = prefix.contains(['r', 'R']);
                pos = read_literal(rest, pos + word_len, raw, &mut text)?;
            }
            c => pos += c.len_utf8(),
        }
    }

    None
}

fn is_string_prefix(prefix: &str) -> bool {
    matches!(
        prefix.to_ascii_lowercase().as_str(),
        "r" | "u" | "f" | "b" | "rb" | "br" | "fr" | "rf"
    )
}

/// Decode the literal whose opening quote is at `start` and return the
/// position just past its closing quote.
fn read_literal(rest: &str, start: usize, raw: bool, out: &mut String) -> Option<usize> {
    let quote = rest[start..].chars().next()?;
    let triple = if quote == '"' { "\"\"\"" } else { "'''" };
    let delim = if rest[start..].starts_with(triple) {
        triple
    } else {
        &rest[start..start + 1]
    };
    let mut pos = start + delim.len();

    loop {
        let tail = &rest[pos..];
        if tail.starts_with(delim) {
            return Some(pos + delim.len());
        }

        let mut chars = tail.chars();
        let c = chars.next()?;
        // single-quoted literals end at the line
        if c == '\n' && delim.len() == 1 {
            return None;
        }
        if c != '\\' {
            out.push(c);
            pos += c.len_utf8();
            continue;
        }

        let escaped = chars.next()?;
        pos += 1 + escaped.len_utf8();
        if raw {
            out.push('\\');
            out.push(escaped);
            continue;
        }
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            // line continuation inside the literal
            '\n' => {}
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
}
