//! Dictation script format.
//!
//! One step per line. Lines starting with `@` are directives, lines starting
//! with `#` are comments, blank lines are skipped, and anything else is a
//! dictated fragment. `\n` inside a fragment stands for a line break.
//!
//! ```text
//! @select 6 12
//! center
//! @blur
//! @replace-json {"nodes":[{"type":"text","text":"fresh"}]}
//! ```

use dictum_core::error::{DictumError, Result};
use dictum_core::types::FlatRange;
use dictum_editor::StructuredContent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Fragment(String),
    Select(FlatRange),
    Blur,
    Capture,
    Replace(StructuredContent),
}

/// Parse one script line. `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<Step>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let Some(directive) = trimmed.strip_prefix('@') else {
        return Ok(Some(Step::Fragment(unescape(line))));
    };

    let (name, rest) = directive
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((directive, ""));

    let step = match name {
        "select" => {
            let offsets: Vec<&str> = rest.split_whitespace().collect();
            match offsets.as_slice() {
                [start, end] => Step::Select(FlatRange::new(offset(start)?, offset(end)?)),
                _ => {
                    return Err(DictumError::Config(format!(
                        "@select expects two offsets, got '{}'",
                        rest
                    )))
                }
            }
        }
        "caret" => Step::Select(FlatRange::caret(offset(rest)?)),
        "blur" => Step::Blur,
        "capture" => Step::Capture,
        "replace" => Step::Replace(StructuredContent::from_plain_text(&unescape(rest))),
        "replace-json" => Step::Replace(serde_json::from_str(rest)?),
        other => {
            return Err(DictumError::Config(format!("Unknown directive: @{}", other)));
        }
    };
    Ok(Some(step))
}

fn offset(value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| DictumError::Config(format!("Invalid offset: '{}'", value)))
}

/// Turn the two-character sequence `\n` into a line break.
pub fn unescape(text: &str) -> String {
    text.replace("\\n", "\n")
}
