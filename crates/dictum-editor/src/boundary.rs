//! Word-Boundary Expander.
//!
//! A selection that starts or ends in the middle of a word is widened to
//! cover the whole word, so replacing "te" inside "intermediate" replaces
//! "intermediate". Carets are never expanded.

use dictum_core::types::FlatRange;

use crate::document::Document;

/// Letters, digits, underscore, apostrophe, and a hyphen with word
/// characters on both sides.
fn is_word_char(chars: &[char], i: usize) -> bool {
    match chars.get(i) {
        Some(c) if c.is_alphanumeric() || *c == '_' || *c == '\'' => true,
        Some('-') => {
            i > 0
                && chars.get(i - 1).is_some_and(|c| c.is_alphanumeric())
                && chars.get(i + 1).is_some_and(|c| c.is_alphanumeric())
        }
        _ => false,
    }
}

/// Widen `range` over `text` to whole-word boundaries.
///
/// Each side moves only when the range edge cuts through a word, i.e. the
/// characters on both sides of the edge are word characters.
pub fn expand_text(text: &str, range: FlatRange) -> FlatRange {
    if range.is_collapsed() {
        return range;
    }
    let chars: Vec<char> = text.chars().collect();
    let range = range.clamp_to(chars.len());
    let mut start = range.start;
    let mut end = range.end;

    if start > 0 && is_word_char(&chars, start - 1) && is_word_char(&chars, start) {
        while start > 0 && is_word_char(&chars, start - 1) {
            start -= 1;
        }
    }
    if end < chars.len() && is_word_char(&chars, end - 1) && is_word_char(&chars, end) {
        while end < chars.len() && is_word_char(&chars, end) {
            end += 1;
        }
    }

    FlatRange::new(start, end)
}

/// Widen `range` against the document's flat text.
pub fn expand(doc: &Document, range: FlatRange) -> FlatRange {
    if range.is_collapsed() {
        return range;
    }
    expand_text(&doc.flat_text(), range)
}
