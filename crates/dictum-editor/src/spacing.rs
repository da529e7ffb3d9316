//! Spacing Normalizer.
//!
//! Decides how a fragment meets its neighbors. Rules only look at the one
//! character on each side of the boundary; text deeper inside either
//! context is never touched.

use regex::Regex;

/// Characters that attach to the word on their left.
pub const CLOSING_PUNCTUATION: &[char] = &[')', ',', '.', ';', ':', '!', '?', '%'];

/// Characters that glue two words together without spaces.
pub const JOINERS: &[char] = &['/', '-'];

/// Fragment text after normalization, plus the single boundary spaces in the
/// surrounding context that must be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    /// Remove the one space immediately left of the insertion point.
    pub consume_left: bool,
    /// Remove the one space immediately right of the insertion point.
    pub consume_right: bool,
}

impl Normalized {
    fn verbatim(text: &str) -> Self {
        Self {
            text: text.to_string(),
            consume_left: false,
            consume_right: false,
        }
    }
}

/// Literal fragments that become line breaks and skip every spacing rule.
pub fn is_line_break_literal(fragment: &str) -> bool {
    fragment == "\n" || fragment == "\n\n"
}

fn is_closing(c: char) -> bool {
    CLOSING_PUNCTUATION.contains(&c)
}

fn is_joiner(c: char) -> bool {
    JOINERS.contains(&c)
}

/// Compiled punctuation-tightening patterns.
pub struct SpacingNormalizer {
    space_before_closing: Regex,
    space_after_open: Regex,
}

impl Default for SpacingNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpacingNormalizer {
    pub fn new() -> Self {
        Self {
            space_before_closing: Regex::new(r" +([,.;:!?%)])")
                .expect("Invalid closing punctuation regex"),
            space_after_open: Regex::new(r"\( +").expect("Invalid open paren regex"),
        }
    }

    /// Collapse "word , word" into "word, word" and "( word" into "(word"
    /// inside the fragment itself.
    pub fn tighten(&self, fragment: &str) -> String {
        let tightened = self.space_before_closing.replace_all(fragment, "$1");
        self.space_after_open
            .replace_all(&tightened, "(")
            .into_owned()
    }

    /// Normalize `fragment` for insertion between `left` and `right`.
    pub fn normalize(&self, left: &str, fragment: &str, right: &str) -> Normalized {
        if is_line_break_literal(fragment) || fragment.is_empty() {
            return Normalized::verbatim(fragment);
        }

        let mut text = self.tighten(fragment);
        let mut consume_left = false;
        let mut consume_right = false;

        let left_last = left.chars().last();
        let right_first = right.chars().next();

        // Left boundary.
        if let (Some(l), Some(f)) = (left_last, text.chars().next()) {
            if l == ' ' && (f == ' ' || is_joiner(f) || is_closing(f)) {
                if f == ' ' {
                    text.remove(0);
                } else {
                    consume_left = true;
                }
            } else if (l.is_alphanumeric() || is_closing(l)) && f.is_alphanumeric() {
                text.insert(0, ' ');
            }
        }

        // Right boundary.
        if let (Some(f), Some(r)) = (text.chars().last(), right_first) {
            if f == ' ' && (r == ' ' || is_closing(r)) {
                text.pop();
            } else if is_joiner(f) && r == ' ' {
                consume_right = true;
            } else if (f.is_alphanumeric() || is_closing(f)) && r.is_alphanumeric() {
                text.push(' ');
            }
        }

        Normalized {
            text,
            consume_left,
            consume_right,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(left: &str, fragment: &str, right: &str) -> Normalized {
        SpacingNormalizer::new().normalize(left, fragment, right)
    }

    #[test]
    fn test_spaces_both_sides_between_words() {
        let n = norm("hello", "test", "world");
        assert_eq!(n.text, " test ");
        assert!(!n.consume_left);
        assert!(!n.consume_right);
    }

    #[test]
    fn test_existing_spaces_are_respected() {
        assert_eq!(norm("start ", "center", " end").text, "center");
    }

    #[test]
    fn test_internal_punctuation_tightening() {
        assert_eq!(
            norm("", "mild , diffuse ( chronic ) change .", "").text,
            "mild, diffuse (chronic) change."
        );
    }

    #[test]
    fn test_leading_joiner_consumes_left_space() {
        let n = norm("low grade ", "/intermediate", " lesion");
        assert_eq!(n.text, "/intermediate");
        assert!(n.consume_left);
        assert!(!n.consume_right);
    }

    #[test]
    fn test_joiner_after_word_gets_no_space() {
        let n = norm("low grade", "/intermediate", "");
        assert_eq!(n.text, "/intermediate");
        assert!(!n.consume_left);
    }

    #[test]
    fn test_trailing_joiner_consumes_right_space() {
        let n = norm("", "low-", " grade");
        assert_eq!(n.text, "low-");
        assert!(n.consume_right);
    }

    #[test]
    fn test_trailing_space_stripped_before_closing_punctuation() {
        assert_eq!(norm("", "normal ", ", stable").text, "normal");
        assert_eq!(norm("", "normal ", ")").text, "normal");
    }

    #[test]
    fn test_leading_punctuation_consumes_left_space() {
        let n = norm("normal ", ".", "");
        assert_eq!(n.text, ".");
        assert!(n.consume_left);
    }

    #[test]
    fn test_double_spaces_are_avoided() {
        assert_eq!(norm("a ", " b ", " c").text, "b");
    }

    #[test]
    fn test_word_after_sentence_punctuation_gets_space() {
        assert_eq!(norm("Normal.", "No mass", "").text, " No mass");
    }

    #[test]
    fn test_line_break_literals_bypass() {
        assert_eq!(norm("word", "\n", "word").text, "\n");
        assert_eq!(norm("word", "\n\n", "word").text, "\n\n");
    }

    #[test]
    fn test_empty_contexts() {
        assert_eq!(norm("", "text", "").text, "text");
        assert_eq!(norm("", "", "").text, "");
    }

    #[test]
    fn test_only_boundary_characters_are_considered() {
        // Deep context whitespace and punctuation must not matter.
        let n = norm("x ,  y", "z", "w  ,  v");
        assert_eq!(n.text, " z ");
    }
}
