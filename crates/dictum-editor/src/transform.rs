//! Pure text pre-pass applied to dictated fragments before insertion.
//!
//! Runs in order: number words, spoken joiners, capitalization. None of the
//! passes look at the document beyond the left context needed to decide
//! whether the fragment starts a sentence.

use dictum_core::config::EditorConfig;
use regex::{Captures, Regex};

/// Which passes run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepassOptions {
    pub spoken_joiners: bool,
    pub expand_numbers: bool,
    pub auto_capitalize: bool,
}

impl Default for PrepassOptions {
    fn default() -> Self {
        Self {
            spoken_joiners: true,
            expand_numbers: true,
            auto_capitalize: true,
        }
    }
}

impl From<&EditorConfig> for PrepassOptions {
    fn from(config: &EditorConfig) -> Self {
        Self {
            spoken_joiners: config.spoken_joiners,
            expand_numbers: config.expand_numbers,
            auto_capitalize: config.auto_capitalize,
        }
    }
}

/// Compiled patterns for the pre-pass, built once per surface.
pub struct TextPrepass {
    options: PrepassOptions,
    slash: Regex,
    hyphen: Regex,
    sentence_break: Regex,
}

impl TextPrepass {
    pub fn new(options: PrepassOptions) -> Self {
        Self {
            options,
            slash: Regex::new(r"(?i)\s*\bslash\b\s*").expect("Invalid slash regex"),
            hyphen: Regex::new(r"(?i)\s*\b(?:hyphen|dash)\b\s*").expect("Invalid hyphen regex"),
            sentence_break: Regex::new(r"([.!?]\s+)(\p{Ll})").expect("Invalid sentence regex"),
        }
    }

    /// Run every enabled pass over `fragment`.
    pub fn prepare(&self, fragment: &str, left_context: &str) -> String {
        let mut text = fragment.to_string();
        if self.options.expand_numbers {
            text = expand_number_words(&text);
        }
        if self.options.spoken_joiners {
            text = self.apply_spoken_joiners(&text);
        }
        if self.options.auto_capitalize {
            text = self.capitalize(&text, left_context);
        }
        text
    }

    /// "low grade slash intermediate" -> "low grade/intermediate".
    pub fn apply_spoken_joiners(&self, text: &str) -> String {
        let text = self.slash.replace_all(text, "/");
        self.hyphen.replace_all(&text, "-").into_owned()
    }

    /// Capitalize the first letter when the fragment starts a sentence, and
    /// every letter that follows terminal punctuation inside the fragment.
    pub fn capitalize(&self, text: &str, left_context: &str) -> String {
        let mut out = self
            .sentence_break
            .replace_all(text, |caps: &Captures<'_>| {
                format!("{}{}", &caps[1], caps[2].to_uppercase())
            })
            .into_owned();

        if starts_sentence(left_context) {
            if let Some((i, c)) = out.char_indices().find(|(_, c)| !c.is_whitespace()) {
                if c.is_lowercase() {
                    let upper: String = c.to_uppercase().collect();
                    out.replace_range(i..i + c.len_utf8(), &upper);
                }
            }
        }
        out
    }
}

impl Default for TextPrepass {
    fn default() -> Self {
        Self::new(PrepassOptions::default())
    }
}

/// Whether text inserted after `left_context` begins a new sentence.
pub fn starts_sentence(left_context: &str) -> bool {
    let trimmed = left_context.trim_end_matches([' ', '\t']);
    if trimmed.is_empty() || trimmed.ends_with('\n') {
        return true;
    }
    trimmed.ends_with(['.', '!', '?'])
}

// =============================================================================
// Number words
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberWord {
    Unit(u64),
    Teen(u64),
    Tens(u64),
    Hundred,
    Thousand,
    Point,
    And,
}

fn classify(word: &str) -> Option<NumberWord> {
    let word = word.to_lowercase();
    let value = match word.as_str() {
        "zero" => return Some(NumberWord::Unit(0)),
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => return Some(NumberWord::Teen(10)),
        "eleven" => return Some(NumberWord::Teen(11)),
        "twelve" => return Some(NumberWord::Teen(12)),
        "thirteen" => return Some(NumberWord::Teen(13)),
        "fourteen" => return Some(NumberWord::Teen(14)),
        "fifteen" => return Some(NumberWord::Teen(15)),
        "sixteen" => return Some(NumberWord::Teen(16)),
        "seventeen" => return Some(NumberWord::Teen(17)),
        "eighteen" => return Some(NumberWord::Teen(18)),
        "nineteen" => return Some(NumberWord::Teen(19)),
        "twenty" => return Some(NumberWord::Tens(20)),
        "thirty" => return Some(NumberWord::Tens(30)),
        "forty" => return Some(NumberWord::Tens(40)),
        "fifty" => return Some(NumberWord::Tens(50)),
        "sixty" => return Some(NumberWord::Tens(60)),
        "seventy" => return Some(NumberWord::Tens(70)),
        "eighty" => return Some(NumberWord::Tens(80)),
        "ninety" => return Some(NumberWord::Tens(90)),
        "hundred" => return Some(NumberWord::Hundred),
        "thousand" => return Some(NumberWord::Thousand),
        "point" => return Some(NumberWord::Point),
        "and" => return Some(NumberWord::And),
        _ => return None,
    };
    Some(NumberWord::Unit(value))
}

/// One word of a line, with trailing punctuation split off.
///
/// `span` indexes the whitespace-free run of text the token came from.
/// Hyphenated compounds yield several tokens with the same span.
#[derive(Debug, Clone)]
struct Token {
    core: String,
    suffix: String,
    word: Option<NumberWord>,
    span: usize,
}

impl Token {
    fn new(raw: &str, span: usize) -> Self {
        let core = raw.trim_end_matches([',', '.', ';', ':', '!', '?']);
        let suffix = raw[core.len()..].to_string();
        Self {
            core: core.to_string(),
            suffix,
            word: classify(core),
            span,
        }
    }
}

/// Byte ranges of the whitespace-free runs in `line`.
fn word_spans(line: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, line.len()));
    }
    spans
}

fn tokenize(line: &str, spans: &[(usize, usize)]) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (index, &(start, end)) in spans.iter().enumerate() {
        let token = Token::new(&line[start..end], index);
        // "twenty-one" becomes two tokens when every part is a number word.
        let parts: Vec<&str> = token.core.split('-').collect();
        if parts.len() > 1 && parts.iter().all(|p| classify(p).is_some()) {
            let last = parts.len() - 1;
            for (i, part) in parts.iter().enumerate() {
                tokens.push(Token {
                    core: part.to_string(),
                    suffix: if i == last {
                        token.suffix.clone()
                    } else {
                        String::new()
                    },
                    word: classify(part),
                    span: index,
                });
            }
        } else {
            tokens.push(token);
        }
    }
    tokens
}

/// Parse the longest number at the head of `tokens`.
///
/// Returns the rendered digits, the trailing punctuation of the last token
/// consumed, and how many tokens were consumed. Each multiplier is accepted
/// at most once per scale, so "nine hundred nine hundred" ends after the
/// first "nine" and arithmetic stays bounded.
fn parse_number(tokens: &[Token]) -> Option<(String, String, usize)> {
    use NumberWord::*;

    let first = tokens.first()?.word?;
    if !matches!(first, Unit(_) | Teen(_) | Tens(_)) {
        return None;
    }

    let mut total = 0u64;
    let mut current = 0u64;
    let mut seen_thousand = false;
    let mut last: Option<NumberWord> = None;
    let mut consumed = 0;
    let mut decimals = String::new();

    while let Some(token) = tokens.get(consumed) {
        let Some(word) = token.word else { break };
        let next = tokens.get(consumed + 1).and_then(|t| t.word);
        let accepted = match (last, word) {
            (None, Unit(v) | Teen(v) | Tens(v)) => {
                current = v;
                true
            }
            (Some(Tens(_)), Unit(v)) if v > 0 => add_to(&mut current, v),
            (Some(Unit(_) | Teen(_) | Tens(_)), Hundred) if current < 100 => {
                match current.checked_mul(100) {
                    Some(value) => {
                        current = value;
                        true
                    }
                    None => false,
                }
            }
            (Some(Unit(_) | Teen(_) | Tens(_) | Hundred), Thousand) if !seen_thousand => {
                match current.checked_mul(1000).and_then(|v| total.checked_add(v)) {
                    Some(value) => {
                        total = value;
                        current = 0;
                        seen_thousand = true;
                        true
                    }
                    None => false,
                }
            }
            (Some(Hundred | Thousand | And), Unit(v) | Teen(v) | Tens(v)) => {
                add_to(&mut current, v)
            }
            (Some(Hundred | Thousand), And) => matches!(next, Some(Unit(_) | Teen(_) | Tens(_))),
            (Some(_), Point) if matches!(next, Some(Unit(_))) => {
                let mut j = consumed + 1;
                while let Some(Unit(d)) = tokens.get(j).and_then(|t| t.word) {
                    decimals.push_str(&d.to_string());
                    j += 1;
                    if !tokens[j - 1].suffix.is_empty() {
                        break;
                    }
                }
                consumed = j;
                break;
            }
            _ => false,
        };

        if !accepted {
            break;
        }
        last = Some(word);
        consumed += 1;
        if !token.suffix.is_empty() {
            break;
        }
    }

    // A dangling "and" belongs to the surrounding prose.
    if last == Some(And) {
        consumed -= 1;
    }
    if consumed == 0 {
        return None;
    }

    let mut rendered = total.checked_add(current)?.to_string();
    if !decimals.is_empty() {
        rendered.push('.');
        rendered.push_str(&decimals);
    }
    let suffix = tokens[consumed - 1].suffix.clone();
    Some((rendered, suffix, consumed))
}

fn add_to(current: &mut u64, value: u64) -> bool {
    match current.checked_add(value) {
        Some(sum) => {
            *current = sum;
            true
        }
        None => false,
    }
}

/// Like [`parse_number`], but only ends a number where a span ends, so
/// "one-two" is left alone rather than split into "1" and "two".
fn parse_whole_spans(tokens: &[Token]) -> Option<(String, String, usize)> {
    let mut limit = tokens.len();
    while limit > 0 {
        let parsed = parse_number(&tokens[..limit])?;
        let consumed = parsed.2;
        match tokens.get(consumed) {
            Some(next) if next.span == tokens[consumed - 1].span => limit = consumed - 1,
            _ => return Some(parsed),
        }
    }
    None
}

fn expand_line(line: &str, out: &mut String) {
    let spans = word_spans(line);
    let tokens = tokenize(line, &spans);
    let mut copied = 0;
    let mut i = 0;
    while i < tokens.len() {
        let span = tokens[i].span;
        match parse_whole_spans(&tokens[i..]) {
            Some((digits, suffix, consumed)) => {
                let last = tokens[i + consumed - 1].span;
                out.push_str(&line[copied..spans[span].0]);
                out.push_str(&digits);
                out.push_str(&suffix);
                copied = spans[last].1;
                i += consumed;
            }
            None => {
                while tokens.get(i).is_some_and(|t| t.span == span) {
                    i += 1;
                }
            }
        }
    }
    out.push_str(&line[copied..]);
}

/// Replace spelled-out numbers with digits.
///
/// Handles units, teens, tens, hyphenated compounds ("twenty-one"),
/// "hundred" and "thousand" multipliers, and decimals ("five point two").
/// Only the words that make up a number are rewritten; every other
/// character, whitespace included, is copied through. Numbers never span
/// a line break.
pub fn expand_number_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        expand_line(line, &mut out);
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
