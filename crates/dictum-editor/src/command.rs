//! Voice Command Interpreter.
//!
//! Classifies a fragment against a closed set of spoken control phrases
//! before it is treated as text. Anything that does not match exactly is
//! dictated literally.

use std::fmt;

use dictum_core::config::CommandConfig;

/// A recognized spoken control phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceCommand {
    /// Delete the selection, or the word before the caret.
    DeleteThat,
    /// Insert one line break.
    NewLine,
    /// Insert two line breaks.
    NewParagraph,
}

impl VoiceCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceCommand::DeleteThat => "delete_that",
            VoiceCommand::NewLine => "new_line",
            VoiceCommand::NewParagraph => "new_paragraph",
        }
    }

    /// Number of line breaks the command inserts.
    pub fn line_breaks(&self) -> usize {
        match self {
            VoiceCommand::DeleteThat => 0,
            VoiceCommand::NewLine => 1,
            VoiceCommand::NewParagraph => 2,
        }
    }
}

impl fmt::Display for VoiceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phrase table for the closed command set.
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    phrases: Vec<(String, VoiceCommand)>,
    enabled: bool,
}

impl Default for CommandInterpreter {
    fn default() -> Self {
        Self::new(&CommandConfig::default(), true)
    }
}

impl CommandInterpreter {
    pub fn new(config: &CommandConfig, enabled: bool) -> Self {
        let mut phrases = Vec::new();
        let groups = [
            (&config.delete_phrases, VoiceCommand::DeleteThat),
            (&config.new_line_phrases, VoiceCommand::NewLine),
            (&config.new_paragraph_phrases, VoiceCommand::NewParagraph),
        ];
        for (list, command) in groups {
            for phrase in list {
                let key = canonical(phrase);
                if !key.is_empty() {
                    phrases.push((key, command));
                }
            }
        }
        Self { phrases, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Match `fragment` against the phrase table.
    ///
    /// Comparison is case-insensitive on the trimmed fragment, ignoring
    /// terminal punctuation a transcriber may have appended and runs of
    /// inner whitespace.
    pub fn interpret(&self, fragment: &str) -> Option<VoiceCommand> {
        if !self.enabled {
            return None;
        }
        let key = canonical(fragment);
        self.phrases
            .iter()
            .find(|(phrase, _)| *phrase == key)
            .map(|(_, command)| *command)
    }
}

fn canonical(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!', '?', ','])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phrases() {
        let interpreter = CommandInterpreter::default();
        assert_eq!(interpreter.interpret("delete that"), Some(VoiceCommand::DeleteThat));
        assert_eq!(interpreter.interpret("scratch that"), Some(VoiceCommand::DeleteThat));
        assert_eq!(interpreter.interpret("new line"), Some(VoiceCommand::NewLine));
        assert_eq!(interpreter.interpret("new paragraph"), Some(VoiceCommand::NewParagraph));
        assert_eq!(interpreter.interpret("paragraph"), Some(VoiceCommand::NewParagraph));
    }

    #[test]
    fn test_case_whitespace_and_terminal_punctuation_are_ignored() {
        let interpreter = CommandInterpreter::default();
        assert_eq!(interpreter.interpret("  Delete That. "), Some(VoiceCommand::DeleteThat));
        assert_eq!(interpreter.interpret("NEW   LINE"), Some(VoiceCommand::NewLine));
        assert_eq!(interpreter.interpret("New paragraph!"), Some(VoiceCommand::NewParagraph));
    }

    #[test]
    fn test_near_misses_are_literal_text() {
        let interpreter = CommandInterpreter::default();
        assert_eq!(interpreter.interpret("delete that please"), None);
        assert_eq!(interpreter.interpret("the new line of treatment"), None);
        assert_eq!(interpreter.interpret("paragraphs"), None);
        assert_eq!(interpreter.interpret(""), None);
    }

    #[test]
    fn test_disabled_interpreter_matches_nothing() {
        let interpreter = CommandInterpreter::new(&CommandConfig::default(), false);
        assert!(!interpreter.is_enabled());
        assert_eq!(interpreter.interpret("new line"), None);
    }

    #[test]
    fn test_custom_phrases() {
        let config = CommandConfig {
            delete_phrases: vec!["Undo That".to_string()],
            new_line_phrases: vec!["next line".to_string()],
            new_paragraph_phrases: vec![],
        };
        let interpreter = CommandInterpreter::new(&config, true);
        assert_eq!(interpreter.interpret("undo that"), Some(VoiceCommand::DeleteThat));
        assert_eq!(interpreter.interpret("next line"), Some(VoiceCommand::NewLine));
        assert_eq!(interpreter.interpret("delete that"), None);
        assert_eq!(interpreter.interpret("paragraph"), None);
    }

    #[test]
    fn test_command_metadata() {
        assert_eq!(VoiceCommand::NewParagraph.line_breaks(), 2);
        assert_eq!(VoiceCommand::DeleteThat.to_string(), "delete_that");
    }
}
