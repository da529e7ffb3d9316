use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DictumError, Result};

/// Top-level configuration for Dictum.
///
/// Loaded from `~/.dictum/config.toml` by default. Every section is optional
/// in the file; missing sections fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictumConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub commands: CommandConfig,
}

impl DictumConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DictumConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DictumError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Editing surface behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Capitalize fragments that start a sentence.
    pub auto_capitalize: bool,
    /// Rewrite spelled-out numbers as digits.
    pub expand_numbers: bool,
    /// Rewrite "slash", "hyphen" and "dash" as joiner characters.
    pub spoken_joiners: bool,
    /// Recognize voice commands before literal insertion.
    pub commands_enabled: bool,
    /// Capacity of the editor event broadcast channel.
    pub event_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            auto_capitalize: true,
            expand_numbers: true,
            spoken_joiners: true,
            commands_enabled: true,
            event_capacity: 256,
        }
    }
}

/// Spoken phrases recognized as voice commands.
///
/// Phrases are compared case-insensitively against the trimmed fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub delete_phrases: Vec<String>,
    pub new_line_phrases: Vec<String>,
    pub new_paragraph_phrases: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            delete_phrases: vec!["delete that".to_string(), "scratch that".to_string()],
            new_line_phrases: vec!["new line".to_string()],
            new_paragraph_phrases: vec!["new paragraph".to_string(), "paragraph".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DictumConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert!(config.editor.auto_capitalize);
        assert!(config.editor.expand_numbers);
        assert!(config.editor.commands_enabled);
        assert_eq!(config.editor.event_capacity, 256);
        assert_eq!(config.commands.delete_phrases.len(), 2);
        assert!(config
            .commands
            .new_paragraph_phrases
            .contains(&"paragraph".to_string()));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[editor]
auto_capitalize = false
"#;
        let config: DictumConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.editor.auto_capitalize);
        assert!(config.editor.expand_numbers);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.commands.new_line_phrases, vec!["new line".to_string()]);
    }

    #[test]
    fn test_custom_command_phrases() {
        let toml_str = r#"
[commands]
delete_phrases = ["undo that"]
"#;
        let config: DictumConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.commands.delete_phrases, vec!["undo that".to_string()]);
        // Untouched lists keep their defaults.
        assert_eq!(config.commands.new_line_phrases.len(), 1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DictumConfig::default();
        config.general.log_level = "debug".to_string();
        config.editor.spoken_joiners = false;
        config.save(&path).unwrap();

        let loaded = DictumConfig::load(&path).unwrap();
        assert_eq!(loaded.general.log_level, "debug");
        assert!(!loaded.editor.spoken_joiners);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = DictumConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(DictumError::Io(_))));
    }

    #[test]
    fn test_load_or_default_on_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "editor = [[[").unwrap();

        let config = DictumConfig::load_or_default(&path);
        assert_eq!(config.general.log_level, "info");
    }
}
