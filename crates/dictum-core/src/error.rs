use thiserror::Error;

/// Top-level error type for the Dictum workspace.
///
/// The editor crate defines its own `EditorError` and implements
/// `From<EditorError> for DictumError` so that `?` works across the crate
/// boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DictumError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Editor error: {0}")]
    Editor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Surface closed")]
    SurfaceClosed,
}

impl From<toml::de::Error> for DictumError {
    fn from(err: toml::de::Error) -> Self {
        DictumError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DictumError {
    fn from(err: toml::ser::Error) -> Self {
        DictumError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DictumError {
    fn from(err: serde_json::Error) -> Self {
        DictumError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Dictum operations.
pub type Result<T> = std::result::Result<T, DictumError>;
