//! Error types for the editing core.
//!
//! None of these reach the dictation caller: the surface recovers from each
//! one locally, at worst by appending at the end of the document.

use dictum_core::error::DictumError;
use dictum_core::types::DocumentId;

use crate::document::{AnchorId, NodeId};
use crate::state::InsertionState;

/// Errors raised while mapping positions or mutating the document tree.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Node {0} cannot hold children")]
    NotAContainer(NodeId),
    #[error("Node {0} is not a text run")]
    NotText(NodeId),
    #[error("Anchor no longer in document: {0}")]
    StaleAnchor(AnchorId),
    #[error("Position {offset} is outside the document (length {len})")]
    StalePosition { offset: usize, len: usize },
    #[error("Malformed range: {0}")]
    MalformedRange(String),
    #[error("Selection belongs to another document: {0}")]
    Detached(DocumentId),
    #[error("Invalid insertion transition: {0} -> {1}")]
    InvalidTransition(InsertionState, InsertionState),
}

impl From<EditorError> for DictumError {
    fn from(err: EditorError) -> Self {
        DictumError::Editor(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_error_display() {
        let err = EditorError::StalePosition { offset: 40, len: 12 };
        assert_eq!(
            err.to_string(),
            "Position 40 is outside the document (length 12)"
        );

        let err = EditorError::MalformedRange("start after end".to_string());
        assert_eq!(err.to_string(), "Malformed range: start after end");

        let err = EditorError::InvalidTransition(InsertionState::Idle, InsertionState::Inserting);
        assert_eq!(
            err.to_string(),
            "Invalid insertion transition: Idle -> Inserting"
        );
    }

    #[test]
    fn test_editor_error_into_dictum_error() {
        let err: DictumError = EditorError::MalformedRange("bad".to_string()).into();
        assert!(matches!(err, DictumError::Editor(_)));
        assert!(err.to_string().contains("bad"));
    }
}
