use serde::{Deserialize, Serialize};

use crate::types::{DegradedReason, DocumentId, FlatRange, Timestamp};

/// Domain events emitted by an editing surface.
///
/// Events are published on the host's broadcast channel and consumed by
/// whoever mirrors the document (persistence, UI, logs).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EditorEvent {
    /// A dictated fragment was inserted.
    FragmentInserted {
        document_id: DocumentId,
        /// Flat range now covered by the inserted text.
        range: FlatRange,
        text_length: usize,
        timestamp: Timestamp,
    },

    /// A voice command was executed instead of a literal insertion.
    CommandApplied {
        document_id: DocumentId,
        command: String,
        caret: usize,
        timestamp: Timestamp,
    },

    /// An insertion fell back to appending at the end of the document.
    InsertionDegraded {
        document_id: DocumentId,
        reason: DegradedReason,
        timestamp: Timestamp,
    },

    /// The current selection was captured on request of the host.
    SelectionCaptured {
        document_id: DocumentId,
        range: FlatRange,
        timestamp: Timestamp,
    },

    /// A full replacement arrived during an insertion and was buffered.
    ReplacementDeferred {
        document_id: DocumentId,
        timestamp: Timestamp,
    },

    /// The document content was replaced wholesale.
    ContentReplaced {
        document_id: DocumentId,
        epoch: u64,
        text_length: usize,
        timestamp: Timestamp,
    },
}

impl EditorEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            EditorEvent::FragmentInserted { timestamp, .. }
            | EditorEvent::CommandApplied { timestamp, .. }
            | EditorEvent::InsertionDegraded { timestamp, .. }
            | EditorEvent::SelectionCaptured { timestamp, .. }
            | EditorEvent::ReplacementDeferred { timestamp, .. }
            | EditorEvent::ContentReplaced { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the document the event belongs to.
    pub fn document_id(&self) -> DocumentId {
        match self {
            EditorEvent::FragmentInserted { document_id, .. }
            | EditorEvent::CommandApplied { document_id, .. }
            | EditorEvent::InsertionDegraded { document_id, .. }
            | EditorEvent::SelectionCaptured { document_id, .. }
            | EditorEvent::ReplacementDeferred { document_id, .. }
            | EditorEvent::ContentReplaced { document_id, .. } => *document_id,
        }
    }

    /// Returns a human-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            EditorEvent::FragmentInserted { .. } => "fragment_inserted",
            EditorEvent::CommandApplied { .. } => "command_applied",
            EditorEvent::InsertionDegraded { .. } => "insertion_degraded",
            EditorEvent::SelectionCaptured { .. } => "selection_captured",
            EditorEvent::ReplacementDeferred { .. } => "replacement_deferred",
            EditorEvent::ContentReplaced { .. } => "content_replaced",
        }
    }
}
