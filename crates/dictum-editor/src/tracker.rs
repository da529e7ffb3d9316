//! Selection Tracker.
//!
//! Remembers the last caret or selection the user made inside this document
//! in flat coordinates, so a fragment that arrives while focus is elsewhere
//! still lands where the user left off.

use dictum_core::types::{DocumentId, FlatRange, SelectionKind};
use tracing::trace;

use crate::document::Document;
use crate::error::EditorError;
use crate::position::{to_flat_offsets_clamped, TreeRange};
use crate::state::MutationGuard;

/// A toolkit selection as reported by the host's selection-change
/// subscription. `document` names the surface the selection lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveSelection {
    pub document: DocumentId,
    pub range: TreeRange,
}

impl LiveSelection {
    pub fn new(document: DocumentId, range: TreeRange) -> Self {
        Self { document, range }
    }
}

/// Best-known selection, stamped with the content epoch it was taken in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackedSelection {
    pub range: FlatRange,
    pub epoch: u64,
}

impl TrackedSelection {
    pub fn kind(&self) -> SelectionKind {
        self.range.kind()
    }

    /// Whether the selection still addresses `doc`: same epoch, in bounds.
    pub fn is_current(&self, doc: &Document) -> bool {
        self.epoch == doc.epoch() && self.range.end <= doc.flat_len()
    }
}

#[derive(Debug, Clone)]
pub struct SelectionTracker {
    document_id: DocumentId,
    tracked: Option<TrackedSelection>,
}

impl SelectionTracker {
    pub fn new(document_id: DocumentId) -> Self {
        Self {
            document_id,
            tracked: None,
        }
    }

    /// Handle one selection-change notification.
    ///
    /// Returns the recorded range, `None` if the guard is engaged, or
    /// [`EditorError::Detached`] if the selection lives in another document.
    pub fn observe(
        &mut self,
        doc: &Document,
        selection: &LiveSelection,
        guard: &MutationGuard,
    ) -> Result<Option<FlatRange>, EditorError> {
        if selection.document != self.document_id {
            return Err(EditorError::Detached(selection.document));
        }
        if guard.is_engaged() {
            trace!("Selection change ignored during internal mutation");
            return Ok(None);
        }
        let range = to_flat_offsets_clamped(doc, &selection.range);
        self.tracked = Some(TrackedSelection {
            range,
            epoch: doc.epoch(),
        });
        trace!(start = range.start, end = range.end, "Selection tracked");
        Ok(Some(range))
    }

    /// Set the tracked selection directly (used by reconciliation).
    pub fn overwrite(&mut self, range: FlatRange, epoch: u64) {
        self.tracked = Some(TrackedSelection { range, epoch });
    }

    pub fn tracked(&self) -> Option<TrackedSelection> {
        self.tracked
    }

    pub fn clear(&mut self) {
        self.tracked = None;
    }
}
