//! The dictation editing surface.
//!
//! Owns one document plus everything needed to edit it from dictation:
//! the selection tracker, the insertion engine, the mutation guard and the
//! single-slot buffer for external replacements. All access is `&mut self`;
//! the host runs one surface per task.

use chrono::Utc;
use dictum_core::config::DictumConfig;
use dictum_core::events::EditorEvent;
use dictum_core::types::{DocumentId, FlatRange};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::buffer::ExternalUpdateBuffer;
use crate::document::{Document, StructuredContent};
use crate::engine::{Insertion, InsertionEngine};
use crate::error::EditorError;
use crate::position::{to_flat_offsets_clamped, to_tree_range};
use crate::state::MutationGuard;
use crate::tracker::{SelectionTracker, TrackedSelection};

pub use crate::tracker::LiveSelection;

/// Snapshot handed to the external change listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentChange {
    pub document_id: DocumentId,
    pub plain_text: String,
    pub content: StructuredContent,
    /// Tracked caret, if it is a collapsed selection.
    pub caret: Option<usize>,
}

/// Callback notified after every settled insertion and applied replacement.
pub type ChangeListener = Box<dyn FnMut(&ContentChange) + Send>;

/// What happened to a `replace_content` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Applied,
    /// Buffered until the in-flight insertion settles.
    Deferred,
}

pub struct DictationSurface {
    id: DocumentId,
    doc: Document,
    live: Option<LiveSelection>,
    tracker: SelectionTracker,
    engine: InsertionEngine,
    buffer: ExternalUpdateBuffer,
    guard: MutationGuard,
    notify_pending: bool,
    listener: Option<ChangeListener>,
    events: Option<broadcast::Sender<EditorEvent>>,
    event_capacity: usize,
}

impl DictationSurface {
    /// An empty surface.
    pub fn new(config: &DictumConfig) -> Self {
        Self::with_content(config, StructuredContent::default())
    }

    pub fn with_content(config: &DictumConfig, content: impl Into<StructuredContent>) -> Self {
        let id = DocumentId::new();
        let content = content.into();
        info!(document_id = %id, "Dictation surface created");
        Self {
            id,
            doc: Document::from_content(&content),
            live: None,
            tracker: SelectionTracker::new(id),
            engine: InsertionEngine::new(config),
            buffer: ExternalUpdateBuffer::new(),
            guard: MutationGuard::new(),
            notify_pending: false,
            listener: None,
            events: None,
            event_capacity: config.editor.event_capacity.max(1),
        }
    }

    /// Publish domain events on `sender`.
    pub fn with_events(mut self, sender: broadcast::Sender<EditorEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub(crate) fn attach_events(&mut self, sender: broadcast::Sender<EditorEvent>) {
        self.events = Some(sender);
    }

    pub fn set_change_listener(&mut self, listener: ChangeListener) {
        self.listener = Some(listener);
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    // =========================================================================
    // Dictation
    // =========================================================================

    /// Insert one dictated fragment and settle immediately.
    pub fn insert_fragment(&mut self, fragment: &str) -> Insertion {
        let insertion = self.begin_insert(fragment);
        self.settle();
        insertion
    }

    /// Mutate the document for `fragment` but leave the guard engaged and the
    /// change notification pending until [`settle`](Self::settle).
    pub fn begin_insert(&mut self, fragment: &str) -> Insertion {
        // Chunks apply in order: the previous insertion settles first.
        self.settle();
        self.guard.engage();

        let live = self
            .live
            .filter(|selection| selection.document == self.id)
            .map(|selection| to_flat_offsets_clamped(&self.doc, &selection.range));
        let insertion = self
            .engine
            .insert(&mut self.doc, fragment, live, self.tracker.tracked());

        let caret = FlatRange::caret(insertion.caret);
        self.live = Some(LiveSelection::new(self.id, to_tree_range(&self.doc, caret)));
        self.tracker.overwrite(caret, self.doc.epoch());
        self.notify_pending = true;

        self.publish_insertion(&insertion);
        insertion
    }

    /// Release the guard, notify the listener and flush a buffered
    /// replacement. No-op when nothing is in flight.
    pub fn settle(&mut self) {
        if !self.guard.is_engaged() {
            return;
        }
        self.guard.release();
        if self.notify_pending {
            self.notify_pending = false;
            self.notify();
        }
        if let Some(content) = self.buffer.take() {
            debug!(document_id = %self.id, "Flushing buffered replacement");
            self.apply_replacement(&content);
        }
    }

    /// Whether an insertion is still unsettled.
    pub fn is_mutating(&self) -> bool {
        self.guard.is_engaged()
    }

    // =========================================================================
    // External replacement and reads
    // =========================================================================

    /// Replace the whole document, or buffer the replacement while an
    /// insertion is in flight. Only the latest buffered replacement survives.
    pub fn replace_content(&mut self, content: impl Into<StructuredContent>) -> ReplaceOutcome {
        let content = content.into();
        if self.guard.is_engaged() {
            self.buffer.defer(content);
            debug!(document_id = %self.id, "Replacement deferred during insertion");
            self.publish(EditorEvent::ReplacementDeferred {
                document_id: self.id,
                timestamp: Utc::now(),
            });
            return ReplaceOutcome::Deferred;
        }
        self.apply_replacement(&content);
        ReplaceOutcome::Applied
    }

    fn apply_replacement(&mut self, content: &StructuredContent) {
        self.doc.replace_content(content);
        // Tree points into the old content no longer resolve.
        self.live = None;
        info!(
            document_id = %self.id,
            epoch = self.doc.epoch(),
            "Document content replaced"
        );
        self.publish(EditorEvent::ContentReplaced {
            document_id: self.id,
            epoch: self.doc.epoch(),
            text_length: self.doc.flat_len(),
            timestamp: Utc::now(),
        });
        self.notify();
    }

    pub fn get_plain_text(&self) -> String {
        self.doc.flat_text()
    }

    pub fn get_structured_content(&self) -> StructuredContent {
        self.doc.to_content()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Feed one global selection-change notification. `None` means the
    /// selection is nowhere the host can see.
    pub fn selection_changed(&mut self, selection: Option<LiveSelection>) {
        if self.guard.is_engaged() {
            trace!("Selection change ignored during internal mutation");
            return;
        }
        let Some(selection) = selection else {
            self.live = None;
            return;
        };
        match self.tracker.observe(&self.doc, &selection, &self.guard) {
            Ok(_) => self.live = Some(selection),
            Err(EditorError::Detached(other)) => {
                trace!(other = %other, "Focus moved to another document");
                self.live = None;
            }
            Err(e) => debug!(error = %e, "Selection change not tracked"),
        }
    }

    /// Place the live selection at a flat range inside this document.
    pub fn select(&mut self, range: FlatRange) {
        let range = range.clamp_to(self.doc.flat_len());
        let selection = LiveSelection::new(self.id, to_tree_range(&self.doc, range));
        self.selection_changed(Some(selection));
    }

    /// Focus left this document. The tracked selection is kept.
    pub fn blur(&mut self) {
        self.selection_changed(None);
    }

    /// Snapshot the live selection into the tracker before the host steals
    /// focus. Returns the tracked range afterwards.
    pub fn focus_and_capture_position(&mut self) -> Option<FlatRange> {
        if let Some(selection) = self.live {
            if let Err(e) = self.tracker.observe(&self.doc, &selection, &self.guard) {
                debug!(error = %e, "Live selection not captured");
            }
        }
        let tracked = self.tracker.tracked()?;
        self.publish(EditorEvent::SelectionCaptured {
            document_id: self.id,
            range: tracked.range,
            timestamp: Utc::now(),
        });
        Some(tracked.range)
    }

    pub fn tracked_selection(&self) -> Option<TrackedSelection> {
        self.tracker.tracked()
    }

    /// Tracked caret position, if the tracked selection is collapsed.
    pub fn caret(&self) -> Option<usize> {
        self.tracker
            .tracked()
            .filter(|t| t.range.is_collapsed())
            .map(|t| t.range.start)
    }

    // =========================================================================
    // Notification
    // =========================================================================

    fn notify(&mut self) {
        let Some(listener) = self.listener.as_mut() else {
            return;
        };
        let caret = self
            .tracker
            .tracked()
            .filter(|t| t.epoch == self.doc.epoch() && t.range.is_collapsed())
            .map(|t| t.range.start);
        let change = ContentChange {
            document_id: self.id,
            plain_text: self.doc.flat_text(),
            content: self.doc.to_content(),
            caret,
        };
        listener(&change);
    }

    fn publish_insertion(&self, insertion: &Insertion) {
        let timestamp = Utc::now();
        if let Some(reason) = insertion.degraded.clone() {
            self.publish(EditorEvent::InsertionDegraded {
                document_id: self.id,
                reason,
                timestamp,
            });
        }
        match insertion.command {
            Some(command) => self.publish(EditorEvent::CommandApplied {
                document_id: self.id,
                command: command.to_string(),
                caret: insertion.caret,
                timestamp,
            }),
            None => self.publish(EditorEvent::FragmentInserted {
                document_id: self.id,
                range: insertion.range,
                text_length: insertion.text.chars().count(),
                timestamp,
            }),
        }
    }

    fn publish(&self, event: EditorEvent) {
        if let Some(sender) = &self.events {
            // No subscribers is fine.
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn surface(text: &str) -> DictationSurface {
        DictationSurface::with_content(&DictumConfig::default(), text)
    }

    fn recording(surface: &mut DictationSurface) -> Arc<Mutex<Vec<ContentChange>>> {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        surface.set_change_listener(Box::new(move |change| {
            sink.lock().unwrap().push(change.clone());
        }));
        changes
    }

    #[test]
    fn test_insert_updates_live_and_tracked_selection() {
        let mut surface = surface("start middle end");
        surface.select(FlatRange::new(6, 12));
        let insertion = surface.insert_fragment("center");

        assert_eq!(surface.get_plain_text(), "start center end");
        assert_eq!(insertion.caret, 12);
        assert_eq!(surface.caret(), Some(12));

        // Next chunk continues right after the previous one.
        surface.insert_fragment("zone");
        assert_eq!(surface.get_plain_text(), "start center zone end");
        assert_eq!(surface.caret(), Some(17));
    }

    #[test]
    fn test_fragment_lands_at_tracked_position_after_blur() {
        let mut surface = surface("helloworld");
        surface.select(FlatRange::caret(5));
        surface.blur();
        surface.insert_fragment("test");
        assert_eq!(surface.get_plain_text(), "hello test world");
    }

    #[test]
    fn test_selection_from_other_document_is_ignored() {
        let mut surface = surface("helloworld");
        surface.select(FlatRange::caret(5));

        let other = DocumentId::new();
        let foreign = LiveSelection::new(other, to_tree_range(surface.document(), FlatRange::caret(0)));
        surface.selection_changed(Some(foreign));

        assert_eq!(surface.tracked_selection().unwrap().range, FlatRange::caret(5));
        surface.insert_fragment("test");
        assert_eq!(surface.get_plain_text(), "hello test world");
    }

    #[test]
    fn test_replacement_is_buffered_while_mutating() {
        let mut surface = surface("abc");
        let changes = recording(&mut surface);
        surface.select(FlatRange::caret(3));

        surface.begin_insert("def");
        assert!(surface.is_mutating());
        assert_eq!(surface.replace_content("first"), ReplaceOutcome::Deferred);
        assert_eq!(surface.replace_content("second"), ReplaceOutcome::Deferred);
        assert_eq!(surface.get_plain_text(), "abc def");
        assert!(changes.lock().unwrap().is_empty());

        surface.settle();
        assert!(!surface.is_mutating());
        assert_eq!(surface.get_plain_text(), "second");

        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].plain_text, "abc def");
        assert_eq!(changes[0].caret, Some(7));
        assert_eq!(changes[1].plain_text, "second");
        assert_eq!(changes[1].caret, None);
    }

    #[test]
    fn test_replacement_applies_immediately_when_idle() {
        let mut surface = surface("abc");
        assert_eq!(surface.replace_content("xyz"), ReplaceOutcome::Applied);
        assert_eq!(surface.get_plain_text(), "xyz");
        assert_eq!(surface.document().epoch(), 1);
    }

    #[test]
    fn test_selection_changes_ignored_while_mutating() {
        let mut surface = surface("abc");
        surface.select(FlatRange::caret(3));
        surface.begin_insert("def");
        surface.select(FlatRange::caret(0));
        surface.settle();
        assert_eq!(surface.caret(), Some(7));
    }

    #[test]
    fn test_next_fragment_settles_previous_insertion() {
        let mut surface = surface("");
        let changes = recording(&mut surface);
        surface.begin_insert("one");
        surface.begin_insert("two");
        assert_eq!(changes.lock().unwrap().len(), 1);
        surface.settle();
        assert_eq!(surface.get_plain_text(), "One two");
        assert_eq!(changes.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_capture_position() {
        let mut surface = surface("abc def");
        assert_eq!(surface.focus_and_capture_position(), None);
        surface.select(FlatRange::new(4, 7));
        assert_eq!(surface.focus_and_capture_position(), Some(FlatRange::new(4, 7)));
    }

    #[test]
    fn test_events_published() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut surface = surface("abc").with_events(tx);
        surface.select(FlatRange::caret(3));
        surface.insert_fragment("new line");
        surface.replace_content("xyz");

        match rx.try_recv().unwrap() {
            EditorEvent::CommandApplied { command, caret, .. } => {
                assert_eq!(command, "new_line");
                assert_eq!(caret, 4);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
        assert!(matches!(
            rx.try_recv().unwrap(),
            EditorEvent::ContentReplaced { epoch: 1, .. }
        ));
    }
}
