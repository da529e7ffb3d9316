//! Insertion Engine.
//!
//! Runs one fragment through Locating, Marking, Replacing, Inserting and
//! Reconciling against a [`Document`]. The engine never fails from the
//! caller's point of view: if any phase errors, the raw fragment is
//! appended at the end of the document and the result is marked degraded.

use dictum_core::config::DictumConfig;
use dictum_core::types::{DegradedReason, FlatRange};
use tracing::{debug, error, warn};

use crate::anchor::{marker_offset, AnchorPair};
use crate::boundary;
use crate::command::{CommandInterpreter, VoiceCommand};
use crate::document::{Document, NodeId, NodeKind};
use crate::error::EditorError;
use crate::spacing::{is_line_break_literal, Normalized, SpacingNormalizer};
use crate::state::{InsertionState, PhaseTracker};
use crate::tracker::TrackedSelection;
use crate::transform::{PrepassOptions, TextPrepass};

/// Outcome of one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Flat range now covered by the inserted text (collapsed for deletes).
    pub range: FlatRange,
    /// Caret position after reconciliation.
    pub caret: usize,
    pub command: Option<VoiceCommand>,
    /// Set when the fragment did not land at the intended position.
    pub degraded: Option<DegradedReason>,
    /// Text actually inserted, after pre-pass and normalization.
    pub text: String,
}

pub struct InsertionEngine {
    normalizer: SpacingNormalizer,
    prepass: TextPrepass,
    commands: CommandInterpreter,
    phases: PhaseTracker,
}

impl Default for InsertionEngine {
    fn default() -> Self {
        Self::new(&DictumConfig::default())
    }
}

impl InsertionEngine {
    pub fn new(config: &DictumConfig) -> Self {
        Self {
            normalizer: SpacingNormalizer::new(),
            prepass: TextPrepass::new(PrepassOptions::from(&config.editor)),
            commands: CommandInterpreter::new(&config.commands, config.editor.commands_enabled),
            phases: PhaseTracker::new(),
        }
    }

    pub fn state(&self) -> InsertionState {
        self.phases.current()
    }

    /// Insert `fragment` into `doc`.
    ///
    /// `live` is the live selection already mapped to flat offsets; it wins
    /// over `tracked`. With neither, the fragment goes to the document end.
    pub fn insert(
        &mut self,
        doc: &mut Document,
        fragment: &str,
        live: Option<FlatRange>,
        tracked: Option<TrackedSelection>,
    ) -> Insertion {
        let command = self.commands.interpret(fragment);
        let (located, degraded) = locate(doc, live, tracked);

        if command.is_none() && fragment.trim().is_empty() && !is_line_break_literal(fragment) {
            debug!("Blank fragment ignored");
            return Insertion {
                range: FlatRange::caret(located.start),
                caret: located.start,
                command: None,
                degraded,
                text: String::new(),
            };
        }

        match self.apply(doc, fragment, command, located) {
            Ok(mut insertion) => {
                insertion.degraded = degraded;
                insertion
            }
            Err(e) => {
                self.phases.reset();
                fallback(doc, fragment, command, e)
            }
        }
    }

    fn apply(
        &mut self,
        doc: &mut Document,
        fragment: &str,
        command: Option<VoiceCommand>,
        located: FlatRange,
    ) -> Result<Insertion, EditorError> {
        self.phases.transition(InsertionState::Locating)?;
        let range = match command {
            Some(VoiceCommand::DeleteThat) if located.is_collapsed() => {
                word_before(&doc.flat_text(), located.start)
            }
            // A delete removes exactly what was selected.
            Some(VoiceCommand::DeleteThat) => located,
            _ => boundary::expand(doc, located),
        };
        if range != located {
            debug!(start = range.start, end = range.end, "Working range adjusted");
        }

        self.phases.transition(InsertionState::Marking)?;
        let pair = AnchorPair::place(doc, range)?;
        let result = self.mutate(doc, &pair, fragment, command);
        pair.remove(doc);
        doc.normalize();

        let insertion = result?;
        self.phases.transition(InsertionState::Idle)?;
        debug!(
            fragment_len = fragment.chars().count(),
            start = insertion.range.start,
            end = insertion.range.end,
            caret = insertion.caret,
            command = ?insertion.command,
            "Fragment applied"
        );
        Ok(insertion)
    }

    /// Everything between placing and removing the anchors.
    fn mutate(
        &mut self,
        doc: &mut Document,
        pair: &AnchorPair,
        fragment: &str,
        command: Option<VoiceCommand>,
    ) -> Result<Insertion, EditorError> {
        let span = pair.range(doc)?;
        let normalized = match command {
            Some(command) => Normalized {
                text: "\n".repeat(command.line_breaks()),
                consume_left: false,
                consume_right: false,
            },
            None if is_line_break_literal(fragment) => Normalized {
                text: fragment.to_string(),
                consume_left: false,
                consume_right: false,
            },
            None => {
                let flat: Vec<char> = doc.flat_text().chars().collect();
                let left: String = flat[..span.start].iter().collect();
                let right: String = flat[span.end..].iter().collect();
                let prepared = self.prepass.prepare(fragment, &left);
                self.normalizer.normalize(&left, &prepared, &right)
            }
        };

        self.phases.transition(InsertionState::Replacing)?;
        let start = pair.start_node(doc)?;
        let end = pair.end_node(doc)?;
        if start != end {
            doc.delete_between(start, end)?;
        }
        if normalized.consume_left {
            doc.trim_space_before(start);
        }
        if normalized.consume_right {
            doc.trim_space_after(end);
        }

        if normalized.text.is_empty() {
            self.phases.transition(InsertionState::Reconciling)?;
        } else {
            self.phases.transition(InsertionState::Inserting)?;
            insert_after(doc, start, &normalized.text)?;
            self.phases.transition(InsertionState::Reconciling)?;
        }

        let start_offset = marker_offset(doc, pair.start)?;
        let caret = start_offset + normalized.text.chars().count();
        Ok(Insertion {
            range: FlatRange::new(start_offset, caret),
            caret,
            command,
            degraded: None,
            text: normalized.text,
        })
    }
}

/// Pick the working range: live selection, then a current tracked
/// selection, then the document end.
fn locate(
    doc: &Document,
    live: Option<FlatRange>,
    tracked: Option<TrackedSelection>,
) -> (FlatRange, Option<DegradedReason>) {
    let len = doc.flat_len();
    if let Some(range) = live {
        return (range.clamp_to(len), None);
    }
    match tracked.map(|t| resolve_tracked(doc, t)) {
        Some(Ok(range)) => (range, None),
        Some(Err(e)) => {
            warn!(error = %e, "Tracked selection is stale, inserting at document end");
            (FlatRange::caret(len), Some(DegradedReason::StalePosition))
        }
        None => {
            warn!(len, "No known position, inserting at document end");
            (FlatRange::caret(len), Some(DegradedReason::NoPosition))
        }
    }
}

fn resolve_tracked(doc: &Document, tracked: TrackedSelection) -> Result<FlatRange, EditorError> {
    if tracked.is_current(doc) {
        Ok(tracked.range)
    } else {
        Err(EditorError::StalePosition {
            offset: tracked.range.end,
            len: doc.flat_len(),
        })
    }
}

/// The word before `caret` plus the whitespace between it and the caret.
fn word_before(text: &str, caret: usize) -> FlatRange {
    let chars: Vec<char> = text.chars().collect();
    let caret = caret.min(chars.len());
    let mut start = caret;
    while start > 0 && chars[start - 1].is_whitespace() {
        start -= 1;
    }
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
    }
    FlatRange::new(start, caret)
}

/// Insert `text` as runs and line breaks directly after `anchor`.
fn insert_after(doc: &mut Document, anchor: NodeId, text: &str) -> Result<(), EditorError> {
    let mut last = anchor;
    for (i, segment) in text.split('\n').enumerate() {
        if i > 0 {
            last = doc.insert_after(last, NodeKind::LineBreak)?;
        }
        if !segment.is_empty() {
            last = doc.insert_after(last, NodeKind::Text(segment.to_string()))?;
        }
    }
    Ok(())
}

/// Degraded path: append the raw fragment at the document end.
fn fallback(
    doc: &mut Document,
    fragment: &str,
    command: Option<VoiceCommand>,
    cause: EditorError,
) -> Insertion {
    warn!(error = %cause, "Insertion failed, appending fragment at document end");
    let text = match command {
        Some(command) => "\n".repeat(command.line_breaks()),
        None => fragment.to_string(),
    };

    let start = doc.flat_len();
    let root = doc.root();
    for (i, segment) in text.split('\n').enumerate() {
        if i > 0 {
            if let Err(e) = doc.append_child(root, NodeKind::LineBreak) {
                error!(error = %e, "Failed to append line break");
            }
        }
        if !segment.is_empty() {
            if let Err(e) = doc.append_child(root, NodeKind::Text(segment.to_string())) {
                error!(error = %e, "Failed to append fragment");
            }
        }
    }
    doc.normalize();

    let caret = start + text.chars().count();
    Insertion {
        range: FlatRange::new(start, caret),
        caret,
        command,
        degraded: Some(DegradedReason::InsertionFailed(cause.to_string())),
        text,
    }
}

// =============================================================================
// Tests
// =============================================================================
