//! Anchor Marker System.
//!
//! An anchor is a zero-length node dropped into the tree at a flat offset.
//! It is found again by its identifier, not by offset, so it keeps its
//! logical place while the surrounding runs are split, emptied or removed.

use dictum_core::types::FlatRange;
use tracing::trace;

use crate::document::{AnchorId, Document, NodeId, NodeKind};
use crate::error::EditorError;
use crate::position::{to_flat_offset, to_tree_point, TreePoint};

/// Insert a new anchor at `offset` and return its identifier.
pub fn place_marker(doc: &mut Document, offset: usize) -> Result<AnchorId, EditorError> {
    let anchor = AnchorId::new();
    let point = to_tree_point(doc, offset);
    let kind = doc
        .kind(point.node)
        .ok_or(EditorError::NodeNotFound(point.node))?;

    if kind.is_container() {
        doc.insert_child(point.node, point.offset, NodeKind::Anchor(anchor))?;
    } else {
        let len = kind.flat_len();
        let is_text = matches!(kind, NodeKind::Text(_));
        let parent = doc
            .parent(point.node)
            .ok_or(EditorError::NodeNotFound(point.node))?;
        let index = doc
            .index_in_parent(point.node)
            .ok_or(EditorError::NodeNotFound(point.node))?;

        if point.offset == 0 {
            doc.insert_child(parent, index, NodeKind::Anchor(anchor))?;
        } else if point.offset >= len || !is_text {
            doc.insert_child(parent, index + 1, NodeKind::Anchor(anchor))?;
        } else {
            doc.split_text(point.node, point.offset)?;
            doc.insert_child(parent, index + 1, NodeKind::Anchor(anchor))?;
        }
    }

    trace!(%anchor, offset, "Anchor placed");
    Ok(anchor)
}

/// Find the node carrying `anchor`, if it is still in the document.
pub fn locate_marker(doc: &Document, anchor: AnchorId) -> Option<NodeId> {
    doc.find_anchor(anchor)
}

/// Current flat offset of `anchor`.
pub fn marker_offset(doc: &Document, anchor: AnchorId) -> Result<usize, EditorError> {
    let node = locate_marker(doc, anchor).ok_or(EditorError::StaleAnchor(anchor))?;
    to_flat_offset(doc, TreePoint::new(node, 0))
}

/// Remove `anchor` from the document. Returns whether it was still present.
pub fn remove_marker(doc: &mut Document, anchor: AnchorId) -> bool {
    match locate_marker(doc, anchor) {
        Some(node) => doc.remove(node).is_ok(),
        None => false,
    }
}

/// Start and optional end anchor bracketing one edit.
///
/// A collapsed range gets a single anchor that serves as both bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorPair {
    pub start: AnchorId,
    pub end: Option<AnchorId>,
}

impl AnchorPair {
    pub fn place(doc: &mut Document, range: FlatRange) -> Result<Self, EditorError> {
        let start = place_marker(doc, range.start)?;
        if range.is_collapsed() {
            return Ok(Self { start, end: None });
        }
        match place_marker(doc, range.end) {
            Ok(end) => Ok(Self {
                start,
                end: Some(end),
            }),
            Err(e) => {
                remove_marker(doc, start);
                Err(e)
            }
        }
    }

    pub fn end_anchor(&self) -> AnchorId {
        self.end.unwrap_or(self.start)
    }

    pub fn start_node(&self, doc: &Document) -> Result<NodeId, EditorError> {
        locate_marker(doc, self.start).ok_or(EditorError::StaleAnchor(self.start))
    }

    pub fn end_node(&self, doc: &Document) -> Result<NodeId, EditorError> {
        let end = self.end_anchor();
        locate_marker(doc, end).ok_or(EditorError::StaleAnchor(end))
    }

    /// Flat range currently bracketed by the pair.
    pub fn range(&self, doc: &Document) -> Result<FlatRange, EditorError> {
        let start = marker_offset(doc, self.start)?;
        let end = marker_offset(doc, self.end_anchor())?;
        Ok(FlatRange::new(start, end))
    }

    /// Remove both anchors, ignoring ones already gone.
    pub fn remove(&self, doc: &mut Document) {
        remove_marker(doc, self.start);
        if let Some(end) = self.end {
            remove_marker(doc, end);
        }
    }
}
