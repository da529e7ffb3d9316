//! Position Mapper: conversion between tree points and flat offsets.
//!
//! A tree point follows DOM conventions: inside a text run the offset is a
//! char offset into the run, inside a container it is a child index. Every
//! conversion walks the document once in reading order and keeps nothing.

use dictum_core::types::FlatRange;
use tracing::warn;

use crate::document::{Document, NodeId, NodeKind};
use crate::error::EditorError;

/// A `(node, offset)` address inside the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TreePoint {
    pub node: NodeId,
    pub offset: usize,
}

impl TreePoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A pair of tree points, as reported by a toolkit selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TreeRange {
    pub start: TreePoint,
    pub end: TreePoint,
}

impl TreeRange {
    pub fn new(start: TreePoint, end: TreePoint) -> Self {
        Self { start, end }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Flat start offset of every node, in reading order.
fn spans(doc: &Document) -> Vec<(NodeId, usize)> {
    let mut running = 0;
    doc.preorder()
        .into_iter()
        .map(|id| {
            let start = running;
            running += doc.kind(id).map(NodeKind::flat_len).unwrap_or(0);
            (id, start)
        })
        .collect()
}

fn start_of(spans: &[(NodeId, usize)], id: NodeId) -> Result<usize, EditorError> {
    spans
        .iter()
        .find(|(node, _)| *node == id)
        .map(|(_, start)| *start)
        .ok_or(EditorError::NodeNotFound(id))
}

/// Map one tree point to its flat offset.
pub fn to_flat_offset(doc: &Document, point: TreePoint) -> Result<usize, EditorError> {
    let kind = doc
        .kind(point.node)
        .ok_or(EditorError::NodeNotFound(point.node))?;
    let spans = spans(doc);
    let start = start_of(&spans, point.node)?;

    match kind {
        NodeKind::Text(_) => Ok(start + point.offset.min(kind.flat_len())),
        NodeKind::LineBreak => Ok(start + usize::from(point.offset > 0)),
        NodeKind::Anchor(_) => Ok(start),
        NodeKind::Root | NodeKind::Element { .. } => {
            let children = doc.children(point.node);
            match children.get(point.offset) {
                Some(child) => start_of(&spans, *child),
                None => Ok(start + doc.subtree_len(point.node)),
            }
        }
    }
}

/// Map a tree range to flat offsets, ordering the bounds.
pub fn to_flat_offsets(doc: &Document, range: &TreeRange) -> Result<FlatRange, EditorError> {
    let start = to_flat_offset(doc, range.start)?;
    let end = to_flat_offset(doc, range.end)?;
    Ok(FlatRange::new(start, end))
}

/// Like [`to_flat_offsets`], but an unresolvable start clamps to the
/// document start and an unresolvable end to the document end.
pub fn to_flat_offsets_clamped(doc: &Document, range: &TreeRange) -> FlatRange {
    let start = to_flat_offset(doc, range.start).unwrap_or_else(|e| {
        warn!(error = %e, "Selection start unresolvable, clamping to document start");
        0
    });
    let end = to_flat_offset(doc, range.end).unwrap_or_else(|e| {
        let len = doc.flat_len();
        warn!(error = %e, len, "Selection end unresolvable, clamping to document end");
        len
    });
    FlatRange::new(start, end)
}

/// Map a flat offset to a tree point.
///
/// Offsets past the end clamp to the document end. At the boundary between
/// two runs the point binds to the end of the left run.
pub fn to_tree_point(doc: &Document, offset: usize) -> TreePoint {
    let offset = offset.min(doc.flat_len());
    let mut running = 0;

    for id in doc.leaves() {
        match doc.kind(id) {
            Some(NodeKind::Text(text)) => {
                let len = text.chars().count();
                if offset <= running + len {
                    return TreePoint::new(id, offset - running);
                }
                running += len;
            }
            Some(NodeKind::LineBreak) => {
                if offset == running {
                    if let (Some(parent), Some(index)) = (doc.parent(id), doc.index_in_parent(id)) {
                        return TreePoint::new(parent, index);
                    }
                }
                running += 1;
            }
            _ => {}
        }
    }

    let root = doc.root();
    TreePoint::new(root, doc.children(root).len())
}

/// Map a flat range to a tree range.
pub fn to_tree_range(doc: &Document, range: FlatRange) -> TreeRange {
    TreeRange::new(
        to_tree_point(doc, range.start),
        to_tree_point(doc, range.end),
    )
}

// =============================================================================
// Tests
// =============================================================================
