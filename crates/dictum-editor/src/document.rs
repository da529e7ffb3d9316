//! Arena-backed document tree.
//!
//! A document is a tree of containers (the root and elements) whose leaves
//! are text runs, line breaks and anchor markers. Reading order is preorder.
//! Node identifiers are never reused inside one document, so an identifier
//! captured before a mutation either still names the same node or resolves
//! to nothing.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EditorError;

/// Glyph an anchor marker renders as when the document is dumped for debugging.
pub const ANCHOR_GLYPH: char = '\u{200B}';

/// Identifier of a node inside one [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique tag carried by an anchor marker node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnchorId(Uuid);

impl AnchorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnchorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a node is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element { tag: String },
    Text(String),
    LineBreak,
    Anchor(AnchorId),
}

impl NodeKind {
    /// Length this node contributes to the flat text, excluding descendants.
    pub fn flat_len(&self) -> usize {
        match self {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::LineBreak => 1,
            _ => 0,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Element { .. })
    }
}

#[derive(Clone, Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

// =============================================================================
// Structured content
// =============================================================================

/// Serializable form of a document, used for external replacement and reads.
///
/// Anchor markers never appear here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredContent {
    pub nodes: Vec<ContentNode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentNode {
    Element {
        tag: String,
        children: Vec<ContentNode>,
    },
    Text {
        text: String,
    },
    LineBreak,
}

impl StructuredContent {
    /// Convert plain text into text runs separated by line-break nodes.
    pub fn from_plain_text(text: &str) -> Self {
        let mut nodes = Vec::new();
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                nodes.push(ContentNode::LineBreak);
            }
            if !segment.is_empty() {
                nodes.push(ContentNode::Text {
                    text: segment.to_string(),
                });
            }
        }
        Self { nodes }
    }

    /// Flatten to plain text: text runs verbatim, one newline per line break.
    pub fn to_plain_text(&self) -> String {
        fn collect(nodes: &[ContentNode], out: &mut String) {
            for node in nodes {
                match node {
                    ContentNode::Element { children, .. } => collect(children, out),
                    ContentNode::Text { text } => out.push_str(text),
                    ContentNode::LineBreak => out.push('\n'),
                }
            }
        }

        let mut out = String::new();
        collect(&self.nodes, &mut out);
        out
    }
}

impl From<&str> for StructuredContent {
    fn from(text: &str) -> Self {
        Self::from_plain_text(text)
    }
}

impl From<String> for StructuredContent {
    fn from(text: String) -> Self {
        Self::from_plain_text(&text)
    }
}

// =============================================================================
// Document
// =============================================================================

/// The editable document tree.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    /// Bumped on every full replacement.
    epoch: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only its root.
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
            epoch: 0,
        }
    }

    pub fn from_content(content: &StructuredContent) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        doc.build(root, &content.nodes);
        doc
    }

    pub fn from_plain_text(text: &str) -> Self {
        Self::from_content(&StructuredContent::from_plain_text(text))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(&id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Total flat length of `id` and its descendants.
    pub fn subtree_len(&self, id: NodeId) -> usize {
        let own = self.kind(id).map(NodeKind::flat_len).unwrap_or(0);
        own + self
            .children(id)
            .iter()
            .map(|c| self.subtree_len(*c))
            .sum::<usize>()
    }

    /// Every node in reading order, root first.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Non-container nodes in reading order (text runs, breaks, anchors).
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| self.kind(*id).is_some_and(|k| !k.is_container()))
            .collect()
    }

    /// The flat text: text runs verbatim, one `\n` per line break.
    pub fn flat_text(&self) -> String {
        let mut out = String::new();
        for id in self.leaves() {
            match self.kind(id) {
                Some(NodeKind::Text(text)) => out.push_str(text),
                Some(NodeKind::LineBreak) => out.push('\n'),
                _ => {}
            }
        }
        out
    }

    pub fn flat_len(&self) -> usize {
        self.subtree_len(self.root)
    }

    /// Flat text with anchors rendered as [`ANCHOR_GLYPH`].
    pub fn render_with_anchors(&self) -> String {
        let mut out = String::new();
        for id in self.leaves() {
            match self.kind(id) {
                Some(NodeKind::Text(text)) => out.push_str(text),
                Some(NodeKind::LineBreak) => out.push('\n'),
                Some(NodeKind::Anchor(_)) => out.push(ANCHOR_GLYPH),
                _ => {}
            }
        }
        out
    }

    pub fn find_anchor(&self, anchor: AnchorId) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.kind == NodeKind::Anchor(anchor))
            .map(|(id, _)| *id)
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    fn alloc(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                kind,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        id
    }

    /// Insert a new node as child `index` of `parent`; `index` is clamped.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        kind: NodeKind,
    ) -> Result<NodeId, EditorError> {
        match self.kind(parent) {
            None => return Err(EditorError::NodeNotFound(parent)),
            Some(k) if !k.is_container() => return Err(EditorError::NotAContainer(parent)),
            Some(_) => {}
        }
        let id = self.alloc(kind, parent);
        let children = &mut self
            .nodes
            .get_mut(&parent)
            .ok_or(EditorError::NodeNotFound(parent))?
            .children;
        let index = index.min(children.len());
        children.insert(index, id);
        Ok(id)
    }

    pub fn append_child(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, EditorError> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, kind)
    }

    /// Insert a new node as the next sibling of `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, kind: NodeKind) -> Result<NodeId, EditorError> {
        let parent = self
            .parent(sibling)
            .ok_or(EditorError::NodeNotFound(sibling))?;
        let index = self
            .index_in_parent(sibling)
            .ok_or(EditorError::NodeNotFound(sibling))?;
        self.insert_child(parent, index + 1, kind)
    }

    /// Detach `id` from its parent and drop its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), EditorError> {
        if id == self.root {
            return Err(EditorError::MalformedRange(
                "the root cannot be removed".to_string(),
            ));
        }
        let node = self.nodes.remove(&id).ok_or(EditorError::NodeNotFound(id))?;
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        let mut stack = node.children;
        while let Some(child) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                stack.extend(removed.children);
            }
        }
        Ok(())
    }

    /// Split a text run at a char offset, returning the new right-hand run.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, EditorError> {
        let right = match self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            Some(NodeKind::Text(text)) => {
                let byte = char_to_byte(text, offset);
                text.split_off(byte)
            }
            Some(_) => return Err(EditorError::NotText(id)),
            None => return Err(EditorError::NodeNotFound(id)),
        };
        self.insert_after(id, NodeKind::Text(right))
    }

    /// Remove every leaf strictly between two leaves, plus any element left
    /// empty by the removal. Returns the number of flat characters removed.
    pub fn delete_between(&mut self, start: NodeId, end: NodeId) -> Result<usize, EditorError> {
        let leaves = self.leaves();
        let si = leaves
            .iter()
            .position(|id| *id == start)
            .ok_or(EditorError::NodeNotFound(start))?;
        let ei = leaves
            .iter()
            .position(|id| *id == end)
            .ok_or(EditorError::NodeNotFound(end))?;
        if si > ei {
            return Err(EditorError::MalformedRange(format!(
                "{} comes after {}",
                start, end
            )));
        }

        let mut removed = 0;
        let mut emptied = Vec::new();
        for id in &leaves[si + 1..ei] {
            removed += self.kind(*id).map(NodeKind::flat_len).unwrap_or(0);
            if let Some(parent) = self.parent(*id) {
                emptied.push(parent);
            }
            self.remove(*id)?;
        }

        while let Some(id) = emptied.pop() {
            if id == self.root || !self.contains(id) || !self.children(id).is_empty() {
                continue;
            }
            if let Some(parent) = self.parent(id) {
                emptied.push(parent);
            }
            self.remove(id)?;
        }
        Ok(removed)
    }

    /// Remove one space directly before `id` in reading order, if there is one.
    pub fn trim_space_before(&mut self, id: NodeId) -> bool {
        let Some(prev) = self.neighbor_text(id, Direction::Backward) else {
            return false;
        };
        match self.nodes.get_mut(&prev).map(|n| &mut n.kind) {
            Some(NodeKind::Text(text)) if text.ends_with(' ') => {
                text.pop();
                true
            }
            _ => false,
        }
    }

    /// Remove one space directly after `id` in reading order, if there is one.
    pub fn trim_space_after(&mut self, id: NodeId) -> bool {
        let Some(next) = self.neighbor_text(id, Direction::Forward) else {
            return false;
        };
        match self.nodes.get_mut(&next).map(|n| &mut n.kind) {
            Some(NodeKind::Text(text)) if text.starts_with(' ') => {
                text.remove(0);
                true
            }
            _ => false,
        }
    }

    /// Nearest non-empty text or break leaf next to `id`, skipping anchors
    /// and empty runs. Returns `None` when the neighbor is not a text run.
    fn neighbor_text(&self, id: NodeId, direction: Direction) -> Option<NodeId> {
        let leaves = self.leaves();
        let index = leaves.iter().position(|l| *l == id)?;
        let visible = |l: &&NodeId| match self.kind(**l) {
            Some(NodeKind::Text(text)) => !text.is_empty(),
            Some(NodeKind::LineBreak) => true,
            _ => false,
        };
        let neighbor = match direction {
            Direction::Backward => leaves[..index].iter().rev().find(visible),
            Direction::Forward => leaves[index + 1..].iter().find(visible),
        }?;
        matches!(self.kind(*neighbor), Some(NodeKind::Text(_))).then_some(*neighbor)
    }

    /// Drop every node under the root and rebuild from `content`.
    pub fn replace_content(&mut self, content: &StructuredContent) {
        let children: Vec<NodeId> = self.children(self.root).to_vec();
        for child in children {
            // Children of the root always exist and are never the root itself.
            let _ = self.remove(child);
        }
        let root = self.root;
        self.build(root, &content.nodes);
        self.epoch += 1;
    }

    fn build(&mut self, parent: NodeId, nodes: &[ContentNode]) {
        for node in nodes {
            match node {
                ContentNode::Element { tag, children } => {
                    let id = self.alloc(NodeKind::Element { tag: tag.clone() }, parent);
                    self.push_child(parent, id);
                    self.build(id, children);
                }
                ContentNode::Text { text } => {
                    let id = self.alloc(NodeKind::Text(text.clone()), parent);
                    self.push_child(parent, id);
                }
                ContentNode::LineBreak => {
                    let id = self.alloc(NodeKind::LineBreak, parent);
                    self.push_child(parent, id);
                }
            }
        }
    }

    fn push_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    /// Merge adjacent sibling text runs and drop empty runs.
    ///
    /// Flat text is unchanged; node identity of merged runs is not.
    pub fn normalize(&mut self) {
        let containers: Vec<NodeId> = self
            .preorder()
            .into_iter()
            .filter(|id| self.kind(*id).is_some_and(NodeKind::is_container))
            .collect();

        for container in containers {
            let children = self.children(container).to_vec();
            let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
            for child in children {
                let text = match self.kind(child) {
                    Some(NodeKind::Text(text)) => text.clone(),
                    _ => {
                        kept.push(child);
                        continue;
                    }
                };
                if text.is_empty() {
                    self.nodes.remove(&child);
                    continue;
                }
                let previous = kept.last().copied();
                match previous.and_then(|p| self.nodes.get_mut(&p)) {
                    Some(Node {
                        kind: NodeKind::Text(prev_text),
                        ..
                    }) => {
                        prev_text.push_str(&text);
                        self.nodes.remove(&child);
                    }
                    _ => kept.push(child),
                }
            }
            if let Some(node) = self.nodes.get_mut(&container) {
                node.children = kept;
            }
        }
    }

    /// Snapshot the tree as [`StructuredContent`], leaving anchors out.
    pub fn to_content(&self) -> StructuredContent {
        StructuredContent {
            nodes: self.content_children(self.root),
        }
    }

    fn content_children(&self, id: NodeId) -> Vec<ContentNode> {
        self.children(id)
            .iter()
            .filter_map(|child| match self.kind(*child)? {
                NodeKind::Element { tag } => Some(ContentNode::Element {
                    tag: tag.clone(),
                    children: self.content_children(*child),
                }),
                NodeKind::Text(text) => Some(ContentNode::Text { text: text.clone() }),
                NodeKind::LineBreak => Some(ContentNode::LineBreak),
                NodeKind::Anchor(_) | NodeKind::Root => None,
            })
            .collect()
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Backward,
    Forward,
}

/// Byte index of the `offset`-th char, clamped to the end of `text`.
pub(crate) fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

// =============================================================================
// Tests
// =============================================================================
