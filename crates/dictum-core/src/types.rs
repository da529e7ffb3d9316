use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// UTC timestamp attached to editor events.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// Identifiers
// =============================================================================

/// Identity of one mounted editing surface.
///
/// Live selections carry the identifier of the document they belong to so a
/// surface can tell its own selection apart from another surface's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Flat coordinates
// =============================================================================

/// A range in flat-offset space.
///
/// Offsets count Unicode scalar values of the document's plain text, where
/// every line break contributes exactly one character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlatRange {
    pub start: usize,
    pub end: usize,
}

impl FlatRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// A collapsed range (caret) at `offset`.
    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    pub fn kind(&self) -> SelectionKind {
        if self.is_collapsed() {
            SelectionKind::Caret
        } else {
            SelectionKind::Selection
        }
    }

    /// Clamp both bounds to `[0, len]`.
    pub fn clamp_to(&self, len: usize) -> Self {
        Self {
            start: self.start.min(len),
            end: self.end.min(len),
        }
    }
}

impl fmt::Display for FlatRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Whether a tracked position is a caret or a real selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    Caret,
    Selection,
}

/// Why an insertion fell back to appending at the end of the document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// No live or tracked selection was available.
    NoPosition,
    /// The tracked selection was captured before a full replacement.
    StalePosition,
    /// A step of the insertion failed.
    InsertionFailed(String),
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradedReason::NoPosition => write!(f, "no position"),
            DegradedReason::StalePosition => write!(f, "stale position"),
            DegradedReason::InsertionFailed(reason) => write!(f, "insertion failed: {}", reason),
        }
    }
}
