//! Dictum Editor crate - dictation-driven editing surface.
//!
//! Inserts asynchronously delivered dictation fragments into an editable
//! document tree at the right place with the right spacing:
//! voice command check -> word-boundary expansion -> anchor marking ->
//! spacing normalization -> mutation -> reconciliation -> buffered replacement flush.
//!
//! Every position exchanged with callers is a flat offset into the
//! document's plain text; tree addressing stays internal.

pub mod anchor;
pub mod boundary;
pub mod buffer;
pub mod command;
pub mod document;
pub mod engine;
pub mod error;
pub mod host;
pub mod position;
pub mod spacing;
pub mod state;
pub mod surface;
pub mod tracker;
pub mod transform;

pub use buffer::ExternalUpdateBuffer;
pub use command::{CommandInterpreter, VoiceCommand};
pub use document::{AnchorId, ContentNode, Document, NodeId, NodeKind, StructuredContent};
pub use engine::{Insertion, InsertionEngine};
pub use error::EditorError;
pub use host::{spawn_surface, SurfaceHandle};
pub use position::{TreePoint, TreeRange};
pub use state::{InsertionState, MutationGuard};
pub use surface::{ChangeListener, ContentChange, DictationSurface, LiveSelection, ReplaceOutcome};
pub use tracker::{SelectionTracker, TrackedSelection};
