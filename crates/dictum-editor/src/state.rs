//! Insertion state machine and the mutation guard.
//!
//! One insertion walks the phases in order:
//! - Idle -> Locating (fragment arrived)
//! - Locating -> Marking (working range found)
//! - Marking -> Replacing (anchors placed)
//! - Replacing -> Inserting (selected content removed)
//! - Inserting -> Reconciling (fragment inserted)
//! - Replacing -> Reconciling (delete command, nothing to insert)
//! - Reconciling -> Idle (anchors removed, caret updated)

use std::fmt;

use tracing::{trace, warn};

use crate::error::EditorError;

/// Phase of the insertion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertionState {
    Idle,
    Locating,
    Marking,
    Replacing,
    Inserting,
    Reconciling,
}

impl fmt::Display for InsertionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertionState::Idle => write!(f, "Idle"),
            InsertionState::Locating => write!(f, "Locating"),
            InsertionState::Marking => write!(f, "Marking"),
            InsertionState::Replacing => write!(f, "Replacing"),
            InsertionState::Inserting => write!(f, "Inserting"),
            InsertionState::Reconciling => write!(f, "Reconciling"),
        }
    }
}

impl InsertionState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &InsertionState) -> bool {
        matches!(
            (self, target),
            (InsertionState::Idle, InsertionState::Locating)
                | (InsertionState::Locating, InsertionState::Marking)
                | (InsertionState::Marking, InsertionState::Replacing)
                | (InsertionState::Replacing, InsertionState::Inserting)
                | (InsertionState::Inserting, InsertionState::Reconciling)
                | (InsertionState::Reconciling, InsertionState::Idle)
                // Delete commands have nothing to insert
                | (InsertionState::Replacing, InsertionState::Reconciling)
        )
    }
}

/// Tracks the current phase and rejects out-of-order transitions.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    state: InsertionState,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            state: InsertionState::Idle,
        }
    }

    pub fn current(&self) -> InsertionState {
        self.state
    }

    /// Attempt to move to `target`.
    pub fn transition(&mut self, target: InsertionState) -> Result<(), EditorError> {
        if self.state.can_transition_to(&target) {
            trace!("Insertion state: {} -> {}", self.state, target);
            self.state = target;
            Ok(())
        } else {
            Err(EditorError::InvalidTransition(self.state, target))
        }
    }

    /// Force the tracker back to Idle (degraded path).
    pub fn reset(&mut self) {
        if self.state != InsertionState::Idle {
            warn!("Insertion state reset to Idle from {}", self.state);
        }
        self.state = InsertionState::Idle;
    }
}

/// The "internal mutation in progress" flag.
///
/// While engaged the selection tracker keeps its last value and external
/// replacements are buffered instead of applied.
#[derive(Debug, Clone, Default)]
pub struct MutationGuard {
    engaged: bool,
}

impl MutationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engage(&mut self) {
        self.engaged = true;
    }

    pub fn release(&mut self) {
        self.engaged = false;
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}

// =============================================================================
// Tests
// =============================================================================
