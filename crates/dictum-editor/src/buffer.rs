//! External-Update Buffer.
//!
//! Holds at most one full-document replacement that arrived while an
//! insertion was in flight. A newer replacement overwrites an older one;
//! only the latest external state is ever applied.

use tracing::debug;

use crate::document::StructuredContent;

#[derive(Debug, Clone, Default)]
pub struct ExternalUpdateBuffer {
    pending: Option<StructuredContent>,
    superseded: u64,
}

impl ExternalUpdateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer `content`, dropping any replacement already waiting.
    ///
    /// Returns `true` if an older replacement was overwritten.
    pub fn defer(&mut self, content: StructuredContent) -> bool {
        let overwritten = self.pending.replace(content).is_some();
        if overwritten {
            self.superseded += 1;
            debug!(superseded = self.superseded, "Older pending replacement discarded");
        }
        overwritten
    }

    /// Take the pending replacement, leaving the slot empty.
    pub fn take(&mut self) -> Option<StructuredContent> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of buffered replacements dropped in favor of a newer one.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let mut buffer = ExternalUpdateBuffer::new();
        assert!(!buffer.is_pending());
        assert!(buffer.take().is_none());
    }

    #[test]
    fn test_latest_replacement_wins() {
        let mut buffer = ExternalUpdateBuffer::new();
        assert!(!buffer.defer(StructuredContent::from_plain_text("first")));
        assert!(buffer.defer(StructuredContent::from_plain_text("second")));
        assert!(buffer.defer(StructuredContent::from_plain_text("third")));
        assert_eq!(buffer.superseded(), 2);

        let pending = buffer.take().unwrap();
        assert_eq!(pending.to_plain_text(), "third");
        assert!(!buffer.is_pending());
        assert!(buffer.take().is_none());
    }
}
