//! The single undo slot.
//!
//! Undo is a wholesale restore of the document as it stood before the
//! last batch, not an inversion of the batch's commands. Server-created
//! entities have no client-computable inverse, while a snapshot restore
//! is correct no matter how much of the batch actually applied.
//!
//! One slot only: a new batch overwrites it, opening another document
//! clears it, a successful undo consumes it.

use chrono::{DateTime, Utc};

use sage_document::Document;

/// The document as it stood before a batch, tagged for display.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The full pre-batch document.
    pub document: Document,
    /// The batch summary, shown next to the undo affordance.
    pub summary: Option<String>,
    /// When the batch started applying.
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Captures a document as it currently stands.
    #[must_use]
    pub fn of(document: &Document, summary: Option<String>) -> Self {
        Self {
            document: document.clone(),
            summary,
            taken_at: Utc::now(),
        }
    }
}

/// Holder for the one undoable batch.
#[derive(Debug, Default)]
pub struct UndoSlot {
    slot: Option<Snapshot>,
}

impl UndoSlot {
    /// Replaces whatever was undoable with this snapshot.
    pub fn arm(&mut self, snapshot: Snapshot) {
        self.slot = Some(snapshot);
    }

    /// Empties the slot.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// The retained snapshot, if a batch is undoable.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.slot.as_ref()
    }

    /// True when a batch can be undone.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sage_document::DocumentKind;

    #[test]
    fn arming_overwrites_the_previous_snapshot() {
        let doc = Document::new(DocumentKind::RiskAssessment, "slot test");
        let mut slot = UndoSlot::default();
        assert!(!slot.is_armed());

        slot.arm(Snapshot::of(&doc, Some("first batch".to_owned())));
        slot.arm(Snapshot::of(&doc, Some("second batch".to_owned())));
        assert_eq!(
            slot.snapshot().and_then(|s| s.summary.as_deref()),
            Some("second batch")
        );

        slot.clear();
        assert!(slot.snapshot().is_none());
    }
}
