//! Session-level failures.
//!
//! Per-command failures never surface here; they are collected into the
//! batch report so a half-good batch still settles. What does surface
//! is loss of synchronization with the store: a failed refetch or a
//! failed undo restore means the cache can no longer be trusted.

use thiserror::Error;

use sage_phase::GateError;
use sage_store::StoreError;

/// Why a session operation failed as a whole.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Undo was invoked with an empty undo slot.
    #[error("no batch to undo")]
    NothingToUndo,

    /// The undo bulk replace failed. The snapshot is retained so the
    /// caller can retry; surface this distinctly from a save failure.
    #[error("undo restore failed, snapshot retained: {source}")]
    RestoreFailed {
        /// The store failure.
        #[source]
        source: StoreError,
    },

    /// The post-mutation refetch failed, so the cached document no
    /// longer reflects the store. Halt optimistic action.
    #[error("document refresh failed: {source}")]
    RefreshFailed {
        /// The store failure.
        #[source]
        source: StoreError,
    },

    /// A phase move was refused by the gate.
    #[error(transparent)]
    Gate(#[from] GateError),

    /// A store call outside the batch pathway failed (opening a
    /// document, a direct reorder).
    #[error(transparent)]
    Store(#[from] StoreError),
}
