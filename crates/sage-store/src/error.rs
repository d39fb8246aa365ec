//! Store-side failures.

use thiserror::Error;

use sage_document::{DocumentError, DocumentId, EntityId};

/// Why a store call failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document with that id.
    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),

    /// The document exists but the addressed entity does not.
    #[error("{kind} {id} not found in document {document}")]
    EntityNotFound {
        /// Entity kind, for log lines.
        kind: &'static str,
        /// The missing id.
        id: EntityId,
        /// The document that was searched.
        document: DocumentId,
    },

    /// The store refused the write on validity grounds.
    #[error(transparent)]
    Invalid(#[from] DocumentError),

    /// The transport failed before a response arrived.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a failure status.
    #[error("server returned {status} for {path}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Request path, for log lines.
        path: String,
        /// Response body, truncated by the caller.
        message: String,
    },
}

impl StoreError {
    /// Shorthand for a missing nested entity.
    #[must_use]
    pub fn missing(
        kind: &'static str,
        id: impl Into<EntityId>,
        document: DocumentId,
    ) -> Self {
        StoreError::EntityNotFound {
            kind,
            id: id.into(),
            document,
        }
    }

    /// True when the failure means the addressed thing is gone, as
    /// opposed to the write being bad or the transport flaking.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::DocumentNotFound(_)
                | StoreError::EntityNotFound { .. }
                | StoreError::Http { status: 404, .. }
        )
    }

    /// True when retrying the same call could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Transport(_) => true,
            StoreError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
