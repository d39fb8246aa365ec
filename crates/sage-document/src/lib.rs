//! SAGE Document - the assessment document model
//!
//! The tree every other crate works against:
//! - Documents own ordered steps and ordered actions
//! - Steps own ordered hazards, hazards own ordered controls
//! - Hazards carry initial and residual risk ratings
//! - Every ordered scope stays contiguous from zero
//!
//! # Example
//!
//! ```rust,ignore
//! use sage_document::{Document, DocumentKind, Step, StepDraft};
//!
//! let mut doc = Document::new(DocumentKind::RiskAssessment, "pump change-out");
//! doc.steps.push(Step::from_draft(StepDraft {
//!     activity: "isolate power".into(),
//!     notes: None,
//! }));
//! assert!(doc.ordering_is_contiguous());
//! ```

pub mod document;
pub mod entity;
pub mod error;
pub mod ids;
pub mod order;
pub mod patch;
pub mod phase;
pub mod rating;

pub use document::Document;
pub use entity::{
    Action, ActionDraft, ActionPatch, Control, ControlDraft, ControlKind, ControlPatch, Hazard,
    HazardDraft, HazardPatch, Step, StepDraft, StepPatch,
};
pub use error::DocumentError;
pub use ids::{ActionId, ControlId, DocumentId, EntityId, HazardId, StepId};
pub use order::{
    apply_order, insert_renumbered, insertion_index, is_contiguous, remove_renumbered, renumber,
    Orderable,
};
pub use patch::Patch;
pub use phase::{DocumentKind, Phase};
pub use rating::{Likelihood, RatingPatch, RatingStage, RiskLevel, RiskRating, Severity};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
