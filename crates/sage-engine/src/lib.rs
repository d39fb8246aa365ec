//! SAGE Engine - the command-driven mutation engine
//!
//! The only crate that turns commands into store writes. One
//! [`EditorSession`] per open document drives the whole flow:
//! - Resolve each command's location against the cached document
//! - Apply commands strictly one after another, best effort
//! - Snapshot the document before a batch, restore it wholesale on undo
//! - Refetch after every batch so the cache never drifts from the store
//!
//! # Example
//!
//! ```rust,ignore
//! use sage_engine::EditorSession;
//!
//! let mut session = EditorSession::open(store, document_id).await?;
//! let report = session.apply_parser_output(output).await?;
//! println!("{} of {} commands applied", report.applied, report.attempted);
//! session.undo_last_batch().await?;
//! ```

pub mod apply;
pub mod config;
pub mod error;
pub mod report;
pub mod resolve;
pub mod session;
pub mod undo;

pub use apply::ApplyError;
pub use config::{EngineConfig, StepDeletePolicy};
pub use error::EngineError;
pub use report::{BatchOutcome, BatchReport, CommandFailure};
pub use resolve::ResolveError;
pub use session::{EditorSession, PhaseChange, ReorderScope};
pub use undo::Snapshot;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
