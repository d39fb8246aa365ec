//! SAGE Phase - the guided-session phase gate
//!
//! Sessions walk a fixed per-kind phase sequence. This crate decides
//! whether a move through that sequence is allowed:
//! - Completion predicates per phase, evaluated on the live document
//! - Advance: one step forward, guarded by the current predicate
//! - Jump: backward always free, forward guarded by everything skipped
//!
//! Edits themselves are never gated; a user in the actions phase can
//! still reword a step.

pub mod gate;
pub mod predicate;

pub use gate::{advance, jump, GateError};
pub use predicate::{phase_complete, unmet_requirements};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
