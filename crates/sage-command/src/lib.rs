//! SAGE Command - the edit-command model
//!
//! A facilitation turn arrives from the text-understanding collaborator
//! as loose JSON. This crate owns the journey from that wire shape to
//! something the applier can trust:
//! - Raw envelope and command parsing, one element at a time
//! - Intent/target/location/data validation (the drop-not-fail filter)
//! - The typed command model with per-target payloads
//!
//! # Example
//!
//! ```rust,ignore
//! use sage_command::{compile_batch, ParserOutput};
//!
//! let output = ParserOutput::from_json(r#"{"commands":[
//!     {"intent":"ADD","target":"STEP","data":{"activity":"isolate power"}}
//! ]}"#)?;
//! let batch = compile_batch(output);
//! assert_eq!(batch.commands.len(), 1);
//! ```

pub mod command;
pub mod compile;
pub mod error;
pub mod raw;

pub use command::{AssessmentData, Command, CommandData, Intent, Location, ReorderData, Target};
pub use compile::{compile_batch, compile_command, CompiledBatch, DroppedCommand};
pub use error::CommandError;
pub use raw::{ParserOutput, RawCommand, RawLocation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
