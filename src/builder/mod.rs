//! GNU make script generation.
//!
//! Turns a resolved project model into one makefile per package plus a
//! workspace makefile that builds them in dependency order.

pub mod classify;
pub mod emitter;
pub mod makefile;
pub mod siblings;
pub mod workspace;

pub use classify::{classify, FileRole, SourceKind};
pub use emitter::{emit_package, MakefileEmitter};
pub use makefile::Makefile;
pub use siblings::{LinkArg, SiblingResolver};
pub use workspace::{build_order, emit_workspace};
