//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;

pub use config::{LoadedProject, Overrides, PROJECT_FILE_NAME};
pub use diagnostic::Diagnostic;
