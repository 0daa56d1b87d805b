//! Core data structures for Slipway.
//!
//! The project model the generator reads: platform and toolchain
//! identifiers, packages, their files and their configuration matrix.

pub mod configuration;
pub mod package;
pub mod platform;
pub mod project;

pub use configuration::{BuildFlag, BuildVariant, Configuration, Optimization};
pub use package::{HarnessSettings, Language, Package, PackageKind};
pub use platform::{Platform, Toolchain};
pub use project::Project;
