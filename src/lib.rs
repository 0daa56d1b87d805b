//! Slipway - GNU make build scripts from a C/C++ project description
//!
//! This crate turns a resolved project model (packages, their source files
//! and configuration matrices) into one makefile per package plus a
//! workspace makefile, after resolving the external libraries each package
//! links against.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Shared fixtures for unit tests.
#[cfg(test)]
pub mod test_support;

pub use builder::Makefile;
pub use core::{Configuration, Package, Project};
pub use resolver::{LibraryTable, LinkageError};
