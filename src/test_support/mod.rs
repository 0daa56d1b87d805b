//! Test fixtures shared by Slipway unit tests.
//!
//! Only compiled for tests. Builders here produce small, fully resolved
//! project models so each test can state just what it cares about.

pub mod fixtures;

pub use fixtures::*;
