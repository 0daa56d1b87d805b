//! High-level operations.
//!
//! This module contains the implementation of Slipway commands.

pub mod clean;
pub mod generate;
pub mod linkplan;

pub use clean::{clean, CleanSummary};
pub use generate::{
    generate, plan, resolve_libraries, GenerateOptions, GenerateSummary, GenerationPlan,
    ScriptDocument,
};
pub use linkplan::{format_linkplan, linkplan, ConfigLinkPlan, LinkPlan};
