//! External library linkage resolution.
//!
//! Maps abstract library identifiers to include/library search paths, link
//! names with per-variant debug suffixes, and delay-load directives.

mod errors;
mod library;
mod linkage;

pub use errors::LinkageError;
pub use library::{
    CustomRecipe, DefaultLibrary, ExternalLibrary, LibraryTable, LinkageHook,
    DEFAULT_DEBUG_SUFFIX,
};
pub use linkage::{LinkageContext, LinkageResolver};
