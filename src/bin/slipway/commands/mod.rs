//! Command implementations

pub mod clean;
pub mod completions;
pub mod generate;
pub mod linkplan;

use anyhow::Result;

use slipway::util::config::{find_project_file, load_project};
use slipway::util::{LoadedProject, Overrides};

use crate::cli::GlobalArgs;

/// Locate and load the project file named by the global options.
pub fn load(global: &GlobalArgs) -> Result<LoadedProject> {
    let path = match &global.file {
        Some(path) => path.clone(),
        None => find_project_file(&std::env::current_dir()?)?,
    };

    let overrides = Overrides {
        platform: global.os,
        toolchain: global.cc,
    };
    load_project(&path, &overrides)
}
