//! Implementation of `slipway linkplan`.
//!
//! Shows what each configuration of one package hands the linker once its
//! external libraries are resolved and sibling links are filtered.

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::builder::{LinkArg, SiblingResolver};
use crate::core::{BuildVariant, Project};
use crate::resolver::LibraryTable;
use crate::util::diagnostic::suggestions;

use super::generate::resolve_libraries;

/// Link inputs of one configuration.
#[derive(Debug, Serialize)]
pub struct ConfigLinkPlan {
    pub name: String,
    pub variant: BuildVariant,
    pub lib_paths: Vec<String>,
    /// Link line entries in order
    pub link_args: Vec<LinkArg>,
    /// Sibling artifacts that must exist before linking
    pub dependencies: Vec<String>,
    pub delay_loads: Vec<String>,
}

/// Link inputs of every configuration of one package.
#[derive(Debug, Serialize)]
pub struct LinkPlan {
    pub package: String,
    pub configurations: Vec<ConfigLinkPlan>,
}

/// Resolve `project` and compute the link plan of `package`.
pub fn linkplan(project: &mut Project, libraries: &LibraryTable, package: &str) -> Result<LinkPlan> {
    if project.find_package(package).is_none() {
        let names: Vec<&str> = project.packages.iter().map(|p| p.name.as_str()).collect();
        return Err(anyhow!(
            "package `{}` not found\navailable packages: {}\nhelp: {}",
            package,
            if names.is_empty() {
                "(none)".to_string()
            } else {
                names.join(", ")
            },
            suggestions::PACKAGE_NOT_FOUND
        ));
    }

    resolve_libraries(project, libraries)?;
    let project: &Project = project;

    let pkg = project
        .find_package(package)
        .ok_or_else(|| anyhow!("package `{}` not found", package))?;

    let configurations = pkg
        .configurations
        .iter()
        .map(|cfg| {
            let siblings = SiblingResolver::new(project, pkg, cfg);
            ConfigLinkPlan {
                name: cfg.name.clone(),
                variant: cfg.variant,
                lib_paths: cfg.lib_paths.clone(),
                link_args: siblings.link_args(),
                dependencies: siblings.linker_dependencies(),
                delay_loads: cfg.delay_loads.clone(),
            }
        })
        .collect();

    Ok(LinkPlan {
        package: pkg.name.clone(),
        configurations,
    })
}

/// Human-readable rendering of a link plan.
pub fn format_linkplan(plan: &LinkPlan) -> String {
    let mut out = format!("Link inputs for '{}':\n", plan.package);

    for cfg in &plan.configurations {
        out.push_str(&format!("\n  {} ({})\n", cfg.name, cfg.variant));

        if cfg.link_args.is_empty() && cfg.lib_paths.is_empty() {
            out.push_str("    (no link inputs)\n");
            continue;
        }
        for path in &cfg.lib_paths {
            out.push_str(&format!("    search  {}\n", path));
        }
        for (i, arg) in cfg.link_args.iter().enumerate() {
            let origin = match arg {
                LinkArg::Artifact(_) => "sibling",
                LinkArg::Library(_) => "library",
            };
            out.push_str(&format!("    {}. {} ({})\n", i + 1, arg, origin));
        }
        for dll in &cfg.delay_loads {
            out.push_str(&format!("    delay-load {}\n", dll));
        }
    }

    out
}
