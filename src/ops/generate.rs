//! Implementation of `slipway generate`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::builder::{emit_package, emit_workspace, Makefile};
use crate::core::{Platform, Project, Toolchain};
use crate::resolver::{LibraryTable, LinkageError, LinkageResolver};
use crate::util::fs::write_if_changed;

/// Options for the generate command.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Keep recipe echo and drop the `@` prefixes
    pub verbose: bool,
}

/// One build script, before it is written.
#[derive(Debug, Serialize)]
pub struct ScriptDocument {
    /// Owning package; `None` for the workspace makefile
    pub package: Option<String>,
    pub path: PathBuf,
    pub makefile: Makefile,
}

/// Every script a generate run would write, in write order.
#[derive(Debug, Serialize)]
pub struct GenerationPlan {
    pub project: String,
    pub platform: Platform,
    pub toolchain: Toolchain,
    pub scripts: Vec<ScriptDocument>,
}

/// What a generate run did on disk.
#[derive(Debug, Default)]
pub struct GenerateSummary {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

/// Resolve every package's external libraries into its configurations.
///
/// Stops at the first package with an undefined library; packages before it
/// keep their resolved settings.
pub fn resolve_libraries(project: &mut Project, libraries: &LibraryTable) -> Result<(), LinkageError> {
    for i in 0..project.packages.len() {
        let package = &project.packages[i];
        if package.libraries.is_empty() {
            continue;
        }
        let ids = package.libraries.clone();
        let root = project.rebase(package, &project.libraries_root);
        tracing::debug!("resolving libraries of `{}`: {}", package.name, ids.join(", "));

        let resolver = LinkageResolver::new(libraries, project.platform, &root);
        resolver.resolve(&mut project.packages[i], &ids)?;
    }
    Ok(())
}

/// Resolve libraries and build every script document without writing.
pub fn plan(
    project: &mut Project,
    libraries: &LibraryTable,
    options: &GenerateOptions,
) -> Result<GenerationPlan, LinkageError> {
    resolve_libraries(project, libraries)?;

    let mut scripts: Vec<ScriptDocument> = project
        .packages
        .iter()
        .map(|package| ScriptDocument {
            package: Some(package.name.clone()),
            path: project.script_path(package),
            makefile: emit_package(project, package, options.verbose),
        })
        .collect();

    scripts.push(ScriptDocument {
        package: None,
        path: project.workspace_script_path(),
        makefile: emit_workspace(project, options.verbose),
    });

    Ok(GenerationPlan {
        project: project.name.clone(),
        platform: project.platform,
        toolchain: project.toolchain,
        scripts,
    })
}

/// Generate and write every build script of `project`.
///
/// Nothing is written unless every package's libraries resolve.
pub fn generate(
    project: &mut Project,
    libraries: &LibraryTable,
    options: &GenerateOptions,
) -> Result<GenerateSummary> {
    let plan = plan(project, libraries, options)?;

    let mut summary = GenerateSummary::default();
    for script in &plan.scripts {
        let contents = script.makefile.render();
        let changed = write_if_changed(&script.path, &contents).with_context(|| match &script.package {
            Some(name) => format!("failed to write the build script of `{}`", name),
            None => "failed to write the workspace makefile".to_string(),
        })?;

        if changed {
            tracing::info!("wrote {}", script.path.display());
            summary.written.push(script.path.clone());
        } else {
            tracing::debug!("{} is up to date", script.path.display());
            summary.unchanged.push(script.path.clone());
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sibling_project, vorbis_table};
    use tempfile::TempDir;

    #[test]
    fn test_generate_writes_every_script_then_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut project = sibling_project();
        project.root = tmp.path().to_path_buf();
        let table = LibraryTable::new();

        let summary = generate(&mut project, &table, &GenerateOptions::default()).unwrap();
        assert_eq!(summary.written.len(), 4);
        assert!(summary.unchanged.is_empty());

        let engine = std::fs::read_to_string(tmp.path().join("engine/Makefile")).unwrap();
        assert!(engine.starts_with("# C++ Static Library Makefile autogenerated by slipway\n"));
        assert!(tmp.path().join("tests/Makefile").exists());
        assert!(tmp.path().join("game/Makefile").exists());
        assert!(tmp.path().join("Makefile").exists());

        let again = generate(&mut project, &table, &GenerateOptions::default()).unwrap();
        assert!(again.written.is_empty());
        assert_eq!(again.unchanged.len(), 4);
    }

    #[test]
    fn test_undefined_library_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut project = sibling_project();
        project.root = tmp.path().to_path_buf();
        project.find_package_mut("game").unwrap().libraries = vec!["ogg".into()];

        let err = generate(&mut project, &vorbis_table(), &GenerateOptions::default()).unwrap_err();
        let linkage = err.downcast_ref::<LinkageError>().unwrap();
        assert!(matches!(
            linkage,
            LinkageError::UndefinedLibrary { library, package, .. }
                if library == "ogg" && package == "game"
        ));
        assert!(std::fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_plan_resolves_libraries_into_scripts() {
        let mut project = sibling_project();
        project.find_package_mut("engine").unwrap().libraries = vec!["vorbis".into()];

        let plan = plan(&mut project, &vorbis_table(), &GenerateOptions::default()).unwrap();
        assert_eq!(plan.scripts.len(), 4);
        assert_eq!(plan.scripts[3].package, None);

        let engine = plan.scripts[0].makefile.render();
        assert!(engine.contains("-I \"../libraries/vorbis/include\""));

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["platform"], "linux");
        assert_eq!(json["scripts"][0]["package"], "engine");
    }
}
