//! Implementation of `slipway clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::Project;
use crate::util::fs::{read_to_string, remove_file_if_exists};

/// Marker every generated script carries in its first comment line.
const GENERATED_MARKER: &str = "autogenerated by slipway";

/// Outcome of a clean run.
#[derive(Debug, Default)]
pub struct CleanSummary {
    pub removed: Vec<PathBuf>,
    /// Scripts left in place because slipway didn't write them
    pub skipped: Vec<PathBuf>,
}

/// Remove every build script a generate run would write.
///
/// Files that exist but weren't generated (no marker in the first line) are
/// left in place and reported in [`CleanSummary::skipped`].
pub fn clean(project: &Project) -> Result<CleanSummary> {
    let mut paths: Vec<PathBuf> = project
        .packages
        .iter()
        .map(|p| project.script_path(p))
        .collect();
    paths.push(project.workspace_script_path());

    let mut summary = CleanSummary::default();
    for path in paths {
        if !path.is_file() {
            continue;
        }
        let contents = read_to_string(&path)?;
        let generated = contents
            .lines()
            .next()
            .map_or(false, |line| line.contains(GENERATED_MARKER));
        if !generated {
            tracing::debug!("{} has no slipway banner", path.display());
            summary.skipped.push(path);
            continue;
        }
        if remove_file_if_exists(&path)? {
            tracing::info!("removed {}", path.display());
            summary.removed.push(path);
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::generate::{generate, GenerateOptions};
    use crate::resolver::LibraryTable;
    use crate::test_support::sibling_project;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_generated_scripts_only() {
        let tmp = TempDir::new().unwrap();
        let mut project = sibling_project();
        project.root = tmp.path().to_path_buf();

        generate(&mut project, &LibraryTable::new(), &GenerateOptions::default()).unwrap();
        std::fs::write(tmp.path().join("game/Makefile"), "all:\n\techo hand written\n").unwrap();

        let summary = clean(&project).unwrap();
        assert_eq!(summary.removed.len(), 3);
        assert_eq!(summary.skipped, [tmp.path().join("game/Makefile")]);
        assert!(!tmp.path().join("engine/Makefile").exists());
        assert!(!tmp.path().join("Makefile").exists());
        assert!(tmp.path().join("game/Makefile").exists());

        let again = clean(&project).unwrap();
        assert!(again.removed.is_empty());
        assert_eq!(again.skipped.len(), 1);
    }
}
