//! `slipway clean` command

use anyhow::Result;

use slipway::ops::clean;
use slipway::util::diagnostic::{self, suggestions, Diagnostic};

use crate::cli::{CleanArgs, GlobalArgs};

pub fn execute(global: &GlobalArgs, args: CleanArgs) -> Result<()> {
    let loaded = super::load(global)?;
    let project = &loaded.project;

    if args.dry_run {
        for package in &project.packages {
            let path = project.script_path(package);
            if path.is_file() {
                eprintln!("  Would remove {}", path.display());
            }
        }
        let workspace = project.workspace_script_path();
        if workspace.is_file() {
            eprintln!("  Would remove {}", workspace.display());
        }
        return Ok(());
    }

    let summary = clean(project)?;
    for path in &summary.removed {
        eprintln!("     Removed {}", path.display());
    }
    for path in &summary.skipped {
        let warning = Diagnostic::warning("build script was not generated by slipway; leaving it")
            .with_location(path)
            .with_suggestion(suggestions::HAND_WRITTEN_SCRIPT);
        diagnostic::emit(&warning, global.color);
    }
    if summary.removed.is_empty() && summary.skipped.is_empty() {
        eprintln!("     Nothing to clean");
    }

    Ok(())
}
