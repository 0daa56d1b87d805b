//! `slipway generate` command

use anyhow::{anyhow, Result};

use slipway::ops::{self, GenerateOptions};
use slipway::resolver::LinkageError;
use slipway::util::{diagnostic, LoadedProject};

use crate::cli::{GenerateArgs, GlobalArgs};

pub fn execute(global: &GlobalArgs, args: GenerateArgs) -> Result<()> {
    let mut loaded = super::load(global)?;
    let options = GenerateOptions {
        verbose: args.verbose_make,
    };

    if args.plan {
        let plan = ops::plan(&mut loaded.project, &loaded.libraries, &options)
            .map_err(|e| report(&loaded, global, &e))?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let summary = match ops::generate(&mut loaded.project, &loaded.libraries, &options) {
        Ok(summary) => summary,
        Err(e) => {
            return Err(match e.downcast_ref::<LinkageError>() {
                Some(linkage) => report(&loaded, global, linkage),
                None => e,
            })
        }
    };

    for path in &summary.written {
        eprintln!("   Generated {}", path.display());
    }
    eprintln!(
        "    Finished {} written, {} unchanged ({} on {})",
        summary.written.len(),
        summary.unchanged.len(),
        loaded.project.toolchain,
        loaded.project.platform,
    );

    Ok(())
}

/// Print the diagnostic for a linkage failure; returns the final error.
fn report(loaded: &LoadedProject, global: &GlobalArgs, e: &LinkageError) -> anyhow::Error {
    diagnostic::emit(&e.to_diagnostic().with_location(&loaded.path), global.color);
    anyhow!("could not generate build scripts for `{}`", loaded.project.name)
}
