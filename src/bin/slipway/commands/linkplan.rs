//! `slipway linkplan` command

use anyhow::Result;

use slipway::ops::{format_linkplan, linkplan};

use crate::cli::{GlobalArgs, LinkplanArgs};

pub fn execute(global: &GlobalArgs, args: LinkplanArgs) -> Result<()> {
    let mut loaded = super::load(global)?;

    let plan = linkplan(&mut loaded.project, &loaded.libraries, &args.package)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", format_linkplan(&plan));
    }

    Ok(())
}
