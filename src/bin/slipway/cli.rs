//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use slipway::core::{Platform, Toolchain};

/// Slipway - generate GNU make build scripts for C and C++ projects
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to the project file (defaults to the nearest Slipway.toml)
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Target operating system (windows, macosx, linux, bsd)
    #[arg(long, global = true)]
    pub os: Option<Platform>,

    /// Compiler family (gcc, dmc)
    #[arg(long, global = true)]
    pub cc: Option<Toolchain>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every project command.
pub struct GlobalArgs {
    pub file: Option<PathBuf>,
    pub os: Option<Platform>,
    pub cc: Option<Toolchain>,
    pub color: bool,
}

impl Cli {
    pub fn global(&self) -> GlobalArgs {
        use std::io::IsTerminal;

        GlobalArgs {
            file: self.file.clone(),
            os: self.os,
            cc: self.cc,
            color: !self.no_color && std::io::stderr().is_terminal(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a makefile per package plus the workspace makefile
    Generate(GenerateArgs),

    /// Show the link inputs of a package after library resolution
    Linkplan(LinkplanArgs),

    /// Remove generated makefiles
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Keep compiler command lines visible in the generated scripts
    #[arg(long)]
    pub verbose_make: bool,

    /// Print the scripts as JSON instead of writing them
    #[arg(long)]
    pub plan: bool,
}

#[derive(Args)]
pub struct LinkplanArgs {
    /// Package to show the link plan for
    pub package: String,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Only report what would be removed
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
