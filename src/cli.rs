//! CLI argument parsing using clap derive macros

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    build::BuildCommand, check::CheckCommand, copy::CopyCommand, ensure::EnsureCommand,
    status::StatusCommand,
};

/// nativegate - native plugin binary gate
///
/// Makes sure every native binary a platform needs exists before the engine
/// build runs, compiling only the projects whose outputs are missing.
#[derive(Parser, Debug)]
#[command(name = "nativegate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build missing native binaries and validate every expected output
    Ensure(EnsureCommand),

    /// Report which expected outputs are missing without building anything
    Status(StatusCommand),

    /// Run the full platform lifecycle: ensure, host build, post-build steps
    Build(BuildCommand),

    /// Check that the native toolchains a platform needs are installed
    Check(CheckCommand),

    /// Apply a copy manifest of source/destination pairs
    Copy(CopyCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        match self.command {
            Commands::Ensure(cmd) => cmd.execute(self.verbose),
            Commands::Status(cmd) => cmd.execute(self.verbose),
            Commands::Build(cmd) => cmd.execute(self.verbose),
            Commands::Check(cmd) => cmd.execute(self.verbose),
            Commands::Copy(cmd) => cmd.execute(self.verbose),
        }
    }
}
