//! Status command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::load_context;
use crate::build::platforms;
use crate::error::NativeBuildError;
use crate::utils::terminal::print_success;

/// Report missing native outputs without building anything
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Platform name as configured in NativeBuild.toml
    pub platform: String,

    /// Path to NativeBuild.toml (searched upward from the current directory by default)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl StatusCommand {
    /// Execute the status command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let ctx = load_context(self.config.as_deref(), &self.platform, verbose)?;
        let orchestrator = platforms::orchestrator(&ctx)?;

        for mapping in orchestrator.mappings() {
            let state = if mapping.is_complete() { "ok" } else { "incomplete" };
            println!("{:<12} {}", state, mapping.project().display());
            if verbose {
                for output in mapping.outputs() {
                    let mark = if output.is_file() { "+" } else { "-" };
                    println!("    {} {}", mark, output.display());
                }
            }
        }

        let missing = orchestrator.missing_outputs();
        if missing.is_empty() {
            print_success(&format!(
                "All {} native output mapping(s) for {} are complete",
                orchestrator.mappings().len(),
                ctx.platform
            ));
            return Ok(());
        }

        Err(NativeBuildError::Validation {
            platform: ctx.platform.to_string(),
            missing,
        }
        .into())
    }
}
