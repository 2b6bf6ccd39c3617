//! Ensure command implementation
//!
//! Runs the pre-build half of the lifecycle: tool discovery, building the
//! projects whose outputs are missing, and validating every output.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;

use super::load_context;
use crate::build::lifecycle::PlatformBuildLifecycle;
use crate::build::platforms;
use crate::build::toolchains::SystemToolDiscovery;
use crate::utils::terminal::{format_duration, print_success, print_verbose};

/// Build missing native binaries for a platform and validate all outputs
#[derive(Args, Debug)]
pub struct EnsureCommand {
    /// Platform name as configured in NativeBuild.toml
    pub platform: String,

    /// Path to NativeBuild.toml (searched upward from the current directory by default)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl EnsureCommand {
    /// Execute the ensure command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let start = Instant::now();
        let ctx = load_context(self.config.as_deref(), &self.platform, verbose)?;

        let descriptor = platforms::descriptor(&ctx)?;
        let compiler = platforms::compiler(&ctx);
        let mut lifecycle =
            PlatformBuildLifecycle::new(descriptor, Box::new(SystemToolDiscovery)).verbose(verbose);

        lifecycle.pre_build(&compiler)?;

        let tools: Vec<&str> = lifecycle.tools().iter().map(|t| t.name.as_str()).collect();
        if !tools.is_empty() {
            print_verbose(verbose, &format!("Toolchains used: {}", tools.join(", ")));
        }

        let built = lifecycle
            .result()
            .map(|r| r.built_projects.len())
            .unwrap_or_default();
        print_success(&format!(
            "All native outputs for {} are present ({} project(s) built in {})",
            ctx.platform,
            built,
            format_duration(start.elapsed().as_secs_f64())
        ));
        Ok(())
    }
}
