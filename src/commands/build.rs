//! Build command implementation
//!
//! Drives one platform through the whole lifecycle:
//! 1. pre-build: discover tools, build missing native projects, validate
//! 2. the host build (the trailing command, if any)
//! 3. post-build steps, when the platform supports them

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Args;

use super::load_context;
use crate::build::lifecycle::PlatformBuildLifecycle;
use crate::build::platforms;
use crate::build::toolchains::SystemToolDiscovery;
use crate::exec::subprocess::run_command;
use crate::utils::terminal::{format_duration, print_info, print_success, print_verbose};

/// Run the full platform lifecycle around a host build command
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Platform name as configured in NativeBuild.toml
    pub platform: String,

    /// Path to NativeBuild.toml (searched upward from the current directory by default)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host build command, run after the native outputs validate
    #[arg(last = true)]
    pub host_command: Vec<String>,
}

impl BuildCommand {
    /// Execute the build command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let start = Instant::now();
        let ctx = load_context(self.config.as_deref(), &self.platform, verbose)?;

        let descriptor = platforms::descriptor(&ctx)?;
        let compiler = platforms::compiler(&ctx);
        let mut lifecycle =
            PlatformBuildLifecycle::new(descriptor, Box::new(SystemToolDiscovery)).verbose(verbose);

        lifecycle.pre_build(&compiler)?;

        if let Some((program, args)) = self.host_command.split_first() {
            print_info(&format!("Running host build: {}", self.host_command.join(" ")));
            let result = run_command(program, args, Some(&ctx.project_root), true)?;
            if !result.success {
                lifecycle.abort();
                bail!(
                    "Host build failed with exit code {}",
                    result
                        .exit_code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                );
            }
        }

        let steps = lifecycle.post_build()?;
        print_verbose(
            verbose,
            &format!("Lifecycle for {} is {}", ctx.platform, lifecycle.state()),
        );
        print_success(&format!(
            "Build for {} finished in {} ({} post-build step(s))",
            ctx.platform,
            format_duration(start.elapsed().as_secs_f64()),
            steps
        ));
        Ok(())
    }
}
