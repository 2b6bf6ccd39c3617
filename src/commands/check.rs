//! Check command implementation
//!
//! Reports which native toolchains are installed, and for a configured
//! platform whether the tools its projects need can be found.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;

use super::{load_config, load_context};
use crate::build::compiler::ProjectKind;
use crate::build::platforms;
use crate::build::toolchains::msvc::find_vs_installations;
use crate::build::toolchains::{SystemToolDiscovery, ToolDiscovery};
use crate::utils::terminal::{print_success, print_warning};

/// Check native toolchains
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Platform to check; all configured platforms when omitted
    pub platform: Option<String>,

    /// Path to NativeBuild.toml (searched upward from the current directory by default)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl CheckCommand {
    /// Execute the check command
    pub fn execute(self, verbose: bool) -> Result<()> {
        println!("{}", style("Host toolchains").bold());
        report_kind(ProjectKind::Solution);
        report_kind(ProjectKind::Makefile);

        if verbose {
            let installations = find_vs_installations();
            if installations.is_empty() {
                println!("  Visual Studio: none found");
            }
            for path in installations {
                println!("  Visual Studio: {}", path.display());
            }
        }

        let platforms: Vec<String> = match &self.platform {
            Some(platform) => vec![platform.clone()],
            None => match load_config(self.config.as_deref()) {
                Ok((_, config)) => config.platform_names().into_iter().map(String::from).collect(),
                Err(_) => {
                    print_warning("No NativeBuild.toml found; only host toolchains were checked");
                    return Ok(());
                }
            },
        };

        let mut failed = Vec::new();
        for name in &platforms {
            let ctx = load_context(self.config.as_deref(), name, verbose)?;
            let orchestrator = platforms::orchestrator(&ctx)?;

            let mut kinds: Vec<ProjectKind> = orchestrator
                .mappings()
                .iter()
                .filter_map(|m| ProjectKind::detect(m.project()))
                .collect();
            kinds.sort();
            kinds.dedup();

            println!();
            println!("{} {}", style("Platform").bold(), ctx.platform);
            match SystemToolDiscovery.discover(&kinds) {
                Ok(tools) => {
                    for tool in tools {
                        println!(
                            "  {} {} {} ({})",
                            style("✓").green(),
                            tool.name,
                            tool.version,
                            tool.path.display()
                        );
                    }
                    let missing = orchestrator.missing_outputs().len();
                    if missing > 0 {
                        println!("  {} output(s) missing and will be built", missing);
                    }
                }
                Err(e) => {
                    println!("  {} {}", style("✗").red(), e);
                    failed.push(e);
                }
            }
        }

        match failed.into_iter().next() {
            Some(first) => Err(first.into()),
            None => {
                print_success("All required native toolchains are available");
                Ok(())
            }
        }
    }
}

fn report_kind(kind: ProjectKind) {
    match SystemToolDiscovery::detect(kind) {
        Ok(toolchain) => println!(
            "  {} {} {}",
            style("✓").green(),
            toolchain.name(),
            toolchain.version()
        ),
        Err(_) => println!("  {} {} not found", style("✗").red(), kind.tool()),
    }
}
