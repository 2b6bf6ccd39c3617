//! Target platforms
//!
//! A platform is described by data, not by a builder type per platform:
//! its project → outputs mappings, whether post-build steps apply, and the
//! steps themselves. `descriptor()` turns one `[[platform]]` section into a
//! `PlatformDescriptor` the shared lifecycle can drive.
//!
//! Desktop ("standalone") platforms are Windows, macOS and Linux; console
//! platforms are identified by name only.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};

use super::compiler::ToolCompiler;
use super::lifecycle::{CommandPostStep, PlatformDescriptor, PostStep};
use super::orchestrator::NativeBuildOrchestrator;
use super::BuildContext;
use crate::error::NativeBuildError;

/// Build target platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Macos,
    Linux,
    Android,
    Ios,
    /// Console or other named platform
    Console(String),
}

impl Platform {
    /// Desktop platforms, where the standalone post-steps apply
    pub fn is_standalone(&self) -> bool {
        matches!(self, Platform::Windows | Platform::Macos | Platform::Linux)
    }
}

/// Capability predicate for standalone post-steps
pub fn is_standalone(platform: &Platform) -> bool {
    platform.is_standalone()
}

impl FromStr for Platform {
    type Err = NativeBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(NativeBuildError::config_error("Platform name cannot be empty"));
        }

        Ok(match name.to_lowercase().as_str() {
            "windows" | "win" | "win64" => Platform::Windows,
            "macos" | "mac" | "osx" => Platform::Macos,
            "linux" => Platform::Linux,
            "android" => Platform::Android,
            "ios" => Platform::Ios,
            _ => Platform::Console(name.to_string()),
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "windows"),
            Platform::Macos => write!(f, "macos"),
            Platform::Linux => write!(f, "linux"),
            Platform::Android => write!(f, "android"),
            Platform::Ios => write!(f, "ios"),
            Platform::Console(name) => write!(f, "{}", name),
        }
    }
}

/// Orchestrator holding every project of the platform section
pub fn orchestrator(ctx: &BuildContext) -> Result<NativeBuildOrchestrator> {
    let mut orchestrator = NativeBuildOrchestrator::new(
        ctx.platform.to_string(),
        ctx.native_code_dir.clone(),
        ctx.output_dir.clone(),
    )
    .verbose(ctx.verbose);

    for project in &ctx.config.projects {
        orchestrator
            .register(&project.file, project.outputs.as_slice())
            .with_context(|| format!("Invalid project entry '{}' for {}", project.file, ctx.platform))?;
    }

    Ok(orchestrator)
}

/// Lifecycle descriptor for the platform in `ctx`
pub fn descriptor(ctx: &BuildContext) -> Result<PlatformDescriptor> {
    let orchestrator = orchestrator(ctx)?;

    let capability: Box<dyn Fn(&Platform) -> bool> = match ctx.config.standalone {
        Some(standalone) => Box::new(move |_: &Platform| standalone),
        None => Box::new(is_standalone),
    };

    let post_steps = ctx
        .config
        .post_build
        .iter()
        .map(|step| Box::new(CommandPostStep::from(step)) as Box<dyn PostStep>)
        .collect();

    Ok(PlatformDescriptor {
        platform: ctx.platform.clone(),
        orchestrator,
        capability,
        post_steps,
    })
}

/// Compiler configured from the platform section
pub fn compiler(ctx: &BuildContext) -> ToolCompiler {
    ToolCompiler::new()
        .platform_string(ctx.config.msbuild_platform.clone())
        .configuration(ctx.config.configuration.clone())
        .verbose(ctx.verbose)
}
